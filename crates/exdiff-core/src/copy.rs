use std::io::{Read, Write};

use thiserror::Error;

/// Block size for every chunked transfer in the pipeline. Stages never hold
/// more than one block of stream data in memory at a time.
pub const BUFFER_SIZE: usize = 8192;

/// A chunked transfer failure, keeping which half of the loop failed so the
/// caller can attribute it to the source or to the channel.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("read side")]
    Read(#[source] std::io::Error),
    #[error("write side")]
    Write(#[source] std::io::Error),
}

/// Moves the entire contents of `src` into `dst` in blocks of at most
/// `BUFFER_SIZE` bytes and returns the total byte count. The transfer ends
/// exactly when a read returns zero bytes; a short read means nothing.
pub fn copy_chunks(src: &mut impl Read, dst: &mut impl Write) -> Result<u64, CopyError> {
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = src.read(&mut buf).map_err(CopyError::Read)?;
        if n == 0 {
            return Ok(total);
        }
        dst.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// Feeds `src` chunk by chunk into `sink` until end-of-stream and returns the
/// total byte count. Same block size and end-of-stream rule as `copy_chunks`.
pub fn drain_chunks(
    src: &mut impl Read,
    mut sink: impl FnMut(&[u8]),
) -> std::io::Result<u64> {
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        sink(&buf[..n]);
        total += n as u64;
    }
}
