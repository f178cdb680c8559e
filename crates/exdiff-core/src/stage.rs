use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::thread;

use serde::Serialize;

use crate::channel::{ChannelReader, ChannelWriter};
use crate::copy::{copy_chunks, drain_chunks, CopyError};
use crate::diff::DiffAccumulator;
use crate::error::StageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Reader,
    Handler,
    Writer,
}

impl StageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StageRole::Reader => "reader",
            StageRole::Handler => "handler",
            StageRole::Writer => "writer",
        }
    }
}

/// The two input sides. Kept apart end to end: a value arriving on one side
/// is never written to the other side's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

/// Per-stage byte accounting: what the stage moved for each side. For the
/// reader these are bytes copied in, for the handler bytes consumed, for the
/// writer bytes written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub bytes_a: u64,
    pub bytes_b: u64,
}

/// A started stage. Exactly one outcome is produced, observed via `join`.
#[derive(Debug)]
pub struct StageHandle {
    role: StageRole,
    thread: thread::JoinHandle<Result<StageReport, StageError>>,
}

/// Starts a stage on its own named thread. The body owns its channel ends;
/// nothing is shared with other stages.
pub fn spawn_stage<F>(role: StageRole, body: F) -> std::io::Result<StageHandle>
where
    F: FnOnce() -> Result<StageReport, StageError> + Send + 'static,
{
    let thread = thread::Builder::new()
        .name(format!("exdiff-{}", role.as_str()))
        .spawn(body)?;
    Ok(StageHandle { role, thread })
}

impl StageHandle {
    pub fn role(&self) -> StageRole {
        self.role
    }

    /// Blocks until the stage finishes. A panicked stage thread is an
    /// abnormal termination and reports as a failure, not a success.
    pub fn join(self) -> Result<StageReport, StageError> {
        match self.thread.join() {
            Ok(outcome) => outcome,
            Err(_) => Err(StageError::Crashed { role: self.role }),
        }
    }
}

/// Reader role: copy each named input into its side's raw channel, side A
/// first. Both producer ends are opened before any data moves; each end is
/// closed as soon as its copy is done so the handler sees end-of-stream.
/// A failure on side A skips side B entirely.
pub fn run_reader(
    input_a: &Path,
    input_b: &Path,
    mut raw_a: ChannelWriter,
    mut raw_b: ChannelWriter,
) -> Result<StageReport, StageError> {
    open_producer(&mut raw_a)?;
    open_producer(&mut raw_b)?;
    let bytes_a = copy_source(Side::A, input_a, &mut raw_a)?;
    raw_a.close();
    let bytes_b = copy_source(Side::B, input_b, &mut raw_b)?;
    raw_b.close();
    Ok(StageReport { bytes_a, bytes_b })
}

/// Handler role: drain both raw channels into the difference accumulator
/// (side A to exhaustion, then side B), then emit each result set with a
/// single write. All four ends are opened up front, raw before result, A
/// before B; the orchestrator's open order pairs with this one.
pub fn run_handler(
    mut raw_a: ChannelReader,
    mut raw_b: ChannelReader,
    mut result_a: ChannelWriter,
    mut result_b: ChannelWriter,
) -> Result<StageReport, StageError> {
    open_consumer(&mut raw_a)?;
    open_consumer(&mut raw_b)?;
    open_producer(&mut result_a)?;
    open_producer(&mut result_b)?;

    let mut diff = DiffAccumulator::new();
    let bytes_a = drain_raw(&mut raw_a, |chunk| diff.observe_a(chunk))?;
    raw_a.close();
    let bytes_b = drain_raw(&mut raw_b, |chunk| diff.observe_b(chunk))?;
    raw_b.close();

    let (set_a, set_b) = diff.finish();
    eprintln!(
        "[handler] consumed {bytes_a}+{bytes_b} bytes, result sizes {} and {}",
        set_a.len(),
        set_b.len()
    );

    emit_result(&mut result_a, &set_a)?;
    result_a.close();
    emit_result(&mut result_b, &set_b)?;
    result_b.close();
    Ok(StageReport { bytes_a, bytes_b })
}

/// Writer role: drain each result channel into its named output, truncating
/// the output on open. Side A first, like everywhere else.
pub fn run_writer(
    mut result_a: ChannelReader,
    mut result_b: ChannelReader,
    output_a: &Path,
    output_b: &Path,
) -> Result<StageReport, StageError> {
    open_consumer(&mut result_a)?;
    open_consumer(&mut result_b)?;
    let bytes_a = drain_to_destination(Side::A, &mut result_a, output_a)?;
    result_a.close();
    let bytes_b = drain_to_destination(Side::B, &mut result_b, output_b)?;
    result_b.close();
    Ok(StageReport { bytes_a, bytes_b })
}

fn open_producer(tx: &mut ChannelWriter) -> Result<(), StageError> {
    let channel = tx.label();
    tx.ensure_open()
        .map_err(|source| StageError::ChannelOpen { channel, source })
}

fn open_consumer(rx: &mut ChannelReader) -> Result<(), StageError> {
    let channel = rx.label();
    rx.ensure_open()
        .map_err(|source| StageError::ChannelOpen { channel, source })
}

fn copy_source(side: Side, path: &Path, tx: &mut ChannelWriter) -> Result<u64, StageError> {
    let channel = tx.label();
    let mut source = File::open(path).map_err(|source| StageError::SourceOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = copy_chunks(&mut source, tx).map_err(|err| match err {
        CopyError::Read(source) => StageError::SourceRead {
            path: path.to_path_buf(),
            source,
        },
        CopyError::Write(source) => StageError::ChannelWrite { channel, source },
    })?;
    eprintln!(
        "[reader] side {}: {bytes} bytes from {}",
        side.as_str(),
        path.display()
    );
    Ok(bytes)
}

fn drain_raw(rx: &mut ChannelReader, sink: impl FnMut(&[u8])) -> Result<u64, StageError> {
    let channel = rx.label();
    drain_chunks(rx, sink).map_err(|source| StageError::ChannelRead { channel, source })
}

fn emit_result(tx: &mut ChannelWriter, set: &[u8]) -> Result<(), StageError> {
    let channel = tx.label();
    tx.write_all(set)
        .map_err(|source| StageError::ChannelWrite { channel, source })
}

fn drain_to_destination(
    side: Side,
    rx: &mut ChannelReader,
    path: &Path,
) -> Result<u64, StageError> {
    let channel = rx.label();
    let mut destination = File::create(path).map_err(|source| StageError::DestinationOpen {
        path: path.to_path_buf(),
        source,
    })?;
    match copy_chunks(rx, &mut destination) {
        Ok(bytes) => {
            eprintln!(
                "[writer] side {}: {bytes} bytes to {}",
                side.as_str(),
                path.display()
            );
            Ok(bytes)
        }
        Err(err) => {
            // A half-written output must not be mistaken for a result.
            drop(destination);
            let _ = std::fs::remove_file(path);
            Err(match err {
                CopyError::Read(source) => StageError::ChannelRead { channel, source },
                CopyError::Write(source) => StageError::DestinationWrite {
                    path: path.to_path_buf(),
                    source,
                },
            })
        }
    }
}
