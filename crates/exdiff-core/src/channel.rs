use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// How the pipeline's channels are realized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelBackend {
    /// Anonymous in-process pipes. Both ends exist open from creation, so
    /// `ensure_open` is a no-op.
    Pipe,
    /// Named FIFO entries under `dir`, created idempotently and never
    /// unlinked. Ends are opened by the owning stage via `ensure_open`,
    /// which blocks until the peer direction is opened. Unix only.
    Fifo { dir: PathBuf },
}

/// A unidirectional byte channel: one producer end, one consumer end. Each
/// end is moved into exactly one owner; dropping an end closes it.
#[derive(Debug)]
pub struct Channel {
    pub tx: ChannelWriter,
    pub rx: ChannelReader,
}

/// Creates one channel on the given backend. `fifo_name` is the well-known
/// filesystem entry used by the fifo backend and ignored by the pipe backend.
pub fn create_channel(
    backend: &ChannelBackend,
    label: &'static str,
    fifo_name: &str,
) -> io::Result<Channel> {
    match backend {
        ChannelBackend::Pipe => {
            let (rx, tx) = io::pipe()?;
            Ok(Channel {
                tx: ChannelWriter {
                    label,
                    inner: WriterInner::Pipe(Some(tx)),
                },
                rx: ChannelReader {
                    label,
                    inner: ReaderInner::Pipe(Some(rx)),
                },
            })
        }
        ChannelBackend::Fifo { dir } => {
            let path = dir.join(fifo_name);
            create_fifo(&path)?;
            Ok(Channel {
                tx: ChannelWriter {
                    label,
                    inner: WriterInner::Fifo {
                        path: path.clone(),
                        file: None,
                    },
                },
                rx: ChannelReader {
                    label,
                    inner: ReaderInner::Fifo { path, file: None },
                },
            })
        }
    }
}

/// The producer end of a channel.
#[derive(Debug)]
pub struct ChannelWriter {
    label: &'static str,
    inner: WriterInner,
}

#[derive(Debug)]
enum WriterInner {
    Pipe(Option<io::PipeWriter>),
    Fifo {
        path: PathBuf,
        file: Option<File>,
    },
}

impl ChannelWriter {
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Makes the end usable. For a fifo end this is the blocking open that
    /// waits for the consumer side; it must happen at the point the stage
    /// open-order discipline assigns to this end.
    pub fn ensure_open(&mut self) -> io::Result<()> {
        match &mut self.inner {
            WriterInner::Pipe(Some(_)) => Ok(()),
            WriterInner::Pipe(None) => Err(closed_end_error()),
            WriterInner::Fifo { file: Some(_), .. } => Ok(()),
            WriterInner::Fifo { path, file } => {
                *file = Some(OpenOptions::new().write(true).open(path)?);
                Ok(())
            }
        }
    }

    /// Releases the end so the consumer observes end-of-stream. Idempotent.
    pub fn close(&mut self) {
        match &mut self.inner {
            WriterInner::Pipe(end) => {
                end.take();
            }
            WriterInner::Fifo { file, .. } => {
                file.take();
            }
        }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            WriterInner::Pipe(Some(end)) => end.write(buf),
            WriterInner::Fifo { file: Some(end), .. } => end.write(buf),
            _ => Err(closed_end_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            WriterInner::Pipe(Some(end)) => end.flush(),
            WriterInner::Fifo { file: Some(end), .. } => end.flush(),
            _ => Ok(()),
        }
    }
}

/// The consumer end of a channel. Reads return zero bytes only once the
/// producer end is closed and the transport is drained.
#[derive(Debug)]
pub struct ChannelReader {
    label: &'static str,
    inner: ReaderInner,
}

#[derive(Debug)]
enum ReaderInner {
    Pipe(Option<io::PipeReader>),
    Fifo {
        path: PathBuf,
        file: Option<File>,
    },
}

impl ChannelReader {
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Counterpart of `ChannelWriter::ensure_open` for the consumer side.
    pub fn ensure_open(&mut self) -> io::Result<()> {
        match &mut self.inner {
            ReaderInner::Pipe(Some(_)) => Ok(()),
            ReaderInner::Pipe(None) => Err(closed_end_error()),
            ReaderInner::Fifo { file: Some(_), .. } => Ok(()),
            ReaderInner::Fifo { path, file } => {
                *file = Some(File::open(path)?);
                Ok(())
            }
        }
    }

    /// Releases the end. Idempotent.
    pub fn close(&mut self) {
        match &mut self.inner {
            ReaderInner::Pipe(end) => {
                end.take();
            }
            ReaderInner::Fifo { file, .. } => {
                file.take();
            }
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            ReaderInner::Pipe(Some(end)) => end.read(buf),
            ReaderInner::Fifo { file: Some(end), .. } => end.read(buf),
            _ => Err(closed_end_error()),
        }
    }
}

fn closed_end_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "channel end is closed")
}

#[cfg(unix)]
fn create_fifo(path: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "fifo path contains NUL"))?;
    // Entries may survive from an earlier run; already-exists is fine.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o666) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_fifo(_path: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "fifo channels require a unix target",
    ))
}
