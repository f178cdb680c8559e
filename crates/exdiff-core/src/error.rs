use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::stage::StageRole;

/// Failure of a single stage. Every I/O error is fatal to the stage that hit
/// it; there is no retry and no degraded mode.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("open input {}", .path.display())]
    SourceOpen { path: PathBuf, source: io::Error },

    #[error("read input {}", .path.display())]
    SourceRead { path: PathBuf, source: io::Error },

    #[error("create output {}", .path.display())]
    DestinationOpen { path: PathBuf, source: io::Error },

    #[error("write output {}", .path.display())]
    DestinationWrite { path: PathBuf, source: io::Error },

    #[error("open {channel} channel end")]
    ChannelOpen {
        channel: &'static str,
        source: io::Error,
    },

    #[error("read {channel} channel")]
    ChannelRead {
        channel: &'static str,
        source: io::Error,
    },

    #[error("write {channel} channel")]
    ChannelWrite {
        channel: &'static str,
        source: io::Error,
    },

    #[error("{} stage terminated abnormally", .role.as_str())]
    Crashed { role: StageRole },
}

/// Failure of a whole run. The first failing stage aborts the pipeline; its
/// error is carried here together with the role it came from.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("create {channel} channel")]
    ChannelCreate {
        channel: &'static str,
        source: io::Error,
    },

    #[error("open {channel} channel consumer end")]
    ChannelOpen {
        channel: &'static str,
        source: io::Error,
    },

    #[error("start {} stage", .role.as_str())]
    Spawn { role: StageRole, source: io::Error },

    #[error("{} stage failed", .role.as_str())]
    Stage { role: StageRole, source: StageError },
}

impl PipelineError {
    /// The role the failure is attributed to, if any. Channel creation
    /// happens before any stage exists.
    pub fn role(&self) -> Option<StageRole> {
        match self {
            PipelineError::ChannelCreate { .. } | PipelineError::ChannelOpen { .. } => None,
            PipelineError::Spawn { role, .. } | PipelineError::Stage { role, .. } => Some(*role),
        }
    }
}
