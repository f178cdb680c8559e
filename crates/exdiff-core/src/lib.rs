//! Streaming byte-set difference over a staged channel pipeline.
//!
//! Three stages connected by unidirectional byte channels: a reader copies
//! two named inputs into two raw channels, a handler folds both raw streams
//! into per-side tri-state tables and emits one small result set per side,
//! and a writer drains the result channels into two named outputs. The
//! orchestrator owns channel creation, stage startup and join order, and
//! propagates the first failure while every channel end closes exactly once.

mod channel;
mod copy;
mod diff;
mod error;
mod pipeline;
mod stage;

pub use channel::{create_channel, Channel, ChannelBackend, ChannelReader, ChannelWriter};
pub use copy::{copy_chunks, drain_chunks, CopyError, BUFFER_SIZE};
pub use diff::{DiffAccumulator, Inclusion, InclusionTable, RESULT_WINDOW};
pub use error::{PipelineError, StageError};
pub use pipeline::{run_pipeline, PipelineSpec, RunReport};
pub use stage::{
    run_handler, run_reader, run_writer, spawn_stage, Side, StageHandle, StageReport, StageRole,
};
