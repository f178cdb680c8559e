//! Shared, version-pinned identifiers for the exdiff pipeline.
//!
//! These constants are the single source of truth for the names that appear
//! on disk or in machine-readable output: the well-known FIFO entries of the
//! named-channel backend and the schema string stamped into run reports.

pub const EXDIFF_RUN_REPORT_SCHEMA_VERSION: &str = "exdiff.run.report@0.1.0";

/// Well-known filesystem entries of the fifo channel backend, one raw
/// (Reader to Handler) and one result (Handler to Writer) entry per input
/// side. They are created idempotently before any stage opens them and are
/// never unlinked by the pipeline.
pub const RAW_FIFO_A: &str = "exdiff_raw_a.fifo";
pub const RAW_FIFO_B: &str = "exdiff_raw_b.fifo";
pub const RESULT_FIFO_A: &str = "exdiff_result_a.fifo";
pub const RESULT_FIFO_B: &str = "exdiff_result_b.fifo";
