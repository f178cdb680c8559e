use std::path::PathBuf;

use serde::Serialize;

use exdiff_contracts::{RAW_FIFO_A, RAW_FIFO_B, RESULT_FIFO_A, RESULT_FIFO_B};

use crate::channel::{create_channel, Channel, ChannelBackend, ChannelReader};
use crate::error::{PipelineError, StageError};
use crate::stage::{
    run_handler, run_reader, run_writer, spawn_stage, StageHandle, StageReport, StageRole,
};

/// Everything one run needs: the two named inputs, the two named outputs,
/// and the channel backend wiring the stages together.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub input_a: PathBuf,
    pub input_b: PathBuf,
    pub output_a: PathBuf,
    pub output_b: PathBuf,
    pub backend: ChannelBackend,
}

/// Byte accounting of a successful run, one entry per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub reader: StageReport,
    pub handler: StageReport,
    pub writer: StageReport,
}

/// Runs the whole pipeline to completion or to its first failure.
///
/// Order: create the four channels, start the handler, start the reader,
/// open the retained result consumer ends, join the reader, join the
/// handler, then start and join the writer. Failures abort at the join where
/// they surface; every channel end is owned by exactly one place and dropped
/// on every path, so each end closes exactly once.
pub fn run_pipeline(spec: &PipelineSpec) -> Result<RunReport, PipelineError> {
    let raw_a = create(&spec.backend, "raw-a", RAW_FIFO_A)?;
    let raw_b = create(&spec.backend, "raw-b", RAW_FIFO_B)?;
    let result_a = create(&spec.backend, "result-a", RESULT_FIFO_A)?;
    let result_b = create(&spec.backend, "result-b", RESULT_FIFO_B)?;

    let Channel {
        tx: raw_a_tx,
        rx: raw_a_rx,
    } = raw_a;
    let Channel {
        tx: raw_b_tx,
        rx: raw_b_rx,
    } = raw_b;
    let Channel {
        tx: result_a_tx,
        rx: mut result_a_rx,
    } = result_a;
    let Channel {
        tx: result_b_tx,
        rx: mut result_b_rx,
    } = result_b;

    let handler = spawn(StageRole::Handler, move || {
        run_handler(raw_a_rx, raw_b_rx, result_a_tx, result_b_tx)
    })?;

    let input_a = spec.input_a.clone();
    let input_b = spec.input_b.clone();
    let reader = match spawn(StageRole::Reader, move || {
        run_reader(&input_a, &input_b, raw_a_tx, raw_b_tx)
    }) {
        Ok(handle) => handle,
        Err(err) => {
            // The unstarted reader's producer ends are already dropped, so
            // the handler unwinds on end-of-stream by itself. Not joined: a
            // fifo handler may still sit in a blocking open, and it cannot
            // outlive the process anyway.
            drop(handler);
            return Err(err);
        }
    };

    // The handler's result producer opens block until these complete, so
    // they must happen before the reader join.
    open_retained(&mut result_a_rx)?;
    open_retained(&mut result_b_rx)?;

    let reader_report = match reader.join() {
        Ok(report) => {
            eprintln!("[pipeline] reader: ok");
            report
        }
        Err(err) => {
            // The dead reader's ends are closed, so the handler runs out its
            // streams and finishes; its outcome no longer matters. A reader
            // that died inside a fifo open leaves the handler blocked, the
            // hazard inherent to named entries.
            let _ = handler.join();
            return Err(PipelineError::Stage {
                role: StageRole::Reader,
                source: err,
            });
        }
    };

    let handler_report = match handler.join() {
        Ok(report) => {
            eprintln!("[pipeline] handler: ok");
            report
        }
        Err(err) => {
            return Err(PipelineError::Stage {
                role: StageRole::Handler,
                source: err,
            });
        }
    };

    let output_a = spec.output_a.clone();
    let output_b = spec.output_b.clone();
    let writer = spawn(StageRole::Writer, move || {
        run_writer(result_a_rx, result_b_rx, &output_a, &output_b)
    })?;
    let writer_report = writer.join().map_err(|source| PipelineError::Stage {
        role: StageRole::Writer,
        source,
    })?;
    eprintln!("[pipeline] writer: ok");

    Ok(RunReport {
        reader: reader_report,
        handler: handler_report,
        writer: writer_report,
    })
}

fn create(
    backend: &ChannelBackend,
    label: &'static str,
    fifo_name: &str,
) -> Result<Channel, PipelineError> {
    create_channel(backend, label, fifo_name).map_err(|source| PipelineError::ChannelCreate {
        channel: label,
        source,
    })
}

fn spawn<F>(role: StageRole, body: F) -> Result<StageHandle, PipelineError>
where
    F: FnOnce() -> Result<StageReport, StageError> + Send + 'static,
{
    let handle = spawn_stage(role, body).map_err(|source| PipelineError::Spawn { role, source })?;
    eprintln!("[pipeline] {}: started", role.as_str());
    Ok(handle)
}

fn open_retained(rx: &mut ChannelReader) -> Result<(), PipelineError> {
    let channel = rx.label();
    rx.ensure_open()
        .map_err(|source| PipelineError::ChannelOpen { channel, source })
}
