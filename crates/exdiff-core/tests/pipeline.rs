use std::path::{Path, PathBuf};

#[cfg(unix)]
use exdiff_core::DiffAccumulator;
use exdiff_core::{
    run_pipeline, ChannelBackend, PipelineError, PipelineSpec, StageError, StageRole,
};

fn create_temp_dir(prefix: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let base = std::env::temp_dir();
    let pid = std::process::id();
    for _ in 0..10_000 {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = base.join(format!("{prefix}_{pid}_{n}"));
        if std::fs::create_dir(&path).is_ok() {
            return path;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

fn rm_rf(path: &Path) {
    let _ = std::fs::remove_dir_all(path);
}

fn pipe_spec(dir: &Path, input_a: &[u8], input_b: &[u8]) -> PipelineSpec {
    std::fs::write(dir.join("in_a"), input_a).unwrap();
    std::fs::write(dir.join("in_b"), input_b).unwrap();
    PipelineSpec {
        input_a: dir.join("in_a"),
        input_b: dir.join("in_b"),
        output_a: dir.join("out_a"),
        output_b: dir.join("out_b"),
        backend: ChannelBackend::Pipe,
    }
}

fn read_outputs(spec: &PipelineSpec) -> (Vec<u8>, Vec<u8>) {
    (
        std::fs::read(&spec.output_a).unwrap(),
        std::fs::read(&spec.output_b).unwrap(),
    )
}

#[test]
fn pipe_backend_end_to_end() {
    let dir = create_temp_dir("exdiff_pipe_e2e");
    let spec = pipe_spec(&dir, b"abc", b"bcd");

    let report = run_pipeline(&spec).unwrap();
    assert_eq!((report.reader.bytes_a, report.reader.bytes_b), (3, 3));
    assert_eq!((report.handler.bytes_a, report.handler.bytes_b), (3, 3));
    assert_eq!((report.writer.bytes_a, report.writer.bytes_b), (1, 1));

    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"a");
    assert_eq!(out_b, b"d");
    rm_rf(&dir);
}

#[test]
fn input_spanning_chunk_boundaries_reports_once() {
    let dir = create_temp_dir("exdiff_pipe_chunks");
    let spec = pipe_spec(&dir, &vec![b'x'; 9000], b"");

    let report = run_pipeline(&spec).unwrap();
    assert_eq!(report.reader.bytes_a, 9000);
    assert_eq!(report.reader.bytes_b, 0);

    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"x");
    assert_eq!(out_b, b"");
    rm_rf(&dir);
}

#[test]
fn empty_inputs_produce_empty_outputs() {
    let dir = create_temp_dir("exdiff_pipe_empty");
    let spec = pipe_spec(&dir, b"", b"");

    let report = run_pipeline(&spec).unwrap();
    assert_eq!(report.reader.bytes_a, 0);
    assert_eq!(report.reader.bytes_b, 0);

    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"");
    assert_eq!(out_b, b"");
    rm_rf(&dir);
}

#[test]
fn swapping_inputs_swaps_outputs() {
    let dir = create_temp_dir("exdiff_pipe_swap");
    let spec = pipe_spec(&dir, b"hello pipeline", b"goodbye pipeline");
    run_pipeline(&spec).unwrap();
    let (out_a, out_b) = read_outputs(&spec);

    let dir_swapped = create_temp_dir("exdiff_pipe_swap_rev");
    let spec_swapped = pipe_spec(&dir_swapped, b"goodbye pipeline", b"hello pipeline");
    run_pipeline(&spec_swapped).unwrap();
    let (swapped_a, swapped_b) = read_outputs(&spec_swapped);

    assert_eq!(out_a, swapped_b);
    assert_eq!(out_b, swapped_a);
    rm_rf(&dir);
    rm_rf(&dir_swapped);
}

#[test]
fn values_above_the_result_window_stay_out_of_outputs() {
    let dir = create_temp_dir("exdiff_pipe_window");
    let spec = pipe_spec(&dir, &[200u8], b"");

    let report = run_pipeline(&spec).unwrap();
    assert_eq!(report.reader.bytes_a, 1);
    assert_eq!(report.writer.bytes_a, 0);

    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"");
    assert_eq!(out_b, b"");
    rm_rf(&dir);
}

#[test]
fn missing_input_fails_the_run_and_creates_no_outputs() {
    let dir = create_temp_dir("exdiff_pipe_missing");
    std::fs::write(dir.join("in_b"), b"present").unwrap();
    let spec = PipelineSpec {
        input_a: dir.join("in_a_missing"),
        input_b: dir.join("in_b"),
        output_a: dir.join("out_a"),
        output_b: dir.join("out_b"),
        backend: ChannelBackend::Pipe,
    };

    match run_pipeline(&spec) {
        Err(PipelineError::Stage {
            role: StageRole::Reader,
            source: StageError::SourceOpen { path, .. },
        }) => assert_eq!(path, spec.input_a),
        other => panic!("expected a reader SourceOpen failure, got {other:?}"),
    }
    assert!(!spec.output_a.exists());
    assert!(!spec.output_b.exists());
    rm_rf(&dir);
}

#[test]
fn outputs_are_truncated_on_rerun() {
    let dir = create_temp_dir("exdiff_pipe_truncate");
    let spec = pipe_spec(&dir, b"abc", b"bcd");
    std::fs::write(&spec.output_a, b"stale content from last run").unwrap();
    std::fs::write(&spec.output_b, b"stale content from last run").unwrap();

    run_pipeline(&spec).unwrap();
    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"a");
    assert_eq!(out_b, b"d");
    rm_rf(&dir);
}

#[cfg(unix)]
#[test]
fn fifo_backend_matches_the_pipe_backend() {
    let dir = create_temp_dir("exdiff_fifo_e2e");
    let mut spec = pipe_spec(&dir, b"abcd", b"cdef");
    spec.backend = ChannelBackend::Fifo { dir: dir.clone() };

    run_pipeline(&spec).unwrap();
    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"ab");
    assert_eq!(out_b, b"ef");

    // The well-known entries appear next to the run and stay behind.
    for name in [
        "exdiff_raw_a.fifo",
        "exdiff_raw_b.fifo",
        "exdiff_result_a.fifo",
        "exdiff_result_b.fifo",
    ] {
        assert!(dir.join(name).exists(), "missing fifo entry {name}");
    }

    // A second run reuses the existing entries.
    run_pipeline(&spec).unwrap();
    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, b"ab");
    assert_eq!(out_b, b"ef");
    rm_rf(&dir);
}

#[cfg(unix)]
#[test]
fn fifo_backend_streams_inputs_larger_than_pipe_buffers() {
    let input_a: Vec<u8> = (0u8..=255).cycle().take(200_000).collect();
    let input_b = vec![b'#'; 150_000];

    let mut expected = DiffAccumulator::new();
    expected.observe_a(&input_a);
    expected.observe_b(&input_b);
    let (expected_a, expected_b) = expected.finish();

    let dir = create_temp_dir("exdiff_fifo_large");
    let mut spec = pipe_spec(&dir, &input_a, &input_b);
    spec.backend = ChannelBackend::Fifo { dir: dir.clone() };

    let report = run_pipeline(&spec).unwrap();
    assert_eq!(report.reader.bytes_a, 200_000);
    assert_eq!(report.reader.bytes_b, 150_000);

    let (out_a, out_b) = read_outputs(&spec);
    assert_eq!(out_a, expected_a);
    assert_eq!(out_b, expected_b);
    rm_rf(&dir);
}
