use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use exdiff_contracts::EXDIFF_RUN_REPORT_SCHEMA_VERSION;
use exdiff_core::{run_pipeline, ChannelBackend, PipelineSpec, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
enum ChannelArg {
    Pipe,
    Fifo,
}

#[derive(Parser)]
#[command(name = "exdiff")]
#[command(
    about = "Writes, for two input files, the byte values exclusive to each.",
    long_about = None
)]
struct Cli {
    #[arg(value_name = "INPUT_A")]
    input_a: PathBuf,

    #[arg(value_name = "INPUT_B")]
    input_b: PathBuf,

    #[arg(value_name = "OUTPUT_A")]
    output_a: PathBuf,

    #[arg(value_name = "OUTPUT_B")]
    output_b: PathBuf,

    #[arg(long, value_enum, default_value_t = ChannelArg::Pipe)]
    channel: ChannelArg,

    #[arg(long, value_name = "DIR", default_value = ".")]
    fifo_dir: PathBuf,

    #[arg(long)]
    report_json: bool,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    let backend = match cli.channel {
        ChannelArg::Pipe => ChannelBackend::Pipe,
        ChannelArg::Fifo => ChannelBackend::Fifo {
            dir: cli.fifo_dir.clone(),
        },
    };
    let spec = PipelineSpec {
        input_a: cli.input_a.clone(),
        input_b: cli.input_b.clone(),
        output_a: cli.output_a.clone(),
        output_b: cli.output_b.clone(),
        backend,
    };

    match run_pipeline(&spec) {
        Ok(report) => {
            if cli.report_json {
                print_success_report(&report)?;
            }
            Ok(std::process::ExitCode::SUCCESS)
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            eprintln!("exdiff: {err:#}");
            if cli.report_json {
                let json = serde_json::json!({
                    "schema_version": EXDIFF_RUN_REPORT_SCHEMA_VERSION,
                    "ok": false,
                    "exit_code": 1,
                    "error": format!("{err:#}"),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            Ok(std::process::ExitCode::from(1))
        }
    }
}

fn print_success_report(report: &RunReport) -> Result<()> {
    let json = serde_json::json!({
        "schema_version": EXDIFF_RUN_REPORT_SCHEMA_VERSION,
        "ok": true,
        "exit_code": 0,
        "stages": report,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
