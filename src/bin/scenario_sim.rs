//! 通用场景运行器
//!
//! 读取 scenario.json，运行到指定仿真时间，打印汇总报告。

use clap::Parser;
use netexp_rs::exp::{summarize, ExperimentError, Scenario, ScenarioConfig, ThroughputUnit};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "scenario-sim", about = "Run a scenario.json and summarize its flows")]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// 仿真运行到多少秒
    #[arg(long, default_value_t = 10.0)]
    until_s: f64,

    /// Throughput unit in the report
    #[arg(long, value_enum, default_value_t = ThroughputUnit::Mbps)]
    unit: ThroughputUnit,

    /// Override the egress queue capacity, e.g. "20p" or "64000B"
    #[arg(long)]
    queue_size: Option<String>,

    /// Override the link error-model seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the aggregate report as JSON
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Write flow statistics in FlowMonitor XML layout
    #[arg(long)]
    flowmon_xml: Option<PathBuf>,

    /// Write an ASCII packet trace
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn write(path: &PathBuf, contents: &str) -> Result<(), ExperimentError> {
    fs::write(path, contents).map_err(|e| ExperimentError::io(path, e))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn run(args: Args) -> Result<(), ExperimentError> {
    let mut cfg = ScenarioConfig::from_json_file(&args.scenario)?;
    if let Some(q) = args.queue_size.as_deref() {
        cfg = cfg.with_queue_size(q)?;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    cfg.trace |= args.trace.is_some();

    let scenario = Scenario::configure(cfg)?;
    let result = scenario.run_secs(args.until_s)?;
    let report = summarize(&result, args.unit);
    println!("{report}");

    if let Some(path) = &args.json_report {
        write(path, &serde_json::to_string_pretty(&report)?)?;
    }
    if let Some(path) = &args.flowmon_xml {
        write(path, &result.flowmon_xml(true))?;
    }
    if let (Some(path), Some(text)) = (&args.trace, &result.trace) {
        write(path, text)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
