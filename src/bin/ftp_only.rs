//! FTP-only 实验：两节点点对点链路，Westwood+ 大文件传输
//!
//! 8 Mbps / 10 ms 链路，20 包 drop-tail 队列，5 秒内发送 20 MiB。

use clap::Parser;
use netexp_rs::exp::presets::{self, FTP_ONLY_DURATION_S};
use netexp_rs::exp::{summarize, ExperimentError, Scenario, ThroughputUnit};
use netexp_rs::proto::CongestionControl;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "ftp-only", about = "FTP-only run over a point-to-point link")]
struct Args {
    /// Congestion control variant
    #[arg(long, value_enum, default_value_t = Cc::Westwood)]
    cc: Cc,

    /// Initial window and receive buffer (bytes)
    #[arg(long, default_value_t = 8_000)]
    window_bytes: u64,

    /// Link packet error rate
    #[arg(long, default_value_t = 0.0)]
    error_rate: f64,

    #[arg(long, value_enum, default_value_t = ThroughputUnit::Kbps)]
    unit: ThroughputUnit,

    /// Write flow statistics in FlowMonitor XML layout (e.g. data.flowmon)
    #[arg(long)]
    flowmon_xml: Option<PathBuf>,

    /// Write an ASCII packet trace (e.g. tcp-comparison.tr)
    #[arg(long)]
    trace: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Cc {
    NewReno,
    Westwood,
}

fn run(args: Args) -> Result<(), ExperimentError> {
    let mut cfg = presets::ftp_only();
    cfg.transport.congestion_control = match args.cc {
        Cc::NewReno => CongestionControl::NewReno,
        Cc::Westwood => CongestionControl::Westwood,
    };
    cfg.transport.rcv_buf_bytes = args.window_bytes;
    cfg.transport.initial_cwnd_segments = u32::try_from(args.window_bytes).unwrap_or(u32::MAX);
    if let netexp_rs::exp::TopologyConfig::PointToPoint { error_rate, .. } = &mut cfg.topology {
        *error_rate = Some(args.error_rate);
    }
    cfg.trace = args.trace.is_some();

    let scenario = Scenario::configure(cfg)?;
    let result = scenario.run_secs(FTP_ONLY_DURATION_S)?;
    println!("\n====================== Flow monitor statistics ======================\n");
    println!("{}", summarize(&result, args.unit));

    if let Some(path) = &args.flowmon_xml {
        fs::write(path, result.flowmon_xml(true)).map_err(|e| ExperimentError::io(path, e))?;
    }
    if let (Some(path), Some(text)) = (&args.trace, &result.trace) {
        fs::write(path, text).map_err(|e| ExperimentError::io(path, e))?;
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
