//! FTP + CBR 共享信道实验
//!
//! M 个 ad-hoc 节点：前一半两两组成 CBR 流，后一半两两组成 FTP 流。

use clap::Parser;
use netexp_rs::exp::presets::{self, ADHOC_DURATION_S, RTS_CTS_ON_THRESHOLD};
use netexp_rs::exp::{summarize, ExperimentError, Scenario, ThroughputUnit};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "ftp-cbr", about = "FTP and CBR flows sharing one ad-hoc channel")]
struct Args {
    /// Number of nodes (multiple of 4)
    #[arg(long, default_value_t = 4)]
    nodes: usize,

    /// TCP receive buffer, which bounds the sender window (bytes)
    #[arg(long, default_value_t = 1_100)]
    window_bytes: u64,

    /// Use RTS/CTS for data frames
    #[arg(long, default_value_t = false)]
    rts_cts: bool,

    #[arg(long, value_enum, default_value_t = ThroughputUnit::Mbps)]
    unit: ThroughputUnit,

    /// Print the report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn run(args: Args) -> Result<(), ExperimentError> {
    let mut cfg = presets::ftp_cbr(args.nodes, args.window_bytes);
    if args.rts_cts {
        cfg.transport.rts_cts_threshold = RTS_CTS_ON_THRESHOLD;
    }
    let scenario = Scenario::configure(cfg)?;
    let report = summarize(&scenario.run_secs(ADHOC_DURATION_S)?, args.unit);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let state = if args.rts_cts { "enabled" } else { "disabled" };
        println!("FTP-CBR Experiment with RTS/CTS {state}:");
        println!("{report}");
        println!("------------------------------------------------");
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
