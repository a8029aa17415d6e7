//! # Supermarket checkout
//!
//! Runs the cashier/packer simulation and prints one line per handoff,
//! followed by a summary of the run.
//!
//! ## Running
//!
//! ```bash
//! # Default: 5 slots, 3 cashiers, 2 packers, 60 seconds
//! cargo run -p checkout-sim --bin checkout --release
//!
//! # 5 second run with faster workers
//! cargo run -p checkout-sim --bin checkout --release -- --quick
//!
//! # Reproducible run, JSON report only
//! cargo run -p checkout-sim --bin checkout -- --quick --seed 42 --quiet --json
//! ```
//!
//! Diagnostics go to stderr and follow `RUST_LOG` (default `warn`).
//! `--trace-events` routes the per-item events there too, as structured
//! records, instead of printing them to stdout.

use checkout_sim::{
    banner, init_tracing, CliArgs, ConsoleSink, EventSink, Simulation, TracingSink, USAGE,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }
    // Event records are emitted at info level
    init_tracing(if args.trace_events { "info" } else { "warn" });

    if let Err(e) = args.config.validate() {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.json {
        println!("{}", banner(&args.config));
    }

    let sink: Arc<dyn EventSink> = if args.trace_events {
        Arc::new(TracingSink::new())
    } else {
        Arc::new(ConsoleSink::new(args.quiet || args.json))
    };
    let report = Simulation::new(args.config.clone(), sink)?.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{report}");
    }

    if !report.is_consistent() {
        return Err(format!(
            "inconsistent totals: produced {} consumed {} resident {}",
            report.produced, report.consumed, report.resident
        )
        .into());
    }
    Ok(())
}
