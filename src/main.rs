use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hoptrace::cli::Args;
use hoptrace::export::{export_json, format_header, format_hop, generate_report};
use hoptrace::probe::check_permissions;
use hoptrace::{Config, TraceStatus, Tracer};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Check permissions early
    if let Err(e) = check_permissions() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let config = Config::from(&args);
    let tracer = Tracer::new(config.clone()).context("Invalid trace configuration")?;

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    let target = tracer
        .resolve(&args.target)
        .await
        .with_context(|| format!("Failed to resolve target: {}", args.target))?;

    let stream_hops = !args.json && !args.report;
    if stream_hops {
        println!("{}", format_header(&target, config.max_ttl, config.payload_size));
    }

    let result = tracer
        .run_resolved(target, cancel, |hop| {
            if stream_hops {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", format_hop(hop));
                let _ = stdout.flush();
            }
        })
        .await
        .with_context(|| format!("Trace to {} failed", args.target))?;

    if args.json {
        export_json(&result, std::io::stdout())?;
    } else if args.report {
        generate_report(&result, std::io::stdout())?;
    }

    match result.status {
        TraceStatus::Reached | TraceStatus::MaxTtlExceeded => Ok(()),
        TraceStatus::Cancelled => {
            eprintln!("Trace interrupted");
            std::process::exit(130);
        }
        TraceStatus::ReceiverStopped => {
            anyhow::bail!("Receiver stopped before the trace completed")
        }
    }
}
