//! mcmon — memcached metrics agent.
//!
//! One-shot collection cycle, meant to run from cron or a systemd
//! timer: discover local memcached instances, poll their stats, push
//! the derived metric points to the monitoring sink.
//!
//! # Usage
//!
//! ```text
//! mcmon --sendto http://127.0.0.1:1988/v1/push --timeout 2.0
//! ```
//!
//! Best-effort posture: every failure is logged, and the process always
//! exits 0 — a half-successful cycle beats no metrics at all.

use std::time::Duration;

use clap::Parser;
use tracing::debug;

#[derive(Parser)]
#[command(name = "mcmon", about = "Memcached metrics agent", version)]
struct Cli {
    /// Monitoring sink push HTTP API URL.
    #[arg(long, default_value = "http://127.0.0.1:1988/v1/push")]
    sendto: String,

    /// Per-instance connection timeout in seconds.
    #[arg(long, default_value_t = 2.0)]
    timeout: f64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,mcmon=debug,mcmon_proto=debug,mcmon_collect=debug,mcmon_push=debug"
                    .parse()
                    .unwrap()
            }),
        )
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs_f64(cli.timeout);

    let collector = mcmon_collect::Collector::new(timeout);
    match collector.collect().await {
        Some(points) if !points.is_empty() => {
            debug!(points = points.len(), "collection cycle complete");
            mcmon_push::push(&cli.sendto, &points, timeout).await;
        }
        Some(_) => debug!("collection cycle produced no points"),
        // No instances found; already logged by the collector.
        None => {}
    }
}
