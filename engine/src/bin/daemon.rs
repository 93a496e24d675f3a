//! http-checkd - daemon performing HTTP checks on behalf of CLI callers

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hc_engine::adapters::grpc::{serve_on_unix_socket, HttpCheckService};
use hc_engine::DispatchServer;

#[derive(Parser)]
#[command(name = "http-checkd", version, about = "Server component for http-check")]
struct Args {
    /// Number of workers processing http checks in parallel
    #[arg(long, default_value_t = 25)]
    worker_count: u32,

    /// Timeout in seconds after which a connection attempt is cancelled
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Timeout in seconds for the TLS handshake
    #[arg(long, default_value_t = 10)]
    tls_timeout: u64,

    /// Socket to create to listen for check requests
    #[arg(long, default_value = "/tmp/http-check.sock")]
    socket_path: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Starting {} workers", args.worker_count);
    let dispatch = DispatchServer::start(
        args.worker_count,
        Duration::from_secs(args.timeout),
        Duration::from_secs(args.tls_timeout),
    )
    .context("could not start worker pool")?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    };

    info!("Listen for connections on socket {}", args.socket_path);
    serve_on_unix_socket(&args.socket_path, HttpCheckService::new(dispatch), shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("serving on {}: {}", args.socket_path, e))?;

    info!("Shutting down server");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_flag_defaults_to_info() {
        let args = Args::parse_from(["http-checkd"]);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn log_level_flag_is_accepted() {
        let args = Args::parse_from(["http-checkd", "--log-level", "debug"]);
        assert_eq!(args.log_level, "debug");
    }
}
