//! `sni-peek` binary: logs the SNI hostname of each incoming TLS connection
//! and optionally forwards it to an upstream.

mod cli;

use std::time::Duration;

use clap::Parser;
use log::warn;
use sni_peek::{
    InspectConfig,
    Inspector,
    server::{ServerConfig, serve},
};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();

    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.metrics_listen {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
    }
    #[cfg(not(feature = "metrics"))]
    if cli.metrics_listen.is_some() {
        warn!("metrics requested but the metrics feature is disabled");
    }

    let inspect = InspectConfig::default()
        .with_strict(cli.strict)
        .with_fast_path(!cli.no_fast_path);
    let config = ServerConfig {
        upstream: cli.upstream,
        read_timeout: (cli.read_timeout_ms > 0).then(|| Duration::from_millis(cli.read_timeout_ms)),
        inspector: Inspector::new(inspect),
        ..ServerConfig::default()
    };

    let listener = TcpListener::bind(cli.listen).await?;
    serve(listener, config, async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: error={e}");
        }
    })
    .await?;
    Ok(())
}
