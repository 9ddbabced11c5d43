// TMbot Linux: UDP bridge and expiry ticker around the reassembly core.

mod bridge;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tmbot_core::{Session, TransferReassembler, RX_UUID, SERVICE_UUID, TX_UUID};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("tmbot-linux {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        device = %cfg.device_name,
        service = SERVICE_UUID,
        rx = RX_UUID,
        tx = TX_UUID,
        port = cfg.listen_port,
        "starting"
    );

    let mut reassembler = TransferReassembler::new();
    reassembler.set_transfer_timeout(cfg.transfer_timeout_ticks);
    let session: bridge::SharedSession =
        Arc::new(tokio::sync::Mutex::new(Session::new(reassembler)));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let socket = bridge::bind(cfg.listen_port)
            .await
            .with_context(|| format!("failed to bind 127.0.0.1:{}", cfg.listen_port))?;
        let session_rx = session.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge::run_bridge(socket, session_rx).await {
                tracing::error!(error = %e, "bridge stopped");
            }
        });
        let period = Duration::from_secs(cfg.tick_interval_secs.max(1));
        tokio::spawn(bridge::tick_loop(session.clone(), period));
        shutdown_signal().await?;
        tracing::info!("shutting down");
        Ok::<(), anyhow::Error>(())
    })
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
