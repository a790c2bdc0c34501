//! ofs-plugin - ObjectiveFS volume plugin daemon.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::UnixListener;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ofs_plugin::{Args, api};
use ofs_volume::VolumeDriver;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(args.log_directive()))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting ObjectiveFS volume driver"
    );

    let config = args.config();
    let socket = config.paths.socket();
    let driver = Arc::new(VolumeDriver::from_config(config));

    let listener = bind(&socket)?;
    tracing::info!(socket = %socket.display(), "Plugin listening");

    axum::serve(listener, api::app(driver))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("plugin server failed")?;

    if let Err(err) = std::fs::remove_file(&socket) {
        tracing::warn!(socket = %socket.display(), error = %err, "Failed to remove socket");
    }
    tracing::info!("ObjectiveFS volume driver stopped");
    Ok(())
}

fn bind(socket: &Path) -> Result<UnixListener> {
    if let Some(dir) = socket.parent() {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("creating plugin directory {}", dir.display()))?;
    }
    // A socket left behind by a previous run would make bind fail.
    match std::fs::remove_file(socket) {
        Ok(()) => tracing::debug!(socket = %socket.display(), "Removed stale socket"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .wrap_err_with(|| format!("removing stale socket {}", socket.display()));
        }
    }
    UnixListener::bind(socket).wrap_err_with(|| format!("binding {}", socket.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
