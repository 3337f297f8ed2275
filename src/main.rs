// src/main.rs

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use fireside::config::Config;
use fireside::web::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let pretty = matches!(env::var("LOG_FORMAT").as_deref(), Ok("pretty"));
    fireside::setup_tracing(!pretty);

    let config = Config::from_env().context("loading configuration")?;
    if let Some(host) = &config.firebase.emulator_host {
        warn!(host = %host, "running with Firebase Auth emulator");
    }

    let state = Arc::new(AppState::new(&config));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
