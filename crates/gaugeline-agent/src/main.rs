//! gaugeline agent
//!
//! - Ops server: /metrics, /healthz, /readyz
//! - Background push to a remote-write endpoint when configured
//! - Graceful shutdown on ctrl-c / SIGTERM: readiness flips, push loop stops

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gaugeline_agent::{app_state::AppState, config, obs::MetricsRegistry, push, router};
use gaugeline_core::error::{GaugelineError, Result};

const ENV_CONFIG: &str = "GAUGELINE_CONFIG";
const DEFAULT_CONFIG: &str = "gaugeline.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "gaugeline-agent exited");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .listen
        .parse()
        .map_err(|e| GaugelineError::Config(format!("listen: {e}")))?;

    let registry = Arc::new(MetricsRegistry::new(&cfg));
    let shutdown = CancellationToken::new();
    let push = push::start(&cfg.push, Arc::clone(&registry), shutdown.clone())?;

    let state = AppState::new(cfg, registry, push.as_ref().map(|h| h.status()));
    let app = router::build_router(state.clone())?;

    tracing::info!(%listen, config = %path, "gaugeline-agent starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| GaugelineError::Internal(format!("bind {listen}: {e}")))?;

    let drain = state.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            drain.begin_draining();
        })
        .await
        .map_err(|e| GaugelineError::Internal(format!("server failed: {e}")));

    shutdown.cancel();
    if let Some(handle) = push {
        handle.join().await;
    }
    if let Some(status) = state.push_status() {
        tracing::info!(
            attempts = status.attempts(),
            successes = status.successes(),
            failures = status.failures(),
            "push totals"
        );
    }
    tracing::info!("gaugeline-agent stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
