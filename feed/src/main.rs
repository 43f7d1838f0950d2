mod client;
mod config;
mod services;
mod state;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::state::FeedState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let state = match FeedState::from_env() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to configure price feed");
            return;
        }
    };
    tracing::info!(
        base_url = %state.client.base_url(),
        timeout_ms = state.client.timeout().as_millis() as u64,
        poll_interval_secs = state.poll_interval.as_secs(),
        underpriced_threshold = state.calculator.underpriced_threshold(),
        "clanboard feed starting"
    );

    if let Some(player) = config::startup_player() {
        services::player_summary::log_summary(&state.client, &player).await;
    }

    let watcher = tokio::spawn(services::market_watch::run(state.clone()));

    let received = wait_for_stop().await;
    tracing::info!(signal = received, "stopping market watch");
    stop_watcher(watcher).await;

    tracing::info!("clanboard feed stopped");
}

/// Abort the watcher and wait for it to unwind. `false` if it had panicked.
async fn stop_watcher(watcher: JoinHandle<()>) -> bool {
    watcher.abort();
    match watcher.await {
        Ok(()) => true,
        Err(e) if e.is_cancelled() => true,
        Err(e) => {
            tracing::error!(error = %e, "market watch ended abnormally");
            false
        }
    }
}

/// Resolves with the name of the first stop signal received.
async fn wait_for_stop() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for ctrl-c; relying on SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "sigterm"
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM; relying on ctrl-c");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
