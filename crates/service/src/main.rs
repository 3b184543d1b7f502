//! Token aggregation service
//!
//! Main entry point: keeps the token snapshot fresh and publishes updates
//! until interrupted.

use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use token_service::{Settings, TokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting token service v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!(
        "Cache backend {:?}, refresh every {}s, updates every {}ms",
        settings.cache_backend, settings.cache_refresh_interval, settings.ws_update_interval
    );

    let mut service = TokenService::build(&settings).await?;

    let mut updates = service.subscribe();
    let update_logger = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(page) => debug!(
                    "Update published: {} of {} tokens, has_more={}",
                    page.data.len(),
                    page.total,
                    page.has_more
                ),
                Err(RecvError::Lagged(skipped)) => warn!("Update logger lagged, skipped {}", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    service.start().await;
    info!("Background services started");
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;

    service.shutdown().await;
    update_logger.abort();

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}
