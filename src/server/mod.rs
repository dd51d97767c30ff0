//! HTTP server exposing the same-origin API
//!
//! Three read-only endpoints, all open to any origin:
//! - `GET /api/ff-calendar` economic calendar for one day
//! - `GET /api/quotes` quote JSON passthrough
//! - `GET /api/yahoo-rss` headline feed passthrough

mod error;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;

use tokio::net::TcpListener;
use tokio::signal;

use crate::cli::ServerConfig;
use crate::data::partition::today_eastern;

/// Binds the configured address and serves until Ctrl-C or SIGTERM
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    let addr = listener.local_addr()?;

    tracing::info!("Backend running at http://{}", addr);
    tracing::info!(
        "FF calendar:  http://{}/api/ff-calendar?date={}&countries=USD&imp=high,medium,low",
        addr,
        today_eastern()
    );
    tracing::info!("Quotes:       http://{}/api/quotes?symbols=SPY,QQQ,^VIX", addr);
    tracing::info!("Headlines:    http://{}/api/yahoo-rss", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-C received, initiating shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating shutdown."),
    }
}
