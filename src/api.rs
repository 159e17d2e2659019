use axum::Router;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::handler::{feed::feed_router, AppState};

pub(crate) fn app_router(state: AppState) -> Router {
    feed_router(state)
}

/// Serves the feed on `listener` until `cancel` fires. A server error cancels the token too.
pub(crate) fn start_api_server(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let app = app_router(state);

        match listener.local_addr() {
            Ok(addr) => log::info!("API server started on {}", addr),
            Err(e) => log::warn!("API server started on unknown address: {}", e),
        }
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(cancel.clone()))
            .await
        {
            log::error!("Error running API server: {}", e);
            cancel.cancel();
        }
    })
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {
            log::info!("Shutting down API server...");
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
