//! Application entry: server setup and graceful shutdown

use crate::config::Settings;
use crate::server::routes::create_router;
use crate::server::state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct App {
    state: AppState,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, anyhow::Error> {
        let state = AppState::new(settings)?;
        Ok(Self { state })
    }

    pub async fn run_with_graceful_shutdown(self) -> Result<(), anyhow::Error> {
        let addr = format!(
            "{}:{}",
            self.state.settings.host, self.state.settings.port
        );
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!(
            addr = %addr,
            environment = %self.state.settings.environment,
            keys = self.state.gemini.key_count(),
            "Server listening"
        );

        let router = create_router(self.state);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
