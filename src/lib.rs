pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod review;
pub mod submit;
pub mod store;
pub mod survey;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use error::AppError;

use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use auth::SessionKeys;
use db::Database;
use llm::Backend;

/// Opens the database, builds the generation backend and serves until Ctrl+C / SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let database = Database::new(&config.database_path)?;
    if let Some(password) = &config.admin_password {
        if database.seed_admin_password(password)? {
            info!("Seeded admin password from ADMIN_PASSWORD");
        }
    }

    let backend = Backend::new(&config.generation)?;
    info!(
        provider = ?config.generation.provider,
        model = %config.generation.model,
        "Generation backend ready"
    );

    let sessions = SessionKeys::from_secret(config.session_secret.as_deref(), config.session_ttl);
    let state = AppState::new(Arc::new(database), Arc::new(backend), sessions);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| AppError::Configuration(format!("cannot bind {}: {e}", config.bind_addr)))?;
    info!("Survey server listening on http://{}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::ExternalService(format!("server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
