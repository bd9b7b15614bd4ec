pub mod api; // Front-end pages + /api
pub mod backend; // Image info / marking service
pub mod batch_job;
pub mod compare;
pub mod config;
pub mod db; // SQLite image index
pub mod marking;
pub mod uploads;

#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

use crate::api::{frontend_router, start_server_on, ApiContext};
use crate::backend::{image_service_router, BackendContext};
use crate::config::ServiceConfig;

/// Start the image backend and the front-end, then serve until ctrl-c.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env();
    tracing::info!(
        frontend = %config.frontend_addr,
        backend = %config.backend_addr,
        backend_url = %config.backend_url,
        marked_dir = %config.marked_dir.display(),
        db_path = %config.db_path.display(),
        "Configuration loaded"
    );

    let backend_ctx = BackendContext::from_config(&config)
        .map_err(|e| format!("Failed to open image index: {e}"))?;
    let mut backend = start_server_on(
        "image-backend",
        image_service_router(backend_ctx),
        config.backend_addr,
    )
    .await?;

    let ctx = match ApiContext::from_config(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            backend.shutdown();
            return Err(format!("Invalid backend client configuration: {e}"));
        }
    };

    let mut frontend = match start_server_on("frontend", frontend_router(ctx), config.frontend_addr)
        .await
    {
        Ok(server) => server,
        Err(e) => {
            backend.shutdown();
            return Err(e);
        }
    };

    tracing::info!(
        frontend = %frontend.url(),
        backend = %backend.url(),
        "Ready"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {e}");
    }
    tracing::info!("Shutting down");

    frontend.shutdown();
    backend.shutdown();
    frontend.stopped().await;
    backend.stopped().await;

    Ok(())
}
