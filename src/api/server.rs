//! Server lifecycle. Starts and stops an axum HTTP server for a router.
//!
//! Used for both the front-end and the image backend:
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;

use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

/// Session metadata for a running server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSession {
    pub session_id: String,
    pub name: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running server.
pub struct HttpServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Base URL for clients on this host, e.g. `http://127.0.0.1:8000`.
    pub fn url(&self) -> String {
        format!("http://{}", self.session.server_addr)
    }

    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!(server = %self.session.name, "Shutdown signal sent");
        }
    }

    /// Wait until the serving task has exited.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(server = %self.session.name, "Server task failed: {e}");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Bind `addr` (port 0 = ephemeral), spawn the axum server in a background
/// tokio task and return its handle.
pub async fn start_server_on(
    name: &str,
    app: Router,
    addr: SocketAddr,
) -> Result<HttpServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {name} server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_name = session.name.clone();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        tracing::info!(server = %server_name, %addr, "Server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!(server = %server_name, "Server error: {e}");
        }

        tracing::info!(server = %server_name, "Server stopped");
    });

    Ok(HttpServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use crate::api::{frontend_router, ApiContext};
    use crate::backend::{image_service_router, BackendContext, ImageBackendClient};
    use crate::config::ServiceConfig;
    use crate::test_support::png_bytes;

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    fn backend_ctx(dir: &std::path::Path) -> BackendContext {
        let config = ServiceConfig {
            marked_dir: dir.join("marked"),
            db_path: dir.join("db").join("images.sqlite3"),
            ..ServiceConfig::default()
        };
        BackendContext::from_config(&config).unwrap()
    }

    async fn start_pair(dir: &std::path::Path) -> (HttpServer, HttpServer) {
        let backend = start_server_on(
            "backend",
            image_service_router(backend_ctx(dir)),
            loopback(),
        )
        .await
        .expect("backend should start");

        let client = ImageBackendClient::new(&backend.url(), Duration::from_secs(5)).unwrap();
        let frontend = start_server_on(
            "frontend",
            frontend_router(ApiContext::new(client, 10 * 1024 * 1024)),
            loopback(),
        )
        .await
        .expect("frontend should start");

        (backend, frontend)
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server_on(
            "backend",
            image_service_router(backend_ctx(tmp.path())),
            loopback(),
        )
        .await
        .expect("server should start");

        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);
        assert!(server.session.server_addr.contains(':'));

        let resp = reqwest::get(format!("{}/health", server.url())).await.unwrap();
        assert!(resp.status().is_success());

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server_on(
            "backend",
            image_service_router(backend_ctx(tmp.path())),
            loopback(),
        )
        .await
        .expect("server should start");

        server.shutdown();
        server.shutdown(); // Second call should be safe
        server.stopped().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let mut first = start_server_on(
            "backend",
            image_service_router(backend_ctx(tmp.path())),
            loopback(),
        )
        .await
        .unwrap();

        let taken: SocketAddr = first.session.server_addr.parse().unwrap();
        let err = start_server_on(
            "backend",
            image_service_router(backend_ctx(tmp.path())),
            taken,
        )
        .await
        .err()
        .expect("second bind should fail");
        assert!(err.contains("Failed to bind"));

        first.shutdown();
    }

    #[tokio::test]
    async fn frontend_proxies_to_backend() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut backend, mut frontend) = start_pair(tmp.path()).await;
        let http = reqwest::Client::new();
        let png = png_bytes(50, 40, [200, 200, 200, 255]);

        // Image info through the proxy
        let form = reqwest::multipart::Form::new().part(
            "ImageInfo",
            reqwest::multipart::Part::bytes(png.clone()).file_name("pic.png"),
        );
        let info: serde_json::Value = http
            .post(format!("{}/api/imageinfo", frontend.url()))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["width"], 50);
        assert_eq!(info["height"], 40);

        // Mark with blank coordinates → defaults
        let form = reqwest::multipart::Form::new()
            .part(
                "image",
                reqwest::multipart::Part::bytes(png).file_name("pic.png"),
            )
            .text("x", "")
            .text("y", "10");
        let resp = http
            .post(format!("{}/api/markimage", frontend.url()))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let marked: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(marked["filename"], "pic_marked.png");

        // Listed, then deleted, then gone
        let list: serde_json::Value = http
            .get(format!("{}/api/marked_images", frontend.url()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(list["images"].as_array().unwrap().len(), 1);

        let resp = http
            .delete(format!("{}/api/marked_images/pic_marked.png", frontend.url()))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let resp = http
            .delete(format!("{}/api/marked_images/pic_marked.png", frontend.url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        frontend.shutdown();
        backend.shutdown();
    }
}
