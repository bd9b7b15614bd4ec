use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "ImgDiff";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "imgdiff_lib=info,imgdiff=info,tower_http=warn"
}

/// Get the application data directory (~/ImgDiff/).
///
/// Falls back to the working directory when no home directory is known
/// (containers, service accounts).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default directory for marked images written by the image backend.
pub fn marked_images_dir() -> PathBuf {
    app_data_dir().join("marked_images")
}

/// Default location of the image index database.
pub fn image_index_path() -> PathBuf {
    app_data_dir().join("database").join("images.sqlite3")
}

/// Runtime configuration for both servers and the backend client.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Where the front-end (pages + `/api/*`) listens.
    pub frontend_addr: SocketAddr,
    /// Where the image backend service listens.
    pub backend_addr: SocketAddr,
    /// Base URL the front-end uses to reach the image backend.
    pub backend_url: String,
    /// Base URL used when building links to marked images.
    pub public_base_url: String,
    pub marked_dir: PathBuf,
    /// SQLite file backing the image index.
    pub db_path: PathBuf,
    pub body_limit_bytes: usize,
    /// Timeout for outbound requests to the image backend.
    pub request_timeout: Duration,
    /// Origin allowed by the backend's CORS layer.
    pub allowed_origin: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            frontend_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            backend_url: "http://127.0.0.1:8000".into(),
            public_base_url: "http://127.0.0.1:8000".into(),
            marked_dir: marked_images_dir(),
            db_path: image_index_path(),
            body_limit_bytes: 50 * 1024 * 1024, // 50 MB
            request_timeout: Duration::from_secs(30),
            allowed_origin: "http://localhost:3000".into(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `IMGDIFF_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parsed(&lookup, "IMGDIFF_FRONTEND_ADDR") {
            config.frontend_addr = addr;
        }
        if let Some(addr) = parsed(&lookup, "IMGDIFF_BACKEND_ADDR") {
            config.backend_addr = addr;
        }

        let backend_url = lookup("IMGDIFF_BACKEND_URL").map(|url| trim_url(&url));
        let public_url = lookup("IMGDIFF_PUBLIC_BASE_URL").map(|url| trim_url(&url));
        if let Some(url) = &backend_url {
            config.backend_url = url.clone();
        }
        // Public links follow the backend URL unless set explicitly
        config.public_base_url = public_url
            .or(backend_url)
            .unwrap_or(config.public_base_url);

        if let Some(dir) = lookup("IMGDIFF_MARKED_DIR").filter(|d| !d.trim().is_empty()) {
            config.marked_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("IMGDIFF_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(mb) = parsed::<usize, _>(&lookup, "IMGDIFF_BODY_LIMIT_MB") {
            match mb.checked_mul(1024 * 1024) {
                Some(bytes) => config.body_limit_bytes = bytes,
                None => tracing::warn!(
                    key = "IMGDIFF_BODY_LIMIT_MB",
                    value = mb,
                    "Ignoring invalid config value: too large"
                ),
            }
        }
        if let Some(secs) = parsed::<u64, _>(&lookup, "IMGDIFF_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(origin) = lookup("IMGDIFF_ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }

        config
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid config value");
            None
        }
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
