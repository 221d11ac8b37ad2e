use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use tabula_core::exporter::DEFAULT_EXPORT_FILENAME;
use tabula_core::query::DEFAULT_PAGE_SIZE;

/// Default limit for CSV import bodies.
pub const DEFAULT_IMPORT_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory of the file-backed key-value store holding the column
    /// schema. `None` keeps the schema in memory only.
    pub state_dir: Option<PathBuf>,
    /// Rows per page on a fresh load (default: `10`).
    pub default_page_size: usize,
    /// Filename suggested with every CSV export.
    pub export_filename: String,
    /// Largest CSV body accepted by `POST /import`, in bytes.
    pub import_max_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `127.0.0.1`                |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `TABULA_STATE_DIR`     | `.tabula` (empty = memory) |
    /// | `DEFAULT_PAGE_SIZE`    | `10`                       |
    /// | `EXPORT_FILENAME`      | `table-data.csv`           |
    /// | `IMPORT_MAX_BYTES`     | `16777216` (16 MiB)        |
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = parse_var("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            origin
                .parse::<axum::http::HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))?;
        }

        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", 30)?;

        let state_dir = match std::env::var("TABULA_STATE_DIR") {
            Ok(dir) if dir.trim().is_empty() => None,
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => Some(PathBuf::from(".tabula")),
        };

        let default_page_size: usize = parse_var("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        anyhow::ensure!(default_page_size > 0, "DEFAULT_PAGE_SIZE must be greater than 0");

        let export_filename =
            std::env::var("EXPORT_FILENAME").unwrap_or_else(|_| DEFAULT_EXPORT_FILENAME.into());

        let import_max_bytes: usize = parse_var("IMPORT_MAX_BYTES", DEFAULT_IMPORT_MAX_BYTES)?;
        anyhow::ensure!(import_max_bytes > 0, "IMPORT_MAX_BYTES must be greater than 0");

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            state_dir,
            default_page_size,
            export_filename,
            import_max_bytes,
        })
    }
}

/// Read and parse an env var, falling back to `default` when unset.
fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
