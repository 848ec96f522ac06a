//! Application configuration.
//!
//! Defaults cover local development; an optional `sophie.toml` next to
//! the working directory and `SOPHIE_*` environment variables override
//! them (`SOPHIE_ACQUISITION__SOURCE_TIMEOUT_SECS=60` style).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL. The parent directory is created on connect.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite:data/sophie.db".to_string(), max_connections: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Worker-pool width for the source fan-out.
    pub max_concurrent_sources: usize,
    /// Coordinator-enforced deadline per source, independent of any
    /// timeout inside the extractor itself.
    pub source_timeout_secs: u64,
    /// Advisory soft cap handed to each extractor.
    pub per_source_limit: usize,
    /// Route persistence through the background single-writer queue.
    /// When false, batches are written synchronously on the caller.
    pub use_background_writer: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 4,
            source_timeout_secs: 45,
            per_source_limit: 5,
            use_background_writer: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 7,
            follow_redirects: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, overridable via RUST_LOG.
    pub level: String,
    pub file_logging: bool,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file_logging: false, directory: "logs".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write each consolidation report to a timestamped JSON file.
    pub save_json: bool,
    pub directory: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { save_json: false, directory: "reports".to_string() }
    }
}

impl AppConfig {
    /// Load configuration from the optional file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from("sophie")
    }

    fn load_from(file_stem: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix("SOPHIE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize::<Self>()
            .context("Failed to deserialize configuration")
    }
}
