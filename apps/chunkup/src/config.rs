//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/chunkup/config.toml`
//! - Windows: `%APPDATA%/chunkup/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use chunkup_protocol::constants::{self, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};
use chunkup_upload::{HttpBackendConfig, UploadOptions};
use serde::{Deserialize, Serialize};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upload server, scheme and authority.
    pub server_url: String,

    pub check_path: String,
    pub chunk_path: String,
    pub merge_path: String,

    /// Bytes per chunk.
    pub chunk_size: u64,

    /// Maximum chunk uploads in flight; `0` means no limit.
    pub concurrency: usize,

    /// Extra attempts per chunk after a network failure.
    pub chunk_retries: u32,

    pub retry_backoff_ms: u64,

    pub request_timeout_secs: u64,

    /// Bearer token; empty disables the `Authorization` header.
    pub auth_token: String,
}

impl Default for Config {
    fn default() -> Self {
        let upload = UploadOptions::default();
        Self {
            server_url: "http://127.0.0.1:3000".into(),
            check_path: constants::CHECK_PATH.into(),
            chunk_path: constants::CHUNK_PATH.into(),
            merge_path: constants::MERGE_PATH.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            chunk_retries: upload.chunk_retries,
            retry_backoff_ms: upload.retry_backoff.as_millis() as u64,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            auth_token: String::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location, creating it if missing.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, or writes a default if not found.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (may contain a token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn backend_config(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: self.server_url.clone(),
            check_path: self.check_path.clone(),
            chunk_path: self.chunk_path.clone(),
            merge_path: self.merge_path.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            auth_token: Some(self.auth_token.clone()).filter(|t| !t.is_empty()),
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            chunk_size: self.chunk_size,
            concurrency: self.concurrency,
            chunk_retries: self.chunk_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("chunkup")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("chunkup").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/chunkup/config.toml"))
    }
}
