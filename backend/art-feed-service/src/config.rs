/// Configuration management for Art Feed Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which backend implementation to wire up
    pub backend: BackendMode,
    /// Document store configuration (managed mode only)
    pub database: Option<DatabaseConfig>,
    /// Blob storage configuration
    pub storage: StorageConfig,
    /// Credential rules
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Everything in process memory; nothing survives a restart.
    Memory,
    /// Postgres document store, S3 blob storage, Postgres-backed accounts.
    Managed,
}

impl std::str::FromStr for BackendMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(BackendMode::Memory),
            "managed" => Ok(BackendMode::Managed),
            other => bail!("unknown BACKEND_MODE '{}' (expected memory or managed)", other),
        }
    }
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection verification timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Pool acquisition timeout
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access
    pub base_url: String,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Key prefix for uploaded images
    pub image_prefix: String,
}

/// Credential rules enforced by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minimum accepted password length
    pub min_password_length: usize,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "art-feed-media".to_string(),
            region: "us-east-1".to_string(),
            base_url: "https://s3.amazonaws.com".to_string(),
            path_style: false,
            image_prefix: "images".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.bucket),
            region: std::env::var("AWS_REGION").unwrap_or(defaults.region),
            base_url: std::env::var("S3_BASE_URL").unwrap_or(defaults.base_url),
            path_style: env_or("S3_PATH_STYLE", defaults.path_style),
            image_prefix: std::env::var("STORAGE_IMAGE_PREFIX").unwrap_or(defaults.image_prefix),
        }
    }

    /// Public URL for an object key
    pub fn object_url(&self, key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path_style {
            format!("{}/{}/{}", base, self.bucket, key)
        } else {
            let scheme_end = base.find("://").map(|i| i + 3).unwrap_or(0);
            format!("{}{}.{}/{}", &base[..scheme_end], self.bucket, &base[scheme_end..], key)
        }
    }

    /// Recover the object key from a URL produced by [`object_url`](Self::object_url).
    ///
    /// Anything that does not look like one of our URLs is treated as a bare key.
    pub fn key_from_url(&self, url: &str) -> String {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        let prefix = self.object_url("");
        match url.strip_prefix(&prefix) {
            Some(key) => key.to_string(),
            None => url.trim_start_matches('/').to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        };

        let backend: BackendMode = std::env::var("BACKEND_MODE")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()
            .context("Invalid BACKEND_MODE")?;

        let database = match backend {
            BackendMode::Memory => None,
            BackendMode::Managed => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections()),
                min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections()),
                connect_timeout_secs: env_or(
                    "DB_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout_secs(),
                ),
                acquire_timeout_secs: env_or(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    default_acquire_timeout_secs(),
                ),
            }),
        };

        let auth = AuthConfig {
            min_password_length: env_or(
                "AUTH_MIN_PASSWORD_LENGTH",
                AuthConfig::default().min_password_length,
            ),
        };

        Ok(Config {
            app,
            backend,
            database,
            storage: StorageConfig::from_env(),
            auth,
        })
    }
}
