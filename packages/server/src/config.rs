use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime. Default: 60 minutes.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    /// Refresh token lifetime. Default: 10 days.
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    /// Mark auth cookies `Secure`. Disable only for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_access_ttl_minutes() -> i64 {
    60
}
fn default_refresh_ttl_days() -> i64 {
    10
}
fn default_secure_cookies() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub root: PathBuf,
    /// Base URL prepended to blob keys in stored file URLs.
    pub public_base_url: String,
    /// Staging directory for multipart uploads before they reach the store.
    pub upload_tmp_dir: PathBuf,
    /// Maximum accepted upload size in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[cfg(feature = "object-storage")]
    pub s3: Option<common::storage::s3::S3Settings>,
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.root", "./data/blobs")?
            .set_default("storage.public_base_url", "http://127.0.0.1:8000/media")?
            .set_default("storage.upload_tmp_dir", "./data/tmp")?
            .set_default("log.level", "info")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., HUNARKART__AUTH__ACCESS_SECRET)
            .add_source(
                Environment::with_prefix("HUNARKART")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
