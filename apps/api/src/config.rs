use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where resume records and their binaries live.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Records in Redis under `resume:<id>`, binaries in an S3 bucket (MinIO locally).
    RedisS3(RedisS3Config),
    /// In-process stores, optionally preloaded from a JSON seed file.
    Memory { seed_file: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct RedisS3Config {
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable required by the chosen backend is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub port: u16,
    pub rust_log: String,
    /// Entry point of the external sign-in flow.
    pub auth_path: String,
    pub session_cookie: String,
    /// Pages untouched for this long are torn down and their object URLs revoked.
    pub page_idle: Duration,
    /// Prefix for object URLs handed to the browser. Empty means host-relative.
    pub public_base_url: String,
    /// Stylesheet and icons served for any path no route claims.
    pub public_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageBackend::Memory { seed_file: None },
            port: 8080,
            rust_log: "info".to_string(),
            auth_path: "/auth".to_string(),
            session_cookie: "session".to_string(),
            page_idle: Duration::from_secs(900),
            public_base_url: String::new(),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND")
            .unwrap_or_else(|| "redis-s3".to_string())
            .as_str()
        {
            "redis-s3" => StorageBackend::RedisS3(RedisS3Config {
                redis_url: require_env("REDIS_URL")?,
                s3_bucket: require_env("S3_BUCKET")?,
                s3_endpoint: require_env("S3_ENDPOINT")?,
                s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            "memory" => StorageBackend::Memory {
                seed_file: optional_env("SEED_FILE").map(PathBuf::from),
            },
            other => bail!("STORAGE_BACKEND must be 'redis-s3' or 'memory', got '{other}'"),
        };

        let defaults = Config::default();
        Ok(Config {
            storage,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            auth_path: optional_env("AUTH_PATH").unwrap_or(defaults.auth_path),
            session_cookie: optional_env("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            page_idle: match optional_env("PAGE_IDLE_SECS") {
                Some(secs) => Duration::from_secs(
                    secs.parse::<u64>()
                        .context("PAGE_IDLE_SECS must be a whole number of seconds")?,
                ),
                None => defaults.page_idle,
            },
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            public_dir: optional_env("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
