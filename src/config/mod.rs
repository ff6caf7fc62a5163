//! Configuration module for the storefront backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::AdminAllowList;
use crate::errors::AppError;

/// Default upper bound for a single product image (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory that backs the product image store
    pub upload_dir: PathBuf,
    /// Externally reachable base URL, used to build public image URLs
    pub public_base_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Email addresses granted admin access
    pub admin_emails: AdminAllowList,
    /// Lifetime of a sign-in session
    pub session_ttl_hours: i64,
    /// Largest accepted image upload in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("STORE_DB_PATH")
            .unwrap_or_else(|_| "./data/store.sqlite".to_string())
            .into();

        let upload_dir = env::var("STORE_UPLOAD_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let bind_addr_raw =
            env::var("STORE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr_raw.parse().map_err(|_| {
            AppError::Internal(format!("Invalid STORE_BIND_ADDR format: {}", bind_addr_raw))
        })?;

        let public_base_url = env::var("STORE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_addr_raw))
            .trim_end_matches('/')
            .to_string();

        let log_level = env::var("STORE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_emails = env::var("STORE_ADMIN_EMAILS")
            .map(|raw| AdminAllowList::parse(&raw))
            .unwrap_or_default();

        let session_ttl_hours = parse_var("STORE_SESSION_TTL_HOURS", 24)?;
        let max_upload_bytes = parse_var("STORE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            db_path,
            upload_dir,
            public_base_url,
            bind_addr,
            log_level,
            admin_emails,
            session_ttl_hours,
            max_upload_bytes,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Internal(format!("Invalid {} value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
