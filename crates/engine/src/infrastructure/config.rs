//! Environment-driven server configuration.

use std::path::PathBuf;

use chrono::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
const DEFAULT_EMAIL_FROM: &str = "Grupa <auth@localhost>";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
    /// Resend API key. Without one, sign-in codes are only logged.
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub cors_allow_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: DEFAULT_PORT,
            database_path: PathBuf::from("grupa.db"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            resend_api_key: None,
            email_from: DEFAULT_EMAIL_FROM.into(),
            cors_allow_origin: "*".into(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let server_port = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .map(|raw| parse_or("SERVER_PORT", &raw, defaults.server_port))
            .unwrap_or(defaults.server_port);
        let max_upload_bytes = get("MAX_UPLOAD_BYTES")
            .map(|raw| parse_or("MAX_UPLOAD_BYTES", &raw, defaults.max_upload_bytes))
            .unwrap_or(defaults.max_upload_bytes);
        let session_ttl = get("SESSION_TTL_HOURS")
            .map(|raw| parse_or("SESSION_TTL_HOURS", &raw, DEFAULT_SESSION_TTL_HOURS))
            .filter(|hours| *hours > 0)
            .map(Duration::hours)
            .unwrap_or(defaults.session_ttl);

        Self {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes,
            session_ttl,
            resend_api_key: get("AUTH_RESEND_KEY"),
            email_from: get("AUTH_EMAIL_FROM").unwrap_or(defaults.email_from),
            cors_allow_origin: get("CORS_ALLOW_ORIGIN").unwrap_or(defaults.cors_allow_origin),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = raw, default = %default, "Invalid numeric setting, using default");
            default
        }
    }
}
