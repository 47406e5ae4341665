//! Runtime settings from the environment.

use crate::error::ConfigError;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/atelier";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_TTL_MINS: i64 = 720;
const DEFAULT_PAGE_SIZE: u32 = 6;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_STORAGE_REGION: &str = "us-east-1";

/// Object storage settings (S3-compatible).
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    /// Prefix for public object URLs. When unset, URLs go through `/api/cloud/files/{key}`.
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub auth_secret: String,
    pub session_ttl_mins: i64,
    pub page_size: u32,
    pub max_upload_bytes: usize,
    pub storage: StorageSettings,
    /// Admin account to create or reset at startup (`ADMIN_EMAIL` + `ADMIN_PASSWORD`).
    pub admin: Option<(String, String)>,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// | Env Var                   | Required | Default                         |
    /// |---------------------------|----------|---------------------------------|
    /// | `DATABASE_URL`            | no       | `postgres://localhost/atelier`  |
    /// | `BIND_ADDR`               | no       | `127.0.0.1:3000`                |
    /// | `AUTH_SECRET`             | **yes**  | --                              |
    /// | `SESSION_TTL_MINS`        | no       | `720`                           |
    /// | `PAGE_SIZE`               | no       | `6`                             |
    /// | `MAX_UPLOAD_BYTES`        | no       | `52428800`                      |
    /// | `STORAGE_BUCKET`          | **yes**  | --                              |
    /// | `STORAGE_ENDPOINT`        | no       | --                              |
    /// | `STORAGE_REGION`          | no       | `us-east-1`                     |
    /// | `STORAGE_PUBLIC_BASE_URL` | no       | --                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| non_empty(k).ok_or_else(|| ConfigError::Load(format!("{} must be set", k)));

        let page_size: u32 = parse_or(non_empty("PAGE_SIZE"), "PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Load("PAGE_SIZE must be at least 1".into()));
        }

        let admin = match (non_empty("ADMIN_EMAIL"), non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Settings {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            auth_secret: required("AUTH_SECRET")?,
            session_ttl_mins: parse_or(non_empty("SESSION_TTL_MINS"), "SESSION_TTL_MINS", DEFAULT_SESSION_TTL_MINS)?,
            page_size,
            max_upload_bytes: parse_or(non_empty("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            storage: StorageSettings {
                bucket: required("STORAGE_BUCKET")?,
                endpoint: non_empty("STORAGE_ENDPOINT"),
                region: non_empty("STORAGE_REGION").unwrap_or_else(|| DEFAULT_STORAGE_REGION.into()),
                public_base_url: non_empty("STORAGE_PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            },
            admin,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| ConfigError::Load(format!("{} must be a valid number, got '{}'", name, s))),
    }
}
