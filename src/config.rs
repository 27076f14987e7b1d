//! Environment-driven configuration.
//!
//! Everything is read once at startup from the process environment
//! (after `main` has loaded `.env`, when one exists):
//!
//! * `GEMINI_API_KEY` - required, the only setting without a default
//! * `GEMINI_MODEL` - model name, default `gemini-2.0-flash`
//! * `GEMINI_BASE_URL` - API root, default the public endpoint
//! * `GEMINI_TIMEOUT_SECS` - per-request timeout, default 300
//! * `VOXCHART_HOST` / `VOXCHART_PORT` - bind address, default `127.0.0.1:5000`
//! * `VOXCHART_DB_PATH` - records database, default under the local data dir

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub gemini: GeminiSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Err(ConfigError::MissingApiKey),
        };

        let database_path = match std::env::var("VOXCHART_DB_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path(),
        };

        Ok(Self {
            server: ServerSettings {
                host: parse_env("VOXCHART_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
                port: parse_env("VOXCHART_PORT", 5000)?,
            },
            gemini: GeminiSettings {
                api_key,
                model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
                base_url: env_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", 300)?,
            },
            database: DatabaseSettings {
                path: database_path,
            },
        })
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxchart")
        .join("records.db")
}

fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let trimmed = value.trim();
            trimmed.parse().map_err(|_| ConfigError::Invalid {
                name,
                value: trimmed.to_string(),
            })
        }
        _ => Ok(default),
    }
}
