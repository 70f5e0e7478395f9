use anyhow::{Context, Result};
use dotenv::dotenv;
use std::env;
use tracing::debug;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Single origin allowed by CORS. `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origin: None,
        }
    }
}

impl Settings {
    /// Reads `APP_HOST`, `APP_PORT` and `APP_CORS_ORIGIN`, after loading `.env`
    /// if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("APP_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);

        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT must be a port number, got {raw:?}"))?,
            None => defaults.port,
        };

        let cors_allowed_origin = lookup("APP_CORS_ORIGIN").filter(|o| !o.trim().is_empty());

        Ok(Self {
            host,
            port,
            cors_allowed_origin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
