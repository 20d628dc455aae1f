use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_SERVER_SECRET: &str = "change-this-secret-in-production";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    /// Mixed into client identifier hashes
    pub server_secret: String,
    pub store_connect_timeout: Duration,
    /// Set to "production" for JSON logging, anything else for human-readable.
    pub env: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let connect_timeout_secs = match lookup("STORE_CONNECT_TIMEOUT_SECS") {
            Some(raw) => raw.parse().with_context(|| {
                format!("STORE_CONNECT_TIMEOUT_SECS must be whole seconds, got {:?}", raw)
            })?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            server_secret: lookup("SERVER_SECRET")
                .unwrap_or_else(|| DEFAULT_SERVER_SECRET.to_string()),
            store_connect_timeout: Duration::from_secs(connect_timeout_secs),
            env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn uses_default_secret(&self) -> bool {
        self.server_secret == DEFAULT_SERVER_SECRET
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
