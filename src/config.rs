//! Environment configuration.

use std::net::SocketAddr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// PayBazaar backend base URL, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every backend call.
    pub token: String,
    /// Admin whose master distributors populate the top selector.
    pub admin_id: String,
    pub http_timeout_secs: u64,
    /// Address the validation API binds to.
    pub bind_addr: SocketAddr,
}

impl ConsoleConfig {
    /// Reads configuration from the environment, after loading a `.env`
    /// file if one is present.
    pub fn from_env() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(%err, "failed to load .env file");
            }
        }

        Self {
            api_url: env_or("PAYBAZAAR_API_URL", "http://127.0.0.1:8080")
                .trim_end_matches('/')
                .to_string(),
            token: env_or("PAYBAZAAR_TOKEN", ""),
            admin_id: env_or("PAYBAZAAR_ADMIN_ID", ""),
            http_timeout_secs: env_parse("PAYBAZAAR_HTTP_TIMEOUT_SECS", 30),
            bind_addr: env_parse("COMMISSION_BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000))),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
