use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::RetryPolicy;

pub mod access;
pub mod cors;
pub mod security;

pub use access::AccessConfig;
pub use cors::create_cors_layer;
pub use security::SecurityHeadersLayer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/doorcheck";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown ticket store '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub retry: RetryPolicy,
    pub access: AccessConfig,
    /// Production deployments sit behind TLS and get HSTS.
    pub production: bool,
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> Self {
        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_or("STORE_RETRY_ATTEMPTS", default_retry.max_attempts).max(1),
            base_delay: Duration::from_millis(env_or(
                "STORE_RETRY_BASE_MS",
                default_retry.base_delay.as_millis() as u64,
            )),
        };

        let access = AccessConfig::new(
            env::var("ADMIN_TOKEN").ok(),
            &env::var("CHECKIN_STATION_KEYS").unwrap_or_default(),
        );

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            bind_addr: env_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))),
            store_backend: env_or("TICKET_STORE", StoreBackend::Postgres),
            retry,
            access,
            production: env::var("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when it is
/// unset or unparsable.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: ignoring invalid {}='{}': {}", key, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}
