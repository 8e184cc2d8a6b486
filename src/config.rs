use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://relay.db?mode=rwc";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Capacity of each room's relay queue. Senders wait while it is full.
    pub relay_queue_capacity: usize,
    /// Capacity of each connection's outbox. Fan-out to a full outbox fails.
    pub outbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            database_max_connections: 16,
            relay_queue_capacity: 32,
            outbox_capacity: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            addr: var_or("RELAY_ADDR", defaults.addr)?,
            database_url: dotenv::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            relay_queue_capacity: nonzero(var_or("RELAY_QUEUE_CAPACITY", defaults.relay_queue_capacity)?, "RELAY_QUEUE_CAPACITY")?,
            outbox_capacity: nonzero(var_or("OUTBOX_CAPACITY", defaults.outbox_capacity)?, "OUTBOX_CAPACITY")?,
        })
    }
}

fn var_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

// tokio channels panic on a zero capacity
fn nonzero(value: usize, key: &str) -> anyhow::Result<usize> {
    anyhow::ensure!(value > 0, "{key} must be greater than zero");
    Ok(value)
}
