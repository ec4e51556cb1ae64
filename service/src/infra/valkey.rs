//! Valkey implementation of the cache backend ports.
//!
//! Each [`ValkeySession`] owns one multiplexed connection; dropping the
//! session closes it.

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use ociaction_common::ServiceConfig;

use crate::application::ports::{CacheBackend, CacheSession};
use crate::domain::CacheError;

/// Keys examined per `SCAN` round trip.
const SCAN_COUNT: usize = 100;

/// Valkey connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValkeyConfig {
    /// Valkey host address
    pub host: String,
    /// Valkey port
    pub port: u16,
    /// Optional password for authentication
    pub password: Option<String>,
    /// Whether to use TLS (rediss://)
    pub tls: bool,
}

impl Default for ValkeyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            tls: false,
        }
    }
}

impl From<&ServiceConfig> for ValkeyConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            host: config.cache_host.clone(),
            port: config.cache_port,
            password: config.cache_password.clone().filter(|p| !p.is_empty()),
            tls: config.cache_tls,
        }
    }
}

impl ValkeyConfig {
    /// Build the connection URL for this config.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        match &self.password {
            Some(password) => format!(
                "{scheme}://:{}@{}:{}",
                utf8_percent_encode(password, NON_ALPHANUMERIC),
                self.host,
                self.port
            ),
            None => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }
}

pub struct ValkeyBackend {
    client: redis::Client,
}

impl ValkeyBackend {
    /// Create a new backend. No connection is made until a session is
    /// requested.
    ///
    /// # Errors
    /// Returns error if the connection URL is invalid.
    pub fn new(config: &ValkeyConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| CacheError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CacheBackend for ValkeyBackend {
    async fn connect(&self) -> Result<Box<dyn CacheSession>, CacheError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Connect(e.to_string()))?;
        Ok(Box::new(ValkeySession { conn }))
    }
}

pub struct ValkeySession {
    conn: MultiplexedConnection,
}

fn command(err: &redis::RedisError) -> CacheError {
    CacheError::Command(err.to_string())
}

#[async_trait]
impl CacheSession for ValkeySession {
    async fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.conn.get(key).await.map_err(|e| command(&e))?;
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        let _: () = self.conn.set(key, value).await.map_err(|e| command(&e))?;
        Ok(())
    }

    async fn set_if_exists(&mut self, key: &str, value: &str) -> Result<bool, CacheError> {
        // SET .. XX replies OK when written and nil when the key is absent.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("XX")
            .query_async(&mut self.conn)
            .await
            .map_err(|e| command(&e))?;
        Ok(reply.is_some())
    }

    async fn delete(&mut self, key: &str) -> Result<bool, CacheError> {
        let removed: usize = self.conn.del(key).await.map_err(|e| command(&e))?;
        Ok(removed > 0)
    }

    async fn delete_matching(&mut self, pattern: &str) -> Result<usize, CacheError> {
        let mut cursor: u64 = 0;
        let mut removed = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut self.conn)
                .await
                .map_err(|e| command(&e))?;
            if !keys.is_empty() {
                let n: usize = self.conn.del(&keys).await.map_err(|e| command(&e))?;
                removed += n;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        tracing::debug!(pattern, removed, "keys flushed");
        Ok(removed)
    }
}
