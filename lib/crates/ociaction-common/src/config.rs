use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Prefix for every environment variable read by [`ServiceConfig::from_env`].
pub const ENV_PREFIX: &str = "OCIACTION_";

/// Service configuration loaded from `OCIACTION_*` environment variables.
///
/// Every field has a default so an empty environment yields a usable
/// local setup:
///   - `OCIACTION_LISTEN_ADDR`        (default `0.0.0.0:8080`)
///   - `OCIACTION_CACHE_HOST`         (default `localhost`)
///   - `OCIACTION_CACHE_PORT`         (default `6379`)
///   - `OCIACTION_CACHE_PASSWORD`     (optional)
///   - `OCIACTION_CACHE_TLS`          (default `false`)
///   - `OCIACTION_OCI_CONFIG`         (default `config`)
///   - `OCIACTION_OCI_CLI`            (default `oci`)
///   - `OCIACTION_OCI_TIMEOUT_SECS`   (default `120`)
///   - `OCIACTION_SCAN_INTERVAL_SECS` (default `86400`)
///   - `OCIACTION_RETRY_ATTEMPTS`     (default `10`)
///   - `OCIACTION_RETRY_DELAY_SECS`   (default `2`)
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Socket address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Cache backend host.
    #[serde(default = "default_cache_host")]
    pub cache_host: String,

    /// Cache backend port.
    #[serde(default = "default_cache_port")]
    pub cache_port: u16,

    /// Optional cache backend password.
    #[serde(default)]
    pub cache_password: Option<String>,

    /// Connect to the cache backend over TLS (`rediss://`).
    #[serde(default)]
    pub cache_tls: bool,

    /// Profile-sectioned provider config file.
    #[serde(default = "default_oci_config")]
    pub oci_config: PathBuf,

    /// Provider command-line tool.
    #[serde(default = "default_oci_cli")]
    pub oci_cli: String,

    /// Upper bound for a single provider call.
    #[serde(default = "default_oci_timeout_secs")]
    pub oci_timeout_secs: u64,

    /// Interval between full rescans.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Attempts per listing call before the scan run is aborted.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between listing attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Load from explicit `(name, value)` pairs, names including the prefix.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(pairs)
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cache_host() -> String {
    "localhost".to_string()
}

fn default_cache_port() -> u16 {
    6379
}

fn default_oci_config() -> PathBuf {
    PathBuf::from("config")
}

fn default_oci_cli() -> String {
    "oci".to_string()
}

fn default_oci_timeout_secs() -> u64 {
    120
}

fn default_scan_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_retry_attempts() -> u32 {
    10
}

fn default_retry_delay_secs() -> u64 {
    2
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cache_host: default_cache_host(),
            cache_port: default_cache_port(),
            cache_password: None,
            cache_tls: false,
            oci_config: default_oci_config(),
            oci_cli: default_oci_cli(),
            oci_timeout_secs: default_oci_timeout_secs(),
            scan_interval_secs: default_scan_interval_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}
