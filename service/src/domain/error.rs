//! Typed domain error enums.
//!
//! One enum per failure family. All of them implement `thiserror::Error`
//! and convert to `anyhow::Error` via the `?` operator at the command
//! boundary.

use std::path::PathBuf;

use thiserror::Error;

// ── Compartment errors ────────────────────────────────────────────────────────

/// Data-consistency failures while resolving compartment paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompartmentError {
    #[error("compartment {0} is not in the enumerated compartment set")]
    NotFound(String),

    #[error("parent chain of compartment {0} never reaches the tenancy")]
    Cycle(String),
}

// ── Provider errors ───────────────────────────────────────────────────────────

/// Failures reported by (or while talking to) the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("profile '{0}' is not present in the provider config")]
    UnknownProfile(String),

    #[error("provider call failed: {0}")]
    Api(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),
}

// ── Cache errors ──────────────────────────────────────────────────────────────

/// Transport and decoding failures of the cache backend. An absent key is
/// never an error.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Connect(String),

    #[error("cache command failed: {0}")]
    Command(String),

    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("cached record {key} is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Scan errors ───────────────────────────────────────────────────────────────

/// Anything that aborts a scan run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Compartment(#[from] CompartmentError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

// ── Action errors ─────────────────────────────────────────────────────────────

/// Outcomes of the action path other than success.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unrecognized action: {0}")]
    UnrecognizedAction(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("need content-type 'application/json', but got '{0}'")]
    UnsupportedMediaType(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("verification failed: {0}")]
    Verify(#[source] ProviderError),

    #[error("action failed: {0}")]
    Dispatch(#[source] ProviderError),

    #[error(transparent)]
    Compartment(#[from] CompartmentError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ActionError {
    /// HTTP status reported for this outcome.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::UnrecognizedAction(_) | Self::InvalidName(_) | Self::BadRequest(_) => 400,
            Self::UnsupportedMediaType(_) => 415,
            Self::Verify(_) | Self::Dispatch(_) | Self::Compartment(_) | Self::Cache(_) => 500,
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Problems with the profile-sectioned provider config file. Always fatal
/// at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read provider config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no profiles found in {0}")]
    NoProfiles(PathBuf),

    #[error("profile [{profile}] is missing required key '{key}'")]
    MissingKey { profile: String, key: &'static str },

    #[error("profile [{profile}] key_file {path} does not exist")]
    KeyFileMissing { profile: String, path: PathBuf },

    #[error("profile [{0}] is not defined")]
    UnknownProfile(String),
}
