//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod compartment;
pub mod error;
pub mod retry;

pub use compartment::CompartmentTree;
pub use error::{ActionError, CacheError, CompartmentError, ConfigError, ProviderError, ScanError};
pub use retry::{Backoff, RetryPolicy};
