pub mod cache_keys;
pub mod config;
pub mod types;

pub use cache_keys::{keys, namespace_pattern, normalize_name, resource_key, validate_resource_name};
pub use config::ServiceConfig;
pub use types::*;
