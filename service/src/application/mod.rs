//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::http`.

pub mod ports;
pub mod services;

pub use ports::{
    CacheBackend, CacheSession, CloudConnector, CommandRunner, ComputeApi, Page, TenancyApi,
};
