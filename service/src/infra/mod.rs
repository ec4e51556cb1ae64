//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! `oci` command-line adapter, provider config parsing and the Valkey
//! cache backend.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::http` are forbidden.

pub mod command_runner;
pub mod oci_cli;
pub mod oci_config;
pub mod valkey;
