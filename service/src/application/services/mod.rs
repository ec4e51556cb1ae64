//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::http`.

pub mod cache;
pub mod compartments;
pub mod dispatch;
pub mod paging;
pub mod region_scan;
pub mod retry;
pub mod tenant_scan;
pub mod worker;
