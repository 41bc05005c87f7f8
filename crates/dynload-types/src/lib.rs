//! Shared types for the dynload workspace.
//!
//! This crate provides:
//! - [`name`]: unit naming, the reserved namespace, companion markers
//! - [`error`]: the subsystem's typed load errors
//! - [`unit`]: opaque handles to host-defined units
//! - [`config`]: startup configuration for the fallback search path

pub mod config;
pub mod error;
pub mod name;
pub mod unit;

pub use config::LoaderConfig;
pub use error::LoadError;
pub use name::{CompanionKind, NamespacedName, UnitName, METADATA_MEMBER, NAMESPACE_PREFIX};
pub use unit::UnitHandle;
