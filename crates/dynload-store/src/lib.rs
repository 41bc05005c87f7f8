//! Precompiled artifact stores and the fallback search path.
//!
//! This crate provides:
//! - [`ArtifactStore`]: read-only lookup of precompiled unit buffers
//! - [`FsArtifactStore`]: directory-backed store (`<module>/<member>.unit`)
//! - [`InMemoryArtifactStore`]: map-backed store for tests and fixtures
//! - [`FallbackSearchPath`]: external unit archives for foreign names
//!
//! Everything here is an optimization layer: absence is never an error, and
//! read failures degrade to absence so resolution can fall through to live
//! emission.

pub mod fallback;
pub mod paths;
pub mod store;

pub use fallback::FallbackSearchPath;
pub use store::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
