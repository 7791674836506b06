//! Feature model explorer.
//!
//! Turns the feature documents a host extracts from a codebase into the
//! tree, treemap, tangling, scattering and timeline projections, and
//! answers searches against whichever projection is active.

pub mod api;
pub mod color;
pub mod config;
pub mod error;
pub mod explorer;
pub mod models;
pub mod projector;
pub mod scattering;
pub mod search;
pub mod source;
pub mod timeline;
pub mod tree;

pub use error::{Error, Result};
pub use explorer::Explorer;
