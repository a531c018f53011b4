//! Passkeeper Core - Shared paths and configuration
//!
//! Everything that decides *where* passkeeper keeps its files lives here, so the
//! store itself only ever deals with resolved paths.

pub mod config;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
