//! Area Registry Library
//!
//! Tracks player-defined protected volumes inside a shared world and answers
//! the permission queries used to gate world modification.
//!
//! ## Modules
//!
//! - `area` - Region geometry, the registry, and area-list persistence
//! - `config` - Registry configuration management
//! - `error` - Error types and result definitions

pub mod area;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use area::{AreaRegistry, CreateOutcome, Point, Region};
pub use config::AreaConfig;
pub use error::{AreaRegistryError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
