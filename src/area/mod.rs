//! Area module
//!
//! Player-claimed protected areas:
//! - Geometry (intervals, volumes, block positions)
//! - Region records and creation outcomes
//! - The registry enforcing unique names and non-overlapping volumes
//! - Flat-file persistence of committed regions

pub mod geometry;
pub mod persistence;
pub mod region;
pub mod registry;

pub use geometry::{Interval, Point, Volume};
pub use persistence::{AreaRecord, AreaStore, FileStore, MemoryStore};
pub use region::{AccessMode, CreateOutcome, NameState, PendingRegion, Region};
pub use registry::{AreaRegistry, LoadReport, RegistrySettings};
