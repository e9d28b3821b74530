//! The engine facade for latticekv: orchestrates the primary map, the
//! secondary indexes, and the durability layer behind a single exclusive
//! guard.

pub mod engine;
pub mod primary_map;
pub mod recovery;

pub use engine::{CheckpointPolicy, Engine, EngineConfig};
pub use primary_map::PrimaryMap;
