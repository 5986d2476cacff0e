//! Shared type definitions for the Clutch incubation simulation.
//!
//! Everything here is a plain value type: the core crates produce them and
//! the driver renders them. Nothing in this crate mutates simulation state.
//!
//! # Modules
//!
//! - [`ids`] -- Index-based egg identifiers
//! - [`enums`] -- Developmental phase of an egg
//! - [`structs`] -- Per-egg snapshots and cluster-level summaries

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::DevelopmentPhase;
pub use ids::EggId;
pub use structs::{ClusterSummary, EggSnapshot, FirstPipRecord, WEEKS_PER_STAGE};
