//! Per-egg physiology for the Clutch simulation.
//!
//! This crate holds the biological state machine of a single egg and
//! nothing else: no cluster topology, no clocks, no I/O. The cluster and
//! tick orchestration live in `clutch-core`.
//!
//! # Modules
//!
//! - [`config`] -- Tunable thresholds for pipping and hatching ([`PhysiologyConfig`])
//! - [`egg`] -- The egg agent: develop, metabolise, try to pip, observe ([`Egg`])
//! - [`error`] -- Error types for egg operations ([`EmbryoError`])
//! - [`random`] -- Injected randomness ([`RandomSource`], [`RngSource`], [`ScriptedSource`])

pub mod config;
pub mod egg;
pub mod error;
pub mod random;

pub use config::PhysiologyConfig;
pub use egg::Egg;
pub use error::EmbryoError;
pub use random::{RandomSource, RngSource, ScriptedSource};
