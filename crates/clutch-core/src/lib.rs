//! Cluster coupling, simulation clock, and tick cycle for the Clutch
//! simulation.
//!
//! This crate owns everything above a single egg: the ordered cluster with
//! its fixed neighbour wiring, the iteration counter and first-pip
//! timestamps, the per-tick orchestration, and the loop that paces ticks.
//!
//! # Modules
//!
//! - [`clock`] -- Iteration counter and time-to-first-pip records.
//! - [`cluster`] -- The egg cluster, neighbour coupling, and [`Cluster::step`].
//! - [`config`] -- Configuration loading from `clutch-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- The bounded tick loop with step triggers and callbacks.
//! - [`tick`] -- One reporting tick: step, record first pips, snapshot.
//!
//! [`Cluster::step`]: cluster::Cluster::step

pub mod clock;
pub mod cluster;
pub mod config;
pub mod runner;
pub mod tick;
