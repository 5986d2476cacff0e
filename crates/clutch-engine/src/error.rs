//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and simulation execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: clutch_core::config::ConfigError,
    },

    /// The cluster could not be built from the configuration.
    #[error("cluster error: {source}")]
    Cluster {
        /// The underlying cluster error.
        #[from]
        source: clutch_core::cluster::ClusterError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: clutch_core::runner::RunnerError,
    },
}
