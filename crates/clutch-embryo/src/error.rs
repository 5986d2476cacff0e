//! Error types for the clutch-embryo crate.
//!
//! The physiology formulas are total over finite inputs. The only thing
//! that can go wrong is a non-finite value creeping into egg state, which
//! the model cannot recover from.

use clutch_types::EggId;

/// Errors that can occur during egg operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbryoError {
    /// An update produced NaN or an infinity.
    #[error("non-finite {quantity} for {egg}: {value}")]
    NonFinite {
        /// The egg whose update failed.
        egg: EggId,
        /// Name of the quantity being computed.
        quantity: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Physiology thresholds are unusable.
    #[error("invalid physiology configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
