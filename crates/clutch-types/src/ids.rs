//! Egg identifiers.
//!
//! Eggs live in a fixed-size ordered container, so an identifier is simply
//! the egg's position in that container. Neighbour links are expressed as
//! these indices rather than references.

use serde::{Deserialize, Serialize};

/// Letters used for the human-readable egg labels (`Turtle_A`, `Turtle_B`, ...).
const LABEL_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Identifier of an egg within its cluster (0-based position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EggId(pub usize);

impl EggId {
    /// Create an identifier for the egg at `index`.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the position of the egg in its cluster.
    pub const fn index(self) -> usize {
        self.0
    }

    /// Human-readable label used in reports.
    ///
    /// The first 26 eggs are lettered; later ones fall back to their index.
    pub fn label(self) -> String {
        LABEL_LETTERS.get(self.0).map_or_else(
            || format!("Turtle_{}", self.0),
            |&letter| format!("Turtle_{}", char::from(letter)),
        )
    }
}

impl core::fmt::Display for EggId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_letters_then_indices() {
        assert_eq!(EggId::new(0).label(), "Turtle_A");
        assert_eq!(EggId::new(2).label(), "Turtle_C");
        assert_eq!(EggId::new(25).label(), "Turtle_Z");
        assert_eq!(EggId::new(26).label(), "Turtle_26");
    }

    #[test]
    fn serializes_as_bare_index() {
        let json = serde_json::to_string(&EggId::new(4)).ok();
        assert_eq!(json.as_deref(), Some("4"));
    }
}
