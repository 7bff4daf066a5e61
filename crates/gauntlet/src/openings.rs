//! Opening move-prefix sets.
//!
//! An opening source hands the harness a finite sequence of move prefixes,
//! each an ordered list of coordinate moves from the start position.
//! Parsing book files is the caller's concern; prefixes arrive pre-split.
//! Legality of the prefix is still verified at game start.

/// A finite collection of opening move prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningSet {
    prefixes: Vec<Vec<String>>,
}

impl OpeningSet {
    /// Builds a set from pre-split move prefixes.
    #[must_use]
    pub fn from_prefixes(prefixes: Vec<Vec<String>>) -> Self {
        Self { prefixes }
    }

    /// The set containing only the empty prefix: play from the start
    /// position with no book moves.
    #[must_use]
    pub fn start_only() -> Self {
        Self {
            prefixes: vec![Vec::new()],
        }
    }

    /// Number of prefixes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// True if the set holds no prefixes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Iterates over the prefixes in book order.
    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.prefixes.iter().map(|p| p.as_slice())
    }
}
