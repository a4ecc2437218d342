//! The integer key that identifies an entity in the target store.

use std::fmt;

/// Identifier of an entity, sent as the `id` query parameter.
///
/// Keys are always rendered in decimal on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Key(pub u64);

impl Key {
    /// Returns the numeric value of the key.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
