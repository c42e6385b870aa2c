//! Correlation tokens

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned token routing responses and updates back to their origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CID({})", self.0)
    }
}

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Hands out increasing correlation ids.
///
/// Starts high so generated ids stay clear of small caller-chosen tokens.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next: u64,
}

impl CorrelationIdGenerator {
    pub const FIRST: u64 = 1 << 32;

    pub fn new() -> Self {
        Self { next: Self::FIRST }
    }

    pub fn next_id(&mut self) -> CorrelationId {
        let id = CorrelationId(self.next);
        self.next += 1;
        id
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_increasing() {
        let mut ids = CorrelationIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert_eq!(a.value(), CorrelationIdGenerator::FIRST);
    }

    #[test]
    fn test_display() {
        assert_eq!(CorrelationId::new(7).to_string(), "CID(7)");
    }
}
