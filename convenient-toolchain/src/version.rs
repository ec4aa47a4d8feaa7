//! Dot-separated version tuples used to rank SDK install directories.

use std::cmp::Ordering;
use std::fmt;

/// A parsed version such as `1.3.275.0`.
///
/// Comparison is numeric per component (`1.2.0 < 1.10.0`) and a shorter tuple
/// behaves as if padded with zeros, so `1.2` and `1.2.0` compare equal.
#[derive(Debug, Clone, Default)]
pub struct VersionTuple(Vec<u64>);

impl VersionTuple {
    /// Parse a version string. Components that are not integers count as `0`,
    /// so this never fails. All-digit components too large for `u64`
    /// saturate to `u64::MAX`.
    pub fn parse(s: &str) -> Self {
        Self(s.split('.').map(parse_component).collect())
    }

    /// The numeric components in order.
    pub fn components(&self) -> &[u64] {
        &self.0
    }

    fn component(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

fn parse_component(part: &str) -> u64 {
    let part = part.trim();
    match part.parse::<u64>() {
        Ok(n) => n,
        Err(_) if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => u64::MAX,
        Err(_) => 0,
    }
}

impl PartialEq for VersionTuple {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTuple {}

impl PartialOrd for VersionTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<&str> for VersionTuple {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
