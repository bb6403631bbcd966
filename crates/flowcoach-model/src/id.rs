//! Content-derived identifiers
//!
//! Patterns and insights are identified by a Blake3 digest of the values
//! that define them, so re-running the pipeline on unchanged records yields
//! the same identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A 32-byte content digest (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Compute digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute digest of ordered string parts
    ///
    /// Parts are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    #[must_use]
    pub fn from_parts(parts: &[&str]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        blake3::Hash::from(self.0).to_hex().as_str()[..16].to_string()
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}

/// Pattern identifier
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct PatternId(pub String);

impl PatternId {
    /// Derive identifier from defining parts
    #[inline]
    #[must_use]
    pub fn derive(parts: &[&str]) -> Self {
        Self(format!("pat-{}", ContentId::from_parts(parts).short()))
    }
}

impl Display for PatternId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insight identifier
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct InsightId(pub String);

impl InsightId {
    /// Derive identifier from defining parts
    #[inline]
    #[must_use]
    pub fn derive(parts: &[&str]) -> Self {
        Self(format!("ins-{}", ContentId::from_parts(parts).short()))
    }
}

impl Display for InsightId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_deterministic() {
        let a = ContentId::from_parts(&["bottleneck", "review"]);
        let b = ContentId::from_parts(&["bottleneck", "review"]);
        assert_eq!(a, b);
        assert_eq!(a.short().len(), 16);
    }

    #[test]
    fn content_id_parts_are_length_prefixed() {
        let a = ContentId::from_parts(&["ab", "c"]);
        let b = ContentId::from_parts(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn derived_ids_are_prefixed() {
        assert!(PatternId::derive(&["x"]).0.starts_with("pat-"));
        assert!(InsightId::derive(&["x"]).0.starts_with("ins-"));
    }

    #[test]
    fn display_is_full_hex() {
        let id = ContentId::compute(b"flow");
        assert_eq!(id.to_string().len(), 64);
    }
}
