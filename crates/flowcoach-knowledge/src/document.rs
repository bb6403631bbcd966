//! Typed corpus documents

use flowcoach_model::{ConfidenceTier, ScopeLevel};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Corpus document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope a document applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    Team,
    Program,
    Portfolio,
    /// Every scope level
    Any,
}

impl Applicability {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Program => "program",
            Self::Portfolio => "portfolio",
            Self::Any => "any",
        }
    }

    /// Check if a scope level is covered
    #[inline]
    #[must_use]
    pub fn covers(self, level: ScopeLevel) -> bool {
        match self {
            Self::Any => true,
            Self::Team => level == ScopeLevel::Team,
            Self::Program => level == ScopeLevel::Program,
            Self::Portfolio => level == ScopeLevel::Portfolio,
        }
    }
}

/// A parsed coaching document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeDocument {
    pub id: DocumentId,
    pub title: String,
    /// Scope levels the guidance applies to
    pub scopes: Vec<Applicability>,
    /// Symptom tag matched against pattern kinds
    pub symptom: String,
    /// Metric field names the guidance discusses
    pub metrics: Vec<String>,
    pub confidence: ConfidenceTier,
    /// Role that usually owns the practices
    pub owner_role: Option<String>,
    /// Guidance text (Markdown body without front matter)
    pub body: String,
    /// Bullets under `## Root causes`
    pub root_causes: Vec<String>,
    /// Bullets under `## Practices`
    pub practices: Vec<String>,
}

impl KnowledgeDocument {
    /// Check if the document applies at a scope level
    #[must_use]
    pub fn applies_to(&self, level: ScopeLevel) -> bool {
        self.scopes.iter().any(|scope| scope.covers(level))
    }

    /// Check if the document discusses a metric field
    #[inline]
    #[must_use]
    pub fn mentions_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_covers_every_level() {
        for level in [ScopeLevel::Team, ScopeLevel::Program, ScopeLevel::Portfolio] {
            assert!(Applicability::Any.covers(level));
        }
        assert!(!Applicability::Team.covers(ScopeLevel::Program));
    }

    #[test]
    fn applicability_from_header_names() {
        let scopes: Vec<Applicability> = serde_yaml::from_str("[team, any]").unwrap();
        assert_eq!(scopes, vec![Applicability::Team, Applicability::Any]);
    }
}
