//! Workflow stages and the two known workflow shapes
//!
//! Stage names arrive from the provider in many spellings
//! (`In Progress`, `in_progress`, `IN-PROGRESS`); [`StageName`] normalizes
//! them to lowercase kebab-case so lookups are spelling-independent.

use crate::error::ModelError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Normalized workflow stage name
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(from = "String", into = "String")]
pub struct StageName(String);

impl StageName {
    /// Create stage name, normalizing spelling
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Get normalized name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

impl From<String> for StageName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for StageName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<StageName> for String {
    fn from(value: StageName) -> Self {
        value.0
    }
}

impl Display for StageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for StageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

const FEATURE_STAGES: &[&str] = &[
    "funnel",
    "backlog",
    "analysis",
    "in-progress",
    "review",
    "integration-test",
    "acceptance-test",
    "ready-for-deployment",
    "deployed",
];

const STORY_STAGES: &[&str] = &[
    "refinement",
    "ready-for-development",
    "in-development",
    "code-review",
    "ready-for-test",
    "in-testing",
    "ready-for-deployment",
    "deployed",
];

/// Known workflow layouts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowShape {
    /// Feature-level workflow (program increments)
    #[default]
    Feature,
    /// Story-level workflow (team sprints)
    Story,
}

impl WorkflowShape {
    /// Stages in workflow order
    #[inline]
    #[must_use]
    pub fn stages(self) -> &'static [&'static str] {
        match self {
            Self::Feature => FEATURE_STAGES,
            Self::Story => STORY_STAGES,
        }
    }

    /// Stages that may be absent from a record without reducing its completeness
    #[inline]
    #[must_use]
    pub fn optional_stages(self) -> &'static [&'static str] {
        match self {
            Self::Feature => &["funnel"],
            Self::Story => &["code-review"],
        }
    }

    /// Stages an item reaches once delivered
    #[inline]
    #[must_use]
    pub fn terminal_stages(self) -> &'static [&'static str] {
        &["deployed"]
    }

    /// Value-adding stages used for flow efficiency unless configured otherwise
    #[inline]
    #[must_use]
    pub fn default_active_stages(self) -> &'static [&'static str] {
        match self {
            Self::Feature => &["analysis", "in-progress", "review"],
            Self::Story => &["in-development", "code-review", "in-testing"],
        }
    }

    /// Position of a stage in workflow order
    #[must_use]
    pub fn position(self, stage: &StageName) -> Option<usize> {
        self.stages().iter().position(|s| stage == *s)
    }

    /// Check if stage belongs to this shape
    #[inline]
    #[must_use]
    pub fn contains(self, stage: &StageName) -> bool {
        self.position(stage).is_some()
    }

    /// Check if stage is terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(self, stage: &StageName) -> bool {
        self.terminal_stages().iter().any(|s| stage == *s)
    }

    /// Check if stage is optional
    #[inline]
    #[must_use]
    pub fn is_optional(self, stage: &StageName) -> bool {
        self.optional_stages().iter().any(|s| stage == *s)
    }

    /// Required, non-terminal stages
    pub fn required_stages(self) -> impl Iterator<Item = StageName> {
        self.stages()
            .iter()
            .map(|s| StageName::new(s))
            .filter(move |s| !self.is_optional(s) && !self.is_terminal(s))
    }

    /// Infer shape from the stage names present in a record
    ///
    /// Any story-only stage name selects [`WorkflowShape::Story`].
    #[must_use]
    pub fn infer<'a>(names: impl IntoIterator<Item = &'a StageName>, fallback: Self) -> Self {
        let mut feature_hits = 0usize;
        for name in names {
            if STORY_STAGES.contains(&name.as_str()) && !FEATURE_STAGES.contains(&name.as_str()) {
                return Self::Story;
            }
            if FEATURE_STAGES.contains(&name.as_str()) && !STORY_STAGES.contains(&name.as_str()) {
                feature_hits += 1;
            }
        }
        if feature_hits > 0 {
            Self::Feature
        } else {
            fallback
        }
    }

    /// Name used in wire format
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Story => "story",
        }
    }
}

impl FromStr for WorkflowShape {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "feature" | "features" | "epic" => Ok(Self::Feature),
            "story" | "stories" | "user-story" => Ok(Self::Story),
            _ => Err(ModelError::UnknownWorkflow(s.to_string())),
        }
    }
}

impl Display for WorkflowShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_name_normalizes_spelling() {
        assert_eq!(StageName::new("In Progress").as_str(), "in-progress");
        assert_eq!(StageName::new("in_progress").as_str(), "in-progress");
        assert_eq!(StageName::new("  CODE-REVIEW ").as_str(), "code-review");
        assert_eq!(StageName::new("Ready for Deployment").as_str(), "ready-for-deployment");
    }

    #[test]
    fn shapes_have_expected_sizes() {
        assert_eq!(WorkflowShape::Feature.stages().len(), 9);
        assert_eq!(WorkflowShape::Story.stages().len(), 8);
    }

    #[test]
    fn code_review_is_optional_story_stage() {
        let review = StageName::new("code-review");
        assert!(WorkflowShape::Story.is_optional(&review));
        assert!(!WorkflowShape::Feature.contains(&review));
    }

    #[test]
    fn infer_prefers_story_specific_names() {
        let names = [StageName::new("in-development"), StageName::new("deployed")];
        assert_eq!(
            WorkflowShape::infer(names.iter(), WorkflowShape::Feature),
            WorkflowShape::Story
        );

        let shared = [StageName::new("deployed")];
        assert_eq!(
            WorkflowShape::infer(shared.iter(), WorkflowShape::Story),
            WorkflowShape::Story
        );
    }

    #[test]
    fn required_stages_skip_optional_and_terminal() {
        let required: Vec<_> = WorkflowShape::Story.required_stages().collect();
        assert!(!required.iter().any(|s| s == "code-review"));
        assert!(!required.iter().any(|s| s == "deployed"));
        assert_eq!(required.len(), 6);
    }

    #[test]
    fn workflow_from_str() {
        assert_eq!("Story".parse::<WorkflowShape>().unwrap(), WorkflowShape::Story);
        assert!("kanban".parse::<WorkflowShape>().is_err());
    }
}
