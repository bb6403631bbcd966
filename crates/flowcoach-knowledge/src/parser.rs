//! Corpus document parser
//!
//! A corpus document is Markdown with a YAML front matter block:
//!
//! ```text
//! ---
//! id: kb-review-queue
//! title: Review queues that outgrow the team
//! scopes: [team]
//! symptom: bottleneck
//! metrics: [stage_mean_days, stage_p85_days]
//! confidence: high
//! owner_role: Scrum Master
//! ---
//! Guidance prose...
//!
//! ## Root causes
//! - Reviews wait for a single approver
//!
//! ## Practices
//! - Pair on reviews older than one day
//! ```
//!
//! Bullets under `## Root causes` and `## Practices` become structured hints.

use crate::document::{Applicability, DocumentId, KnowledgeDocument};
use crate::error::KnowledgeError;
use flowcoach_model::ConfidenceTier;
use pulldown_cmark::{Event, Parser as MdParser, Tag, TagEnd};
use serde::Deserialize;

/// Front matter keys
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrontMatter {
    id: String,
    title: String,
    #[serde(default = "default_scopes")]
    scopes: Vec<Applicability>,
    symptom: String,
    #[serde(default)]
    metrics: Vec<String>,
    #[serde(default = "default_confidence")]
    confidence: ConfidenceTier,
    #[serde(default)]
    owner_role: Option<String>,
}

fn default_scopes() -> Vec<Applicability> {
    vec![Applicability::Any]
}

fn default_confidence() -> ConfidenceTier {
    ConfidenceTier::Medium
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hints {
    RootCauses,
    Practices,
    None,
}

impl Hints {
    fn from_heading(heading: &str) -> Self {
        match heading.trim().to_lowercase().as_str() {
            "root causes" | "root cause" | "causes" => Self::RootCauses,
            "practices" | "recommended practices" => Self::Practices,
            _ => Self::None,
        }
    }
}

/// Markdown corpus parser
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusParser;

impl CorpusParser {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse one document
    ///
    /// `source_name` is only used in error messages.
    ///
    /// # Errors
    /// Returns error if the front matter is missing or malformed, or a
    /// required header field is empty
    pub fn parse(
        &self,
        source_name: &str,
        content: &str,
    ) -> Result<KnowledgeDocument, KnowledgeError> {
        let (header, body) = Self::split_front_matter(content).ok_or_else(|| {
            KnowledgeError::MissingFrontMatter {
                source_name: source_name.to_string(),
            }
        })?;
        let header: FrontMatter = serde_yaml::from_str(header)
            .map_err(|e| KnowledgeError::malformed(source_name, e.to_string()))?;

        for (field, value) in [
            ("id", &header.id),
            ("title", &header.title),
            ("symptom", &header.symptom),
        ] {
            if value.trim().is_empty() {
                return Err(KnowledgeError::EmptyField {
                    source_name: source_name.to_string(),
                    field,
                });
            }
        }
        if header.scopes.is_empty() {
            return Err(KnowledgeError::EmptyField {
                source_name: source_name.to_string(),
                field: "scopes",
            });
        }

        let (root_causes, practices) = Self::collect_hints(body);
        Ok(KnowledgeDocument {
            id: DocumentId::new(header.id.trim()),
            title: header.title.trim().to_string(),
            scopes: header.scopes,
            symptom: header.symptom.trim().to_lowercase(),
            metrics: header.metrics,
            confidence: header.confidence,
            owner_role: header.owner_role.filter(|r| !r.trim().is_empty()),
            body: body.trim().to_string(),
            root_causes,
            practices,
        })
    }

    /// Split `---` delimited front matter from the body
    fn split_front_matter(content: &str) -> Option<(&str, &str)> {
        let content = content.trim_start_matches('\u{feff}');
        let rest = content
            .strip_prefix("---\r\n")
            .or_else(|| content.strip_prefix("---\n"))?;
        let end = rest.find("\n---")?;
        let header = &rest[..end];
        let after = &rest[end + 4..];
        let body = after.split_once('\n').map_or("", |(_, body)| body);
        Some((header, body))
    }

    /// Collect top-level bullets under the hint headings
    fn collect_hints(body: &str) -> (Vec<String>, Vec<String>) {
        let mut root_causes = Vec::new();
        let mut practices = Vec::new();
        let mut section = Hints::None;
        let mut heading: Option<String> = None;
        let mut item: Option<String> = None;
        let mut item_depth = 0usize;

        for event in MdParser::new(body) {
            match event {
                Event::Start(Tag::Heading { .. }) => heading = Some(String::new()),
                Event::End(TagEnd::Heading(_)) => {
                    section = heading
                        .take()
                        .map_or(Hints::None, |h| Hints::from_heading(&h));
                }
                Event::Start(Tag::Item) => {
                    item_depth += 1;
                    if item_depth == 1 {
                        item = Some(String::new());
                    }
                }
                Event::End(TagEnd::Item) => {
                    item_depth = item_depth.saturating_sub(1);
                    if item_depth == 0 {
                        if let Some(text) = item.take() {
                            let text = text.trim().to_string();
                            match section {
                                _ if text.is_empty() => {}
                                Hints::RootCauses => root_causes.push(text),
                                Hints::Practices => practices.push(text),
                                Hints::None => {}
                            }
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(ref mut h) = heading {
                        h.push_str(&text);
                    } else if let Some(ref mut i) = item {
                        i.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(ref mut i) = item {
                        i.push(' ');
                    }
                }
                _ => {}
            }
        }

        (root_causes, practices)
    }
}
