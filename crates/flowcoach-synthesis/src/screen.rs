//! Person-attribution screening
//!
//! Insights describe the system of work, never individuals. Flow records
//! carry no people, so only enrichment prose can introduce a name; prose
//! that does is dropped whole.

use once_cell::sync::Lazy;
use regex::Regex;

static HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s(\[])@[A-Za-z0-9][A-Za-z0-9_.\-]*").expect("static regex"));

static ASSIGNEE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\b(?:assigned to|assignee(?: is)?|owned by|because of|blame(?:d)? on|fault of)\s+)[A-Z][a-z]+",
    )
    .expect("static regex")
});

/// Check if text attributes work or blame to a person
#[must_use]
pub fn attributes_person(text: &str) -> bool {
    HANDLE.is_match(text) || ASSIGNEE.is_match(text)
}

/// Keep prose only if it attributes nothing to a person
#[must_use]
pub fn screen(prose: &str) -> Option<&str> {
    let trimmed = prose.trim();
    if trimmed.is_empty() || attributes_person(trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_attributions() {
        assert!(attributes_person("Ask @jdoe to review faster"));
        assert!(attributes_person("(@team.lead) owns reviews"));
        assert!(!attributes_person("Mail reviews@example.com for access"));
    }

    #[test]
    fn assignee_phrases_are_attributions() {
        assert!(attributes_person("Most stuck items are assigned to Maria"));
        assert!(attributes_person("The delay is the fault of Sam"));
        assert!(!attributes_person("Items assigned to the review stage wait longest"));
    }

    #[test]
    fn screen_keeps_systemic_prose() {
        assert_eq!(
            screen("  Review capacity limits throughput. "),
            Some("Review capacity limits throughput.")
        );
        assert_eq!(screen("Blame on Alex"), None);
        assert_eq!(screen("   "), None);
    }
}
