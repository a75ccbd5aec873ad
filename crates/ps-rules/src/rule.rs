//! The [`FormatRule`] struct binds extensions and conditions to an action.

use ps_core::{RuleAction, RuleCategory};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::facts::FileFacts;

/// One row of the compatibility table.
///
/// A rule matches a file when the extension candidate under consideration is
/// in `extensions` and every condition in `conditions` holds. An empty
/// `extensions` list is a wildcard for condition-only rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRule {
    /// Stable identifier, surfaced in logs, the skip log, and the manifest.
    pub rule_id: String,
    /// Category the rule files its matches under.
    pub category: RuleCategory,
    /// Accepted extensions, lowercased with leading dots.
    pub extensions: Vec<String>,
    /// Conjunction of extra predicates; empty means extension-only matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// What to do with matching files.
    pub action: RuleAction,
    /// Short human-readable note, carried into the manifest and used as the
    /// rejection reason for skip rules.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl FormatRule {
    /// Whether this rule's extension list accepts the candidate.
    pub fn accepts_extension(&self, candidate: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        !candidate.is_empty()
            && self
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(candidate))
    }

    /// Whether this rule matches the file for the given extension candidate.
    pub fn matches(&self, candidate: &str, facts: &FileFacts) -> bool {
        self.accepts_extension(candidate) && self.conditions.iter().all(|c| c.matches(facts))
    }

    /// The extension a matching file should carry afterwards.
    ///
    /// The original extension is preserved when the rule itself accepts it
    /// (a `.jpeg` stays `.jpeg`); otherwise the rule's first extension is
    /// the canonical spelling.
    pub fn preferred_extension(&self, original: &str) -> String {
        if !original.is_empty()
            && self
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(original))
        {
            return original.to_ascii_lowercase();
        }
        self.extensions.first().cloned().unwrap_or_default()
    }
}
