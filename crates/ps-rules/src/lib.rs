//! # ps-rules
//!
//! The compatibility rule table and classification engine.
//!
//! A scanned file's detection and probe results are condensed into
//! [`FileFacts`]; the [`RuleEngine`] walks an ordered table of
//! [`FormatRule`]s and either accepts the file with an action to perform or
//! rejects it with a loggable reason.
//!
//! ## Overview
//!
//! - [`FileFacts`] -- the evidence bundle rules evaluate against.
//! - [`Condition`] -- leaf predicates (detector output, stream tokens,
//!   animation, size, color mode).
//! - [`FormatRule`] -- binds extensions and conditions to a
//!   [`ps_core::RuleAction`].
//! - [`RuleEngine`] -- ordered first-match-wins classification.
//! - [`builtin_rules`] -- the default table; a JSON rules file replaces it
//!   wholesale.

pub mod builtin;
pub mod condition;
pub mod engine;
pub mod facts;
pub mod rule;

pub use builtin::builtin_rules;
pub use condition::Condition;
pub use engine::{RuleEngine, RuleMatch};
pub use facts::FileFacts;
pub use rule::FormatRule;

/// Serialize a rule table to a JSON string.
pub fn serialize_rules(rules: &[FormatRule]) -> Result<String, serde_json::Error> {
    serde_json::to_string(rules)
}

/// Serialize a rule table to a pretty-printed JSON string.
pub fn serialize_rules_pretty(rules: &[FormatRule]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rules)
}

/// Deserialize a rule table from a JSON string.
pub fn deserialize_rules(json: &str) -> Result<Vec<FormatRule>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load a rule table from a JSON file, replacing the built-in table.
///
/// An unreadable or malformed file is a configuration error; an empty table
/// is accepted (it rejects everything, which a deliberately restrictive
/// setup may want).
pub fn load_rules_file(path: &std::path::Path) -> ps_core::Result<Vec<FormatRule>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        ps_core::Error::Config(format!("cannot read rules file {}: {e}", path.display()))
    })?;
    deserialize_rules(&json).map_err(|e| {
        ps_core::Error::Config(format!("invalid rules file {}: {e}", path.display()))
    })
}
