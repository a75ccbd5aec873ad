//! Leaf conditions that evaluate against [`FileFacts`].
//!
//! Each [`Condition`] variant checks a single fact about a file. A rule's
//! condition list is a conjunction; see [`crate::FormatRule`].

use ps_detect::DetectorId;
use serde::{Deserialize, Serialize};

use crate::facts::FileFacts;

/// A leaf condition that evaluates a single property of a scanned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Matches if any non-empty extension candidate equals the value.
    ExtensionEquals {
        /// Extension with leading dot, e.g. `.png`.
        extension: String,
    },
    /// Matches if any output string of the given detector contains the
    /// needle (case-insensitive substring).
    OutputContains {
        /// Which detector's output to search.
        tool: DetectorId,
        /// Substring to look for.
        needle: String,
    },
    /// Matches if the probed stream summary carries the token
    /// (`container:mp4`, `video:h264`, `audio:aac`).
    StreamToken {
        /// The token to look for.
        token: String,
    },
    /// Matches if the animated flag equals the value.
    Animated {
        /// Required flag state.
        value: bool,
    },
    /// Matches if the file size falls inside the given bounds (inclusive).
    SizeRange {
        /// Minimum size in bytes; no lower bound when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        /// Maximum size in bytes; no upper bound when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
    },
    /// Matches if the sniffed Photoshop color mode equals the value.
    ColorMode {
        /// Color mode name, e.g. `rgb` or `cmyk`.
        value: String,
    },
}

impl Condition {
    /// Evaluate this condition against the given facts.
    pub fn matches(&self, facts: &FileFacts) -> bool {
        match self {
            Condition::ExtensionEquals { extension } => facts.has_extension(extension),
            Condition::OutputContains { tool, needle } => facts.output_contains(*tool, needle),
            Condition::StreamToken { token } => facts.has_stream_token(token),
            Condition::Animated { value } => facts.animated == *value,
            Condition::SizeRange { min, max } => {
                min.map_or(true, |m| facts.size_bytes >= m)
                    && max.map_or(true, |m| facts.size_bytes <= m)
            }
            Condition::ColorMode { value } => facts
                .color_mode
                .as_deref()
                .map_or(false, |mode| mode.eq_ignore_ascii_case(value)),
        }
    }
}
