//! The per-file evidence bundle that rules evaluate against.

use std::collections::BTreeMap;

use ps_detect::{DetectorId, FormatVote};

/// Everything the rule engine may examine about one file.
///
/// Built by the classifier after detection and (for video) probing. All
/// strings are stored lowercased so condition matching is a plain substring
/// or equality check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFacts {
    /// Extension candidates in priority order: consensus extension first,
    /// then the on-disk extension, then the empty string. Normalized with a
    /// leading dot.
    pub extension_candidates: Vec<String>,
    /// The extension the file carried when scanned.
    pub original_extension: String,
    /// Raw detector output strings (MIME, extension, description) keyed by
    /// the detector that produced them.
    pub tool_outputs: BTreeMap<DetectorId, Vec<String>>,
    /// Probed stream summary tokens (`container:mp4`, `video:h264`,
    /// `audio:aac`). Empty for files that were not probed.
    pub stream_tokens: Vec<String>,
    /// Whether the file holds an animated image sequence.
    pub animated: bool,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Photoshop color mode (`rgb`, `cmyk`, ...) when one was sniffed.
    pub color_mode: Option<String>,
}

impl FileFacts {
    /// Record every string a detector vote carries, lowercased.
    ///
    /// Extensions are recorded both with and without the leading dot so
    /// rules can match either spelling. Failed votes contribute nothing.
    pub fn record_vote(&mut self, vote: &FormatVote) {
        if !vote.is_usable() {
            return;
        }
        let values = self.tool_outputs.entry(vote.detector).or_default();
        if let Some(mime) = &vote.mime {
            values.push(mime.to_lowercase());
        }
        if let Some(ext) = &vote.extension {
            values.push(ext.to_lowercase());
            let bare = ext.trim_start_matches('.');
            if !bare.is_empty() {
                values.push(bare.to_lowercase());
            }
        }
        if let Some(desc) = &vote.description {
            values.push(desc.to_lowercase());
        }
    }

    /// Whether any output of `tool` contains `needle` (case-insensitive).
    pub fn output_contains(&self, tool: DetectorId, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tool_outputs
            .get(&tool)
            .map_or(false, |values| values.iter().any(|v| v.contains(&needle)))
    }

    /// Whether the probed stream summary carries the given token.
    pub fn has_stream_token(&self, token: &str) -> bool {
        self.stream_tokens
            .iter()
            .any(|t| t.eq_ignore_ascii_case(token))
    }

    /// Whether any non-empty extension candidate equals `ext`.
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension_candidates
            .iter()
            .any(|c| !c.is_empty() && c.eq_ignore_ascii_case(ext))
    }
}
