//! The [`RuleEngine`] classifies files against an ordered rule table.

use ps_core::{Error, RuleAction, RuleCategory};

use crate::builtin::builtin_rules;
use crate::facts::FileFacts;
use crate::rule::FormatRule;

/// Outcome of a successful classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Identifier of the matched rule.
    pub rule_id: String,
    /// The matched rule's category.
    pub category: RuleCategory,
    /// Action to perform on the file.
    pub action: RuleAction,
    /// Extension the file should carry after staging and conversion.
    pub extension: String,
    /// The matched rule's note.
    pub notes: String,
}

/// Rule engine that evaluates file facts against an ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<FormatRule>,
}

impl RuleEngine {
    /// Create an engine over the given table. Order is preserved; earlier
    /// rules win.
    pub fn new(rules: Vec<FormatRule>) -> Self {
        Self { rules }
    }

    /// Create an engine over the built-in table.
    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }

    /// Return a reference to the internal rules slice.
    pub fn rules(&self) -> &[FormatRule] {
        &self.rules
    }

    /// Return the first rule matching any extension candidate.
    ///
    /// Candidates are tried in priority order and the search stops at the
    /// first candidate that yields a match, so a confident consensus
    /// extension shadows the on-disk one.
    pub fn find_matching_rule(&self, facts: &FileFacts) -> Option<&FormatRule> {
        for candidate in &facts.extension_candidates {
            if let Some(rule) = self.rules.iter().find(|r| r.matches(candidate, facts)) {
                return Some(rule);
            }
        }
        None
    }

    /// Classify a file: either a [`RuleMatch`] to act on, or the rejection
    /// to log.
    ///
    /// Skip actions and the vector category reject with the rule's note as
    /// the reason; an unmatched file rejects as an unrecognized format.
    pub fn classify(&self, facts: &FileFacts) -> ps_core::Result<RuleMatch> {
        let rule = self.find_matching_rule(facts).ok_or_else(|| {
            let shown = facts
                .extension_candidates
                .iter()
                .find(|c| !c.is_empty())
                .map(|c| c.as_str())
                .unwrap_or("file without extension");
            Error::UnrecognizedFormat(format!("no rule matched {shown}"))
        })?;

        if rule.action.is_skip() || rule.category == RuleCategory::Vector {
            let note = if rule.notes.is_empty() {
                rule.rule_id.as_str()
            } else {
                rule.notes.as_str()
            };
            return Err(Error::unsupported(rule.category, note));
        }

        Ok(RuleMatch {
            rule_id: rule.rule_id.clone(),
            category: rule.category,
            action: rule.action,
            extension: rule.preferred_extension(&facts.original_extension),
            notes: rule.notes.clone(),
        })
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::SkipCategory;

    fn facts_for(consensus: &str, original: &str) -> FileFacts {
        FileFacts {
            extension_candidates: vec![
                consensus.to_string(),
                original.to_string(),
                String::new(),
            ],
            original_extension: original.to_string(),
            ..FileFacts::default()
        }
    }

    #[test]
    fn jpeg_imports_directly() {
        let engine = RuleEngine::builtin();
        let m = engine.classify(&facts_for(".jpg", ".jpg")).unwrap();
        assert_eq!(m.rule_id, "jpeg_import");
        assert_eq!(m.action, RuleAction::Import);
        assert_eq!(m.extension, ".jpg");
    }

    #[test]
    fn consensus_extension_shadows_the_on_disk_one() {
        // A PNG masquerading as .dat classifies by content.
        let engine = RuleEngine::builtin();
        let m = engine.classify(&facts_for(".png", ".dat")).unwrap();
        assert_eq!(m.rule_id, "png_import");
        assert_eq!(m.extension, ".png");
    }

    #[test]
    fn original_spelling_is_preserved_when_accepted() {
        let engine = RuleEngine::builtin();
        let m = engine.classify(&facts_for(".jpg", ".jpeg")).unwrap();
        assert_eq!(m.rule_id, "jpeg_import");
        assert_eq!(m.extension, ".jpeg");
    }

    #[test]
    fn animated_png_outranks_still_png() {
        let engine = RuleEngine::builtin();
        let mut facts = facts_for(".png", ".png");
        facts.animated = true;
        let m = engine.classify(&facts).unwrap();
        assert_eq!(m.rule_id, "apng_to_hevc_video");
        assert_eq!(m.action, RuleAction::ConvertAnimationToHevcMp4);
        assert_eq!(m.extension, ".png");
    }

    #[test]
    fn psd_classification_follows_color_mode() {
        let engine = RuleEngine::builtin();

        let mut facts = facts_for(".psd", ".psd");
        facts.color_mode = Some("cmyk".into());
        let m = engine.classify(&facts).unwrap();
        assert_eq!(m.rule_id, "psd_cmyk_to_tiff");
        assert_eq!(m.action, RuleAction::ConvertToTiff);

        facts.color_mode = Some("duotone".into());
        let err = engine.classify(&facts).unwrap_err();
        assert_eq!(err.skip_category(), SkipCategory::Unsupported);
        assert!(err.to_string().contains("duotone"));
    }

    #[test]
    fn prores_is_caught_before_the_container_rules() {
        let engine = RuleEngine::builtin();
        let mut facts = facts_for(".mov", ".mov");
        facts.stream_tokens = vec![
            "container:mov".into(),
            "video:prores".into(),
            "audio:pcm_s16le".into(),
        ];
        let m = engine.classify(&facts).unwrap();
        assert_eq!(m.rule_id, "prores_to_lossless_hevc");
        assert_eq!(m.action, RuleAction::TranscodeVideoToLosslessHevc);
        assert_eq!(m.extension, ".mov");
    }

    #[test]
    fn matroska_rewrap_needs_both_tokens() {
        let engine = RuleEngine::builtin();

        let mut facts = facts_for(".mkv", ".mkv");
        facts.stream_tokens = vec![
            "container:matroska".into(),
            "video:h264".into(),
            "audio:aac".into(),
        ];
        let m = engine.classify(&facts).unwrap();
        assert_eq!(m.rule_id, "matroska_h264_aac_rewrap");
        assert_eq!(m.action, RuleAction::RewrapToMp4);

        // Opus audio falls through to the generic normalizer.
        facts.stream_tokens = vec![
            "container:matroska".into(),
            "video:h264".into(),
            "audio:opus".into(),
        ];
        let m = engine.classify(&facts).unwrap();
        assert_eq!(m.rule_id, "matroska_normalize");
        assert_eq!(m.action, RuleAction::RewrapOrTranscodeToMp4);
    }

    #[test]
    fn vector_formats_are_rejected() {
        let engine = RuleEngine::builtin();
        let err = engine.classify(&facts_for(".svg", ".svg")).unwrap_err();
        assert_eq!(err.skip_category(), SkipCategory::Unsupported);
        assert!(err.to_string().contains("vector"));
    }

    #[test]
    fn foveon_raw_is_rejected() {
        let engine = RuleEngine::builtin();
        let err = engine.classify(&facts_for(".x3f", ".x3f")).unwrap_err();
        assert_eq!(err.skip_category(), SkipCategory::Unsupported);
        assert!(err.to_string().contains("Foveon"));
    }

    #[test]
    fn unknown_extension_is_unrecognized() {
        let engine = RuleEngine::builtin();
        let err = engine.classify(&facts_for(".xyz", ".xyz")).unwrap_err();
        assert_eq!(err.skip_category(), SkipCategory::UnknownFormat);
        assert!(err.to_string().contains(".xyz"));
    }

    #[test]
    fn no_extension_at_all_is_unrecognized() {
        let engine = RuleEngine::builtin();
        let err = engine.classify(&facts_for("", "")).unwrap_err();
        assert!(err.to_string().contains("file without extension"));
    }

    #[test]
    fn custom_table_replaces_the_builtin_one() {
        let json = r#"[
            {
                "rule_id": "everything_png",
                "category": "image",
                "extensions": [],
                "action": "convert_to_png",
                "notes": "catch-all"
            }
        ]"#;
        let engine = RuleEngine::new(crate::deserialize_rules(json).unwrap());
        let m = engine.classify(&facts_for(".xyz", ".xyz")).unwrap();
        assert_eq!(m.rule_id, "everything_png");
        assert_eq!(m.action, RuleAction::ConvertToPng);
        // A wildcard rule has no canonical extension of its own.
        assert_eq!(m.extension, "");
    }

    #[test]
    fn camera_raw_imports() {
        let engine = RuleEngine::builtin();
        for ext in [".dng", ".cr3", ".nef", ".arw", ".raf"] {
            let m = engine.classify(&facts_for(ext, ext)).unwrap();
            assert_eq!(m.rule_id, "camera_raw_import", "{ext}");
            assert_eq!(m.category, RuleCategory::Raw);
            assert_eq!(m.extension, ext);
        }
    }

    #[test]
    fn legacy_containers_normalize() {
        let engine = RuleEngine::builtin();
        for ext in [".avi", ".wmv", ".mpg", ".3gp", ".vob"] {
            let m = engine.classify(&facts_for(ext, ext)).unwrap();
            assert_eq!(m.rule_id, "legacy_container_normalize", "{ext}");
            assert_eq!(m.action, RuleAction::RewrapOrTranscodeToMp4);
            assert_eq!(m.extension, ext);
        }

        // Content says avi, disk says something foreign: canonical spelling.
        let m = engine.classify(&facts_for(".avi", ".tmp")).unwrap();
        assert_eq!(m.extension, ".avi");
    }
}
