//! Media-domain types: kinds, rule categories, actions, and the per-file
//! [`MediaFile`] record threaded through the pipeline.
//!
//! All enums serialize in snake_case/lowercase and implement `Display`
//! manually for consistent string representation in logs and manifests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Broad classification of a file's content.
///
/// Detectors may vote `audio`, but only `image`, `video`, and `raw` files
/// proceed past consensus; audio-kind files are rejected as non-media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Raw,
}

impl MediaKind {
    /// Whether files of this kind are importable media at all.
    pub fn is_importable(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Raw)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleCategory
// ---------------------------------------------------------------------------

/// Category a compatibility rule files its matches under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Image,
    Video,
    Raw,
    Vector,
}

impl RuleCategory {
    /// The media kind staged files of this category carry.
    ///
    /// Vector has no importable kind; callers reject those before asking.
    pub fn media_kind(self) -> MediaKind {
        match self {
            Self::Image | Self::Vector => MediaKind::Image,
            Self::Video => MediaKind::Video,
            Self::Raw => MediaKind::Raw,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Raw => write!(f, "raw"),
            Self::Vector => write!(f, "vector"),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleAction
// ---------------------------------------------------------------------------

/// Action a matched compatibility rule prescribes.
///
/// `skip_*` variants reject the file; `import` accepts it as-is; all other
/// variants name exactly one external transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Import,
    ConvertToPng,
    ConvertToTiff,
    ConvertToHeicLossless,
    ConvertAnimationToHevcMp4,
    RewrapToMp4,
    RewrapOrTranscodeToMp4,
    TranscodeToHevcMp4,
    TranscodeVideoToLosslessHevc,
    TranscodeAudioToAacOrEac3,
    SkipVector,
    SkipUnknownVideo,
    SkipUnsupportedColorMode,
    SkipUnsupportedRaw,
}

impl RuleAction {
    /// Whether this action rejects the file instead of staging it.
    pub fn is_skip(self) -> bool {
        matches!(
            self,
            Self::SkipVector
                | Self::SkipUnknownVideo
                | Self::SkipUnsupportedColorMode
                | Self::SkipUnsupportedRaw
        )
    }

    /// Whether this action requires a conversion transform after staging.
    pub fn requires_processing(self) -> bool {
        !self.is_skip() && self != Self::Import
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Import => "import",
            Self::ConvertToPng => "convert_to_png",
            Self::ConvertToTiff => "convert_to_tiff",
            Self::ConvertToHeicLossless => "convert_to_heic_lossless",
            Self::ConvertAnimationToHevcMp4 => "convert_animation_to_hevc_mp4",
            Self::RewrapToMp4 => "rewrap_to_mp4",
            Self::RewrapOrTranscodeToMp4 => "rewrap_or_transcode_to_mp4",
            Self::TranscodeToHevcMp4 => "transcode_to_hevc_mp4",
            Self::TranscodeVideoToLosslessHevc => "transcode_video_to_lossless_hevc",
            Self::TranscodeAudioToAacOrEac3 => "transcode_audio_to_aac_or_eac3",
            Self::SkipVector => "skip_vector",
            Self::SkipUnknownVideo => "skip_unknown_video",
            Self::SkipUnsupportedColorMode => "skip_unsupported_color_mode",
            Self::SkipUnsupportedRaw => "skip_unsupported_raw",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// MediaFile
// ---------------------------------------------------------------------------

/// The mutable per-file record threaded through the pipeline.
///
/// Created by the rule engine for every accepted file; `stage_path` is set
/// by staging; extension/format/codec/compatibility fields are rewritten by
/// the conversion pipeline on success. Exactly one `MediaFile` exists per
/// file per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Where the file was found during the scan.
    pub source_path: PathBuf,
    /// Resolved media kind (may flip to video when an animation converts).
    pub kind: MediaKind,
    /// Current extension with leading dot (e.g. ".jpg").
    pub extension: String,
    /// Human-readable format name from the consensus vote.
    pub format_name: String,
    /// Location inside the run's staging directory, once staged.
    pub stage_path: Option<PathBuf>,
    /// Whether the file is importable as-is.
    pub compatible: bool,
    /// Video codec name when probed (videos and some raws).
    pub video_codec: Option<String>,
    /// Audio codec name when probed.
    pub audio_codec: Option<String>,
    /// Extension the file carried when scanned.
    pub original_extension: String,
    /// Identifier of the matched compatibility rule.
    pub rule_id: String,
    /// Action prescribed by the matched rule.
    pub action: RuleAction,
    /// Whether a conversion transform is still pending.
    pub requires_processing: bool,
    /// The matched rule's notes, carried into logs and the manifest.
    pub notes: String,
    /// Free-form annotations added along the pipeline.
    pub metadata: BTreeMap<String, String>,
}

impl MediaFile {
    /// The path the file currently lives at: staged location if set,
    /// otherwise the original source path.
    pub fn current_path(&self) -> &Path {
        self.stage_path.as_deref().unwrap_or(&self.source_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_display_and_serde() {
        assert_eq!(MediaKind::Image.to_string(), "image");
        assert_eq!(MediaKind::Raw.to_string(), "raw");
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, r#""video""#);
        let back: MediaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MediaKind::Video);
    }

    #[test]
    fn audio_is_not_importable() {
        assert!(MediaKind::Image.is_importable());
        assert!(MediaKind::Video.is_importable());
        assert!(MediaKind::Raw.is_importable());
        assert!(!MediaKind::Audio.is_importable());
    }

    #[test]
    fn category_media_kind() {
        assert_eq!(RuleCategory::Image.media_kind(), MediaKind::Image);
        assert_eq!(RuleCategory::Video.media_kind(), MediaKind::Video);
        assert_eq!(RuleCategory::Raw.media_kind(), MediaKind::Raw);
    }

    #[test]
    fn action_serde_snake_case() {
        let json = serde_json::to_string(&RuleAction::RewrapOrTranscodeToMp4).unwrap();
        assert_eq!(json, r#""rewrap_or_transcode_to_mp4""#);
        let back: RuleAction = serde_json::from_str(r#""convert_to_heic_lossless""#).unwrap();
        assert_eq!(back, RuleAction::ConvertToHeicLossless);
    }

    #[test]
    fn action_display_matches_serde() {
        for action in [
            RuleAction::Import,
            RuleAction::ConvertToPng,
            RuleAction::TranscodeAudioToAacOrEac3,
            RuleAction::SkipUnsupportedColorMode,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{action}\""));
        }
    }

    #[test]
    fn skip_actions_are_skips() {
        assert!(RuleAction::SkipVector.is_skip());
        assert!(RuleAction::SkipUnknownVideo.is_skip());
        assert!(RuleAction::SkipUnsupportedColorMode.is_skip());
        assert!(RuleAction::SkipUnsupportedRaw.is_skip());
        assert!(!RuleAction::Import.is_skip());
        assert!(!RuleAction::RewrapToMp4.is_skip());
    }

    #[test]
    fn import_needs_no_processing() {
        assert!(!RuleAction::Import.requires_processing());
        assert!(RuleAction::ConvertToPng.requires_processing());
        assert!(RuleAction::RewrapOrTranscodeToMp4.requires_processing());
        assert!(!RuleAction::SkipVector.requires_processing());
    }

    #[test]
    fn media_file_current_path() {
        let mut file = MediaFile {
            source_path: PathBuf::from("/scan/a.jpg"),
            kind: MediaKind::Image,
            extension: ".jpg".into(),
            format_name: "JPEG image".into(),
            stage_path: None,
            compatible: true,
            video_codec: None,
            audio_codec: None,
            original_extension: ".jpg".into(),
            rule_id: "jpeg_import".into(),
            action: RuleAction::Import,
            requires_processing: false,
            notes: String::new(),
            metadata: BTreeMap::new(),
        };
        assert_eq!(file.current_path(), Path::new("/scan/a.jpg"));
        file.stage_path = Some(PathBuf::from("/stage/a.jpg"));
        assert_eq!(file.current_path(), Path::new("/stage/a.jpg"));
    }

    #[test]
    fn media_file_serde_roundtrip() {
        let file = MediaFile {
            source_path: PathBuf::from("/scan/clip.mkv"),
            kind: MediaKind::Video,
            extension: ".mkv".into(),
            format_name: "Matroska".into(),
            stage_path: Some(PathBuf::from("/stage/clip.mkv")),
            compatible: false,
            video_codec: Some("h264".into()),
            audio_codec: Some("aac".into()),
            original_extension: ".mkv".into(),
            rule_id: "matroska_h264_aac_rewrap".into(),
            action: RuleAction::RewrapToMp4,
            requires_processing: true,
            notes: "compatible codecs in a foreign container".into(),
            metadata: BTreeMap::new(),
        };
        let json = serde_json::to_string(&file).unwrap();
        let back: MediaFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rule_id, "matroska_h264_aac_rewrap");
        assert_eq!(back.action, RuleAction::RewrapToMp4);
        assert_eq!(back.video_codec.as_deref(), Some("h264"));
    }
}
