//! Per-file classification: detector votes, consensus, stream probing,
//! content flags, and the rule-table verdict, producing one [`MediaFile`]
//! per accepted file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use ps_av::{BinwalkDetector, FileDetector, StreamInfo, StreamProber, ToolRegistry};
use ps_core::config::Config;
use ps_core::{Error, MediaFile, MediaKind, Result};
use ps_detect::{consensus, content, normalize_extension, SignatureCollector};
use ps_rules::{FileFacts, RuleEngine};

/// Everything needed to classify one file, built once per run.
pub struct Classifier {
    collector: SignatureCollector,
    prober: Option<StreamProber>,
    engine: RuleEngine,
    tools: ToolRegistry,
    probe_timeout: Duration,
}

impl Classifier {
    /// Wire the collector, prober, and rule engine together.
    ///
    /// Subprocess detectors join the collector only when their tools were
    /// discovered; a missing ffprobe leaves videos unprobed rather than
    /// failing the run.
    pub fn new(config: &Config, tools: &ToolRegistry, engine: RuleEngine) -> Self {
        let detect_timeout = Duration::from_secs(config.timeouts.detect_secs);
        let probe_timeout = Duration::from_secs(config.timeouts.probe_secs);

        let mut collector = SignatureCollector::builtin();
        if let Some(detector) = FileDetector::from_registry(tools, detect_timeout) {
            collector.push(Box::new(detector));
        }
        if let Some(detector) = BinwalkDetector::from_registry(tools, detect_timeout) {
            collector.push(Box::new(detector));
        }
        tracing::debug!("Classifier running {} detectors", collector.len());

        let prober = StreamProber::from_registry(tools, probe_timeout).ok();
        if prober.is_none() {
            tracing::debug!("ffprobe unavailable; videos will match without stream tokens");
        }

        Self {
            collector,
            prober,
            engine,
            tools: tools.clone(),
            probe_timeout,
        }
    }

    /// Extensions of every rule in the table, lowercased without dots.
    ///
    /// The scanner exempts these from its text heuristic so text-bodied
    /// formats the table knows (SVG) still reach the rule engine.
    pub fn rule_extensions(&self) -> BTreeSet<String> {
        self.engine
            .rules()
            .iter()
            .flat_map(|rule| rule.extensions.iter())
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Classify one file into a [`MediaFile`], or reject it.
    ///
    /// Rejections carry the skip-log reason: no consensus, non-media kind,
    /// unreadable or corrupt video, no matching rule, or a skip rule.
    pub async fn classify(&self, path: &Path) -> Result<MediaFile> {
        let votes = self.collector.collect(path).await;
        let consensus = consensus::resolve(&votes)?;
        tracing::debug!(
            "Consensus for {:?}: {} ({})",
            path,
            consensus.format_name(),
            consensus.kind
        );

        let mut facts = FileFacts::default();
        for vote in &votes {
            facts.record_vote(vote);
        }
        facts.size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        facts.original_extension = original_extension(path);
        facts.extension_candidates =
            extension_candidates(consensus.extension(), &facts.original_extension);

        let mut info: Option<StreamInfo> = None;
        match consensus.kind {
            MediaKind::Image => match content::scan_flags(path) {
                Ok(flags) => {
                    facts.animated = flags.animated;
                    facts.color_mode = flags.color_mode;
                }
                Err(e) => {
                    tracing::debug!("Content flag scan failed for {:?}: {}", path, e);
                }
            },
            MediaKind::Video => {
                info = self.probe_video(path).await?;
                if let Some(stream_info) = &info {
                    facts.stream_tokens = stream_info.rule_tokens();
                    ps_av::verify_media(&self.tools, stream_info, path, self.probe_timeout)
                        .await?;
                }
            }
            MediaKind::Raw => {
                // Best effort; many raw formats are opaque to ffprobe.
                if let Some(prober) = &self.prober {
                    if let Ok(stream_info) = prober.probe(path).await {
                        facts.stream_tokens = stream_info.rule_tokens();
                        info = Some(stream_info);
                    }
                }
            }
            // resolve() already rejected audio and non-media kinds.
            MediaKind::Audio => {}
        }

        let matched = self.engine.classify(&facts)?;
        tracing::debug!(
            "Matched rule {} ({}) for {:?}",
            matched.rule_id,
            matched.action,
            path
        );

        let requires_processing = matched.action.requires_processing();
        let mut metadata = BTreeMap::new();
        if let Some(mime) = consensus.mime() {
            metadata.insert("mime".to_string(), mime);
        }
        if facts.animated {
            metadata.insert("animated".to_string(), "true".to_string());
        }
        if let Some(mode) = &facts.color_mode {
            metadata.insert("color_mode".to_string(), mode.clone());
        }
        if let Some(container) = info.as_ref().and_then(|i| i.container.clone()) {
            metadata.insert("container".to_string(), container);
        }

        Ok(MediaFile {
            source_path: path.to_path_buf(),
            kind: matched.category.media_kind(),
            extension: matched.extension.clone(),
            format_name: consensus.format_name(),
            stage_path: None,
            compatible: !requires_processing,
            video_codec: info.as_ref().and_then(|i| i.video_codec.clone()),
            audio_codec: info.as_ref().and_then(|i| i.audio_codec.clone()),
            original_extension: facts.original_extension.clone(),
            rule_id: matched.rule_id,
            action: matched.action,
            requires_processing,
            notes: matched.notes,
            metadata,
        })
    }

    /// Probe a video file. An unreadable container is corrupt media; a
    /// missing ffprobe just leaves the file unprobed.
    async fn probe_video(&self, path: &Path) -> Result<Option<StreamInfo>> {
        let Some(prober) = &self.prober else {
            return Ok(None);
        };
        match prober.probe(path).await {
            Ok(info) => Ok(Some(info)),
            Err(Error::Probe(message)) => Err(Error::CorruptMedia(message)),
            Err(e) => Err(e),
        }
    }
}

/// Candidates in priority order: consensus extension, on-disk extension,
/// then the empty string for extension-agnostic rules. Duplicates fold.
fn extension_candidates(consensus_ext: Option<String>, original: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(ext) = consensus_ext {
        candidates.push(ext);
    }
    if !original.is_empty() && !candidates.iter().any(|c| c == original) {
        candidates.push(original.to_string());
    }
    candidates.push(String::new());
    candidates
}

/// The extension the file carries on disk, normalized with a leading dot.
fn original_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::RuleAction;
    use std::fs;
    use tempfile::tempdir;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    /// A classifier over only the built-in detectors, so tests never shell
    /// out to installed tools.
    fn builtin_classifier() -> Classifier {
        let config = Config::default();
        let tools = ToolRegistry::from_paths(std::iter::empty());
        Classifier::new(&config, &tools, RuleEngine::builtin())
    }

    #[test]
    fn candidate_order_and_dedup() {
        assert_eq!(
            extension_candidates(Some(".jpg".into()), ".tiff"),
            vec![".jpg".to_string(), ".tiff".to_string(), String::new()]
        );
        assert_eq!(
            extension_candidates(Some(".png".into()), ".png"),
            vec![".png".to_string(), String::new()]
        );
        assert_eq!(
            extension_candidates(None, ""),
            vec![String::new()]
        );
    }

    #[test]
    fn rule_extensions_are_dotless_and_lowercase() {
        let classifier = builtin_classifier();
        let exts = classifier.rule_extensions();
        assert!(exts.contains("jpg"));
        assert!(exts.contains("svg"));
        assert!(exts.contains("mkv"));
        assert!(!exts.contains(".jpg"));
    }

    #[tokio::test]
    async fn jpeg_with_wrong_extension_is_reclassified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.tiff");
        let mut data = JPEG_MAGIC.to_vec();
        data.extend_from_slice(&[0x00, 0x10, b'J', b'F', b'I', b'F', 0x00]);
        fs::write(&path, &data).unwrap();

        let media = builtin_classifier().classify(&path).await.unwrap();
        assert_eq!(media.extension, ".jpg");
        assert_eq!(media.original_extension, ".tiff");
        assert_eq!(media.action, RuleAction::Import);
        assert!(media.compatible);
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.rule_id, "jpeg_import");
    }

    #[tokio::test]
    async fn still_png_imports_directly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0, 0, 0, 13]);
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&[0; 17]);
        fs::write(&path, &data).unwrap();

        let media = builtin_classifier().classify(&path).await.unwrap();
        assert_eq!(media.rule_id, "png_import");
        assert!(!media.requires_processing);
        assert!(media.metadata.contains_key("mime"));
    }

    #[tokio::test]
    async fn animated_png_needs_conversion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.png");
        let mut data = PNG_MAGIC.to_vec();
        // acTL ahead of IDAT marks an APNG.
        data.extend_from_slice(&[0, 0, 0, 8]);
        data.extend_from_slice(b"acTL");
        data.extend_from_slice(&[0; 12]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"IDAT");
        fs::write(&path, &data).unwrap();

        let media = builtin_classifier().classify(&path).await.unwrap();
        assert_eq!(media.rule_id, "apng_to_hevc_video");
        assert_eq!(media.action, RuleAction::ConvertAnimationToHevcMp4);
        assert!(media.requires_processing);
        assert!(!media.compatible);
        // Still an image until the conversion flips it.
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.metadata.get("animated").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn garbage_has_no_consensus() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        fs::write(&path, [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]).unwrap();

        let err = builtin_classifier().classify(&path).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NoConsensus(_) | Error::UnrecognizedFormat(_)
        ));
    }

    #[tokio::test]
    async fn video_without_ffprobe_still_classifies_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mkv");
        // EBML magic marks Matroska.
        let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
        data.extend_from_slice(&[0x93, 0x42, 0x82, 0x88]);
        data.extend_from_slice(b"matroska");
        fs::write(&path, &data).unwrap();

        let media = builtin_classifier().classify(&path).await.unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.rule_id, "matroska_normalize");
        assert_eq!(media.action, RuleAction::RewrapOrTranscodeToMp4);
        assert!(media.video_codec.is_none());
    }
}
