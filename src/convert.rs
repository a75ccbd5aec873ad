//! Fail-fast execution of the conversion action a rule prescribed.
//!
//! Every transform reads the staged file and writes a freshly named target
//! in the same directory. Only after the transform (and metadata copy)
//! succeeds is the old stage file deleted and the [`MediaFile`] record
//! rewritten; on failure the partial target is removed and the staged
//! original is left byte-for-byte untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ps_av::actions::{
    self, audio_encode_args, resolve_rewrap_or_transcode, RewrapDecision,
};
use ps_av::{StreamInfo, StreamProber, ToolRegistry};
use ps_core::config::Config;
use ps_core::{Error, MediaFile, MediaKind, Result, RuleAction};

use crate::staging;

/// Runs one external transform per incompatible [`MediaFile`].
pub struct ConversionPipeline {
    tools: ToolRegistry,
    convert_timeout: Duration,
    probe_timeout: Duration,
}

impl ConversionPipeline {
    pub fn new(config: &Config, tools: &ToolRegistry) -> Self {
        Self {
            tools: tools.clone(),
            convert_timeout: Duration::from_secs(config.timeouts.convert_secs),
            probe_timeout: Duration::from_secs(config.timeouts.probe_secs),
        }
    }

    /// Execute the file's pending action in place in the staging directory.
    ///
    /// No-op for files that are already compatible. On success the record
    /// points at the new file; on failure it still points at the untouched
    /// staged original and the error carries the tool diagnostic.
    pub async fn process(&self, media: &mut MediaFile) -> Result<()> {
        if !media.requires_processing || !media.action.requires_processing() {
            media.compatible = true;
            return Ok(());
        }

        let stage_path = media
            .stage_path
            .clone()
            .ok_or_else(|| Error::staging("cannot convert a file that was never staged"))?;
        let stage_dir = stage_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::staging("staged file has no parent directory"))?;
        let stem = stage_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("converted")
            .to_string();

        // rewrap_or_transcode decides from the probed streams; everything
        // else is fixed by the action itself.
        let plan = match media.action {
            RuleAction::RewrapOrTranscodeToMp4 => {
                let info = self.probe_staged(&stage_path, media.action).await?;
                match resolve_rewrap_or_transcode(&info) {
                    RewrapDecision::AlreadyCompatible => {
                        tracing::info!(
                            "Streams in {:?} are already compatible; keeping as-is",
                            stage_path
                        );
                        media.compatible = true;
                        media.requires_processing = false;
                        media.format_name = "MP4 video".to_string();
                        return Ok(());
                    }
                    RewrapDecision::Rewrap => Plan::rewrap(None),
                    RewrapDecision::TranscodeAudio => Plan::transcode_audio(Some(info)),
                    RewrapDecision::TranscodeVideo => Plan::transcode_video(Some(info)),
                }
            }
            RuleAction::RewrapToMp4 => Plan::rewrap(None),
            RuleAction::TranscodeToHevcMp4 => {
                let info = self.probe_staged(&stage_path, media.action).await.ok();
                Plan::transcode_video(info)
            }
            RuleAction::TranscodeAudioToAacOrEac3 => {
                let info = self.probe_staged(&stage_path, media.action).await.ok();
                Plan::transcode_audio(info)
            }
            RuleAction::TranscodeVideoToLosslessHevc => Plan {
                kind: PlanKind::TranscodeVideoKeepAudio,
                info: None,
            },
            RuleAction::ConvertToPng => Plan::simple(PlanKind::ToPng),
            RuleAction::ConvertToTiff => Plan::simple(PlanKind::ToTiff),
            RuleAction::ConvertToHeicLossless => Plan::simple(PlanKind::ToHeic),
            RuleAction::ConvertAnimationToHevcMp4 => Plan::simple(PlanKind::AnimationToMp4),
            RuleAction::Import
            | RuleAction::SkipVector
            | RuleAction::SkipUnknownVideo
            | RuleAction::SkipUnsupportedColorMode
            | RuleAction::SkipUnsupportedRaw => {
                // Filtered out by the requires_processing gate above.
                media.compatible = true;
                return Ok(());
            }
        };

        let target = staging::unique_path(&stage_dir, &stem, plan.target_extension());
        tracing::info!(
            "Converting {:?} -> {:?} ({})",
            stage_path,
            target,
            media.action
        );

        if let Err(e) = self.run_transform(&plan, &stage_path, &target).await {
            remove_partial_target(&target);
            return Err(Error::transform(media.action, e.to_string()));
        }
        // The staged original is only released once real output exists.
        if !target.exists() {
            return Err(Error::transform(
                media.action,
                format!("tool exited cleanly but wrote no output at {}", target.display()),
            ));
        }

        // Metadata travels separately; losing tags is not worth losing the file.
        if let Err(e) = actions::copy_metadata(
            &self.tools,
            &stage_path,
            &target,
            self.convert_timeout,
        )
        .await
        {
            tracing::debug!("Metadata copy {:?} -> {:?} failed: {}", stage_path, target, e);
        }

        std::fs::remove_file(&stage_path).map_err(|e| {
            Error::staging(format!(
                "converted output ready but cannot remove {}: {e}",
                stage_path.display()
            ))
        })?;

        plan.apply(media, target);
        Ok(())
    }

    async fn run_transform(&self, plan: &Plan, input: &Path, output: &Path) -> Result<()> {
        let timeout = self.convert_timeout;
        match plan.kind {
            PlanKind::ToPng => actions::convert_to_png(&self.tools, input, output, timeout).await,
            PlanKind::ToTiff => actions::convert_to_tiff(&self.tools, input, output, timeout).await,
            PlanKind::ToHeic => {
                actions::convert_to_heic_lossless(&self.tools, input, output, timeout).await
            }
            PlanKind::AnimationToMp4 => {
                actions::convert_animation_to_hevc_mp4(&self.tools, input, output, timeout).await
            }
            PlanKind::Rewrap => actions::rewrap_to_mp4(&self.tools, input, output, timeout).await,
            PlanKind::TranscodeVideo => {
                actions::transcode_to_hevc_mp4(
                    &self.tools,
                    input,
                    output,
                    plan.info.as_ref(),
                    timeout,
                )
                .await
            }
            PlanKind::TranscodeVideoKeepAudio => {
                actions::transcode_video_to_lossless_hevc(&self.tools, input, output, timeout)
                    .await
            }
            PlanKind::TranscodeAudio => {
                actions::transcode_audio_to_aac_or_eac3(
                    &self.tools,
                    input,
                    output,
                    plan.info.as_ref(),
                    timeout,
                )
                .await
            }
        }
    }

    /// Probe the staged copy; the decision-bearing actions need fresh
    /// stream data for the file as it sits in staging.
    async fn probe_staged(&self, path: &Path, action: RuleAction) -> Result<StreamInfo> {
        let prober = StreamProber::from_registry(&self.tools, self.probe_timeout)
            .map_err(|e| Error::transform(action, e.to_string()))?;
        prober
            .probe(path)
            .await
            .map_err(|e| Error::transform(action, e.to_string()))
    }
}

/// What to run and which stream data to feed it.
struct Plan {
    kind: PlanKind,
    info: Option<StreamInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanKind {
    ToPng,
    ToTiff,
    ToHeic,
    AnimationToMp4,
    Rewrap,
    TranscodeVideo,
    TranscodeVideoKeepAudio,
    TranscodeAudio,
}

impl Plan {
    fn simple(kind: PlanKind) -> Self {
        Self { kind, info: None }
    }

    fn rewrap(info: Option<StreamInfo>) -> Self {
        Self {
            kind: PlanKind::Rewrap,
            info,
        }
    }

    fn transcode_video(info: Option<StreamInfo>) -> Self {
        Self {
            kind: PlanKind::TranscodeVideo,
            info,
        }
    }

    fn transcode_audio(info: Option<StreamInfo>) -> Self {
        Self {
            kind: PlanKind::TranscodeAudio,
            info,
        }
    }

    fn target_extension(&self) -> &'static str {
        match self.kind {
            PlanKind::ToPng => ".png",
            PlanKind::ToTiff => ".tiff",
            PlanKind::ToHeic => ".heic",
            PlanKind::AnimationToMp4
            | PlanKind::Rewrap
            | PlanKind::TranscodeVideo
            | PlanKind::TranscodeVideoKeepAudio
            | PlanKind::TranscodeAudio => ".mp4",
        }
    }

    /// Rewrite the record for the new file: path, extension, format name,
    /// codec fields, and the compatibility flags.
    fn apply(&self, media: &mut MediaFile, target: PathBuf) {
        media.stage_path = Some(target);
        media.extension = self.target_extension().to_string();
        media.compatible = true;
        media.requires_processing = false;

        match self.kind {
            PlanKind::ToPng => {
                media.format_name = "PNG image".to_string();
            }
            PlanKind::ToTiff => {
                media.format_name = "TIFF image".to_string();
            }
            PlanKind::ToHeic => {
                media.format_name = "HEIC image".to_string();
            }
            PlanKind::AnimationToMp4 => {
                media.format_name = "HEVC MP4 video".to_string();
                media.kind = MediaKind::Video;
                media.video_codec = Some("hevc".to_string());
                // The animation transform drops audio outright.
                media.audio_codec = None;
            }
            PlanKind::Rewrap => {
                // Stream copy; codecs carry over unchanged.
                media.format_name = "MP4 video".to_string();
            }
            PlanKind::TranscodeVideo => {
                media.format_name = "HEVC MP4 video".to_string();
                media.video_codec = Some("hevc".to_string());
                media.audio_codec = encoded_audio_codec(self.info.as_ref());
            }
            PlanKind::TranscodeVideoKeepAudio => {
                media.format_name = "HEVC MP4 video".to_string();
                media.video_codec = Some("hevc".to_string());
            }
            PlanKind::TranscodeAudio => {
                media.format_name = "MP4 video".to_string();
                media.audio_codec = encoded_audio_codec(self.info.as_ref());
            }
        }
    }
}

/// The audio codec the encode args produce, mirroring the channel-layout
/// policy; `None` when the source had no audio stream.
fn encoded_audio_codec(info: Option<&StreamInfo>) -> Option<String> {
    match audio_encode_args(info) {
        ["-an"] => None,
        args if args.contains(&"eac3") => Some("eac3".to_string()),
        _ => Some("aac".to_string()),
    }
}

fn remove_partial_target(target: &Path) {
    match std::fs::remove_file(target) {
        Ok(()) => tracing::debug!("Removed partial output {:?}", target),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Cannot remove partial output {:?}: {}", target, e),
    }
}
