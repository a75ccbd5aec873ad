//! Video normalization into the HEVC/AAC MP4 target profile.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::probe::StreamInfo;
use crate::tools::ToolRegistry;

/// How to bring a probed video into the target MP4 profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewrapDecision {
    /// Container and codecs already conform; no work needed.
    AlreadyCompatible,
    /// Streams conform but the container does not; copy everything into MP4.
    Rewrap,
    /// Video conforms but the audio codec does not; re-encode audio only.
    TranscodeAudio,
    /// Video codec does not conform; full HEVC transcode.
    TranscodeVideo,
}

/// Decide the cheapest conforming transform for a probed stream layout.
///
/// The decision is ordered by cost: stream copies are preferred over audio
/// re-encodes, and a full video transcode only happens when the video codec
/// itself is out of profile.
pub fn resolve_rewrap_or_transcode(info: &StreamInfo) -> RewrapDecision {
    if !info.video_codec_compatible() {
        return RewrapDecision::TranscodeVideo;
    }
    if !info.audio_codec_compatible_or_absent() {
        return RewrapDecision::TranscodeAudio;
    }
    if info.container_compatible() {
        RewrapDecision::AlreadyCompatible
    } else {
        RewrapDecision::Rewrap
    }
}

/// Audio arguments for a transcode, chosen from the probed layout.
///
/// Surround sources keep their channel count through E-AC-3; everything else
/// becomes stereo-friendly AAC. A source with no audio stream gets `-an` so
/// ffmpeg does not fail on the missing stream.
pub fn audio_encode_args(info: Option<&StreamInfo>) -> &'static [&'static str] {
    match info {
        Some(i) if i.audio_codec.is_none() => &["-an"],
        Some(i) if i.needs_surround_audio() => &["-c:a", "eac3", "-b:a", "768k"],
        _ => &["-c:a", "aac", "-b:a", "256k"],
    }
}

/// Stream-copy into an MP4 container.
pub async fn rewrap_to_mp4(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("rewrap {:?} -> mp4", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args([
        "-c",
        "copy",
        "-map",
        "0",
        "-map_metadata",
        "0",
        "-movflags",
        "+faststart",
    ]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Full lossless HEVC transcode with profile-conforming audio.
pub async fn transcode_to_hevc_mp4(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    info: Option<&StreamInfo>,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("transcode {:?} -> hevc mp4", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args([
        "-c:v",
        "libx265",
        "-preset",
        "slow",
        "-x265-params",
        "lossless=1",
        "-pix_fmt",
        "yuv420p10le",
    ]);
    cmd.args(audio_encode_args(info).iter().copied());
    cmd.args(["-map_metadata", "0"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Lossless HEVC transcode that passes the audio streams through untouched.
///
/// Used for mezzanine sources (ProRes and friends) where the audio is already
/// an archival-quality track worth keeping bit-exact.
pub async fn transcode_video_to_lossless_hevc(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("transcode video {:?} -> lossless hevc", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args([
        "-c:v",
        "libx265",
        "-preset",
        "slow",
        "-x265-params",
        "lossless=1",
        "-pix_fmt",
        "yuv420p10le",
        "-c:a",
        "copy",
        "-map_metadata",
        "0",
    ]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Keep the video stream, re-encode audio into the target profile.
pub async fn transcode_audio_to_aac_or_eac3(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    info: Option<&StreamInfo>,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("transcode audio {:?}", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args(["-c:v", "copy"]);
    cmd.args(audio_encode_args(info).iter().copied());
    cmd.args(["-map_metadata", "0"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}
