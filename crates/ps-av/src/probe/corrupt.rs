//! Fast best-effort corruption and truncation detection for video files.
//!
//! Two passes, both cheap: a structural check over the already-probed
//! [`StreamInfo`], then a strict bounded decode (`ffmpeg -xerror`, first five
//! seconds, one frame) whose stderr is scanned for decoder error markers.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::probe::types::StreamInfo;
use crate::tools::ToolRegistry;

/// Substrings in decoder stderr that mark a damaged stream.
const DECODE_ERROR_MARKERS: &[&str] = &[
    "invalid",
    "corrupt",
    "truncat",
    "error",
    "moov atom not found",
];

/// Structural reason this stream description cannot belong to a healthy
/// video, if any.
pub fn structural_problem(info: &StreamInfo) -> Option<String> {
    if info.stream_count == 0 {
        return Some("no streams found".into());
    }
    if info.video_codec.is_none() {
        return Some("no video stream found".into());
    }
    if info.container.is_none() {
        return Some("no format information".into());
    }
    match info.duration_secs {
        Some(d) if d > 0.0 => None,
        _ => Some("invalid or missing duration".into()),
    }
}

/// Decode a bounded window with strict error detection.
///
/// Corruption is reported only when the decode exits non-zero *and* stderr
/// carries a recognized marker; anything else passes, keeping the check
/// best-effort rather than a gate on decoder quirks.
pub async fn decode_check(ffmpeg: &Path, media: &Path, timeout: Duration) -> ps_core::Result<()> {
    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(["-v", "error", "-xerror", "-t", "5", "-i"]);
    cmd.arg(media.to_string_lossy().as_ref());
    cmd.args(["-vframes", "1", "-f", "null", "-"]);
    cmd.timeout(timeout);

    let output = cmd.execute_unchecked().await?;
    if !output.status.success() && !output.stderr.trim().is_empty() {
        let stderr_lower = output.stderr.to_lowercase();
        if DECODE_ERROR_MARKERS.iter().any(|m| stderr_lower.contains(m)) {
            let snippet: String = output.stderr.trim().chars().take(100).collect();
            return Err(ps_core::Error::CorruptMedia(format!(
                "video corruption detected: {snippet}"
            )));
        }
    }
    Ok(())
}

/// Run both passes. The caller already holds the probe result, so the
/// structural pass costs nothing; the decode pass is skipped when ffmpeg is
/// not installed.
pub async fn verify_media(
    tools: &ToolRegistry,
    info: &StreamInfo,
    media: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    if let Some(reason) = structural_problem(info) {
        return Err(ps_core::Error::CorruptMedia(reason));
    }
    let Ok(ffmpeg) = tools.require("ffmpeg") else {
        tracing::debug!("ffmpeg unavailable; skipping decode check");
        return Ok(());
    };
    decode_check(&ffmpeg.path, media, timeout).await
}
