//! FFprobe-backed stream prober.
//!
//! Shells out to `ffprobe -v error -print_format json -show_streams
//! -show_format` and reduces the JSON to a [`StreamInfo`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::command::ToolCommand;
use crate::probe::types::StreamInfo;
use crate::tools::ToolRegistry;

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct StreamProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl StreamProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Build from a discovered registry; errors when ffprobe is missing.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> ps_core::Result<Self> {
        let cfg = tools.require("ffprobe")?;
        Ok(Self::new(cfg.path.clone(), timeout))
    }

    /// Probe the file, returning parsed stream data or
    /// [`ps_core::Error::Probe`] when ffprobe cannot read it.
    pub async fn probe(&self, path: &Path) -> ps_core::Result<StreamInfo> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(self.timeout);

        let output = cmd.execute_unchecked().await?;
        if !output.status.success() {
            return Err(ps_core::Error::Probe(format!(
                "ffprobe cannot read {}: {}",
                path.display(),
                output.stderr.trim()
            )));
        }
        parse_ffprobe_json(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_json(json: &str) -> ps_core::Result<StreamInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ps_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;
    Ok(reduce(output))
}

/// Keep the first video and first audio stream; everything else only counts
/// toward `stream_count`.
fn reduce(output: FfprobeOutput) -> StreamInfo {
    let mut info = StreamInfo {
        stream_count: output.streams.len(),
        ..StreamInfo::default()
    };

    if let Some(format) = output.format {
        info.container = format.format_name.as_deref().and_then(extract_container);
        info.duration_secs = format.duration.and_then(|s| s.parse::<f64>().ok());
    }

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") if info.video_codec.is_none() => {
                info.video_codec = normalize_codec(stream.codec_name);
            }
            Some("audio") if info.audio_codec.is_none() => {
                info.audio_codec = normalize_codec(stream.codec_name);
                info.audio_channels = stream.channels;
                info.audio_layout = stream.channel_layout;
            }
            _ => {}
        }
    }

    info
}

/// First token of ffprobe's comma-separated `format_name`.
fn extract_container(format_name: &str) -> Option<String> {
    let first = format_name.split(',').next()?.trim().to_ascii_lowercase();
    (!first.is_empty()).then_some(first)
}

fn normalize_codec(name: Option<String>) -> Option<String> {
    let lowered = name?.trim().to_ascii_lowercase();
    (!lowered.is_empty()).then_some(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_extraction() {
        assert_eq!(
            extract_container("mov,mp4,m4a,3gp,3g2,mj2").as_deref(),
            Some("mov")
        );
        assert_eq!(
            extract_container("matroska,webm").as_deref(),
            Some("matroska")
        );
        assert_eq!(extract_container(""), None);
    }

    #[test]
    fn parse_matroska_with_surround_audio() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "H264"},
                {"codec_type": "audio", "codec_name": "ac3", "channels": 6, "channel_layout": "5.1(side)"},
                {"codec_type": "subtitle", "codec_name": "subrip"}
            ],
            "format": {"format_name": "matroska,webm", "duration": "4242.5"}
        }"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.container.as_deref(), Some("matroska"));
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert_eq!(info.audio_codec.as_deref(), Some("ac3"));
        assert_eq!(info.audio_channels, Some(6));
        assert_eq!(info.audio_layout.as_deref(), Some("5.1(side)"));
        assert_eq!(info.stream_count, 3);
        assert_eq!(info.duration_secs, Some(4242.5));
        assert!(info.needs_surround_audio());
    }

    #[test]
    fn parse_silent_mp4() {
        let json = r#"{
            "streams": [{"codec_type": "video", "codec_name": "hevc"}],
            "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "3.2"}
        }"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.container.as_deref(), Some("mov"));
        assert_eq!(info.video_codec.as_deref(), Some("hevc"));
        assert!(info.audio_codec.is_none());
        assert!(info.audio_codec_compatible_or_absent());
    }

    #[test]
    fn parse_empty_object_has_no_streams() {
        let info = parse_ffprobe_json("{}").unwrap();
        assert_eq!(info.stream_count, 0);
        assert!(info.container.is_none());
        assert!(info.duration_secs.is_none());
    }

    #[test]
    fn invalid_json_is_a_probe_error() {
        let err = parse_ffprobe_json("not json").unwrap_err();
        assert!(matches!(err, ps_core::Error::Probe(_)));
    }

    #[test]
    fn only_first_streams_are_kept() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac", "channels": 2, "channel_layout": "stereo"},
                {"codec_type": "audio", "codec_name": "dts", "channels": 8, "channel_layout": "7.1"},
                {"codec_type": "video", "codec_name": "h264"},
                {"codec_type": "video", "codec_name": "mjpeg"}
            ],
            "format": {"format_name": "matroska,webm"}
        }"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert_eq!(info.audio_codec.as_deref(), Some("aac"));
        assert_eq!(info.audio_channels, Some(2));
        assert_eq!(info.stream_count, 4);
    }
}
