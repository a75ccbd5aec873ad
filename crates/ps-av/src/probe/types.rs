//! Stream description produced by the prober, plus the compatibility sets
//! the conversion pipeline consults when deciding whether a video needs work.

use serde::Serialize;

/// Container names the target library ingests without a rewrap.
pub const COMPATIBLE_CONTAINERS: &[&str] = &["mp4", "mov", "quicktime", "m4v"];

/// Video codecs the target library plays natively.
pub const COMPATIBLE_VIDEO_CODECS: &[&str] = &["h264", "hevc", "avc1", "h265"];

/// Audio codecs the target library plays natively.
pub const COMPATIBLE_AUDIO_CODECS: &[&str] = &[
    "aac",
    "mp3",
    "alac",
    "pcm_s16le",
    "pcm_s24le",
    "pcm_s16be",
    "pcm_f32le",
    "ac3",
    "eac3",
];

/// Parsed stream description for a video file.
///
/// `container` is the first token of ffprobe's comma-separated `format_name`
/// (`"mov,mp4,m4a,3gp,3g2,mj2"` becomes `"mov"`), lowercased. Codec names are
/// lowercased as reported. Only the first video and first audio stream are
/// recorded; that is all the compatibility decisions look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamInfo {
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub audio_channels: Option<u32>,
    pub audio_layout: Option<String>,
    /// Container-level duration in seconds, when ffprobe reports one.
    pub duration_secs: Option<f64>,
    /// Total number of streams of any type.
    pub stream_count: usize,
}

impl StreamInfo {
    pub fn container_compatible(&self) -> bool {
        self.container
            .as_deref()
            .is_some_and(|c| COMPATIBLE_CONTAINERS.contains(&c))
    }

    pub fn video_codec_compatible(&self) -> bool {
        self.video_codec
            .as_deref()
            .is_some_and(|c| COMPATIBLE_VIDEO_CODECS.contains(&c))
    }

    /// True when there is no audio stream at all, or its codec is playable.
    pub fn audio_codec_compatible_or_absent(&self) -> bool {
        match self.audio_codec.as_deref() {
            None => true,
            Some(c) => COMPATIBLE_AUDIO_CODECS.contains(&c),
        }
    }

    /// Surround sources keep their channel count through E-AC-3 instead of
    /// collapsing into stereo AAC.
    pub fn needs_surround_audio(&self) -> bool {
        if self.audio_channels.is_some_and(|c| c >= 6) {
            return true;
        }
        self.audio_layout
            .as_deref()
            .map(|l| l.to_ascii_lowercase())
            .is_some_and(|l| l.contains("5.1") || l.contains("7.1"))
    }

    /// `container:x` / `video:y` / `audio:z` tokens for rule matching, in
    /// that order, omitting absent fields.
    pub fn rule_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(container) = &self.container {
            tokens.push(format!("container:{container}"));
        }
        if let Some(codec) = &self.video_codec {
            tokens.push(format!("video:{codec}"));
        }
        if let Some(codec) = &self.audio_codec {
            tokens.push(format!("audio:{codec}"));
        }
        tokens
    }
}
