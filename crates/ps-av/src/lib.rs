//! # ps-av
//!
//! External tool management, stream probing, and media conversion for the
//! photostage pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   ffprobe, magick, exiftool, heif-enc, djxl, file, and binwalk.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Tool-backed detectors** ([`FileDetector`], [`BinwalkDetector`]) --
//!   implement [`ps_detect::Detector`] by shelling out to CLI tools.
//! - **Stream probing** ([`StreamProber`]) -- ffprobe JSON reduced to a
//!   [`StreamInfo`] summary, plus corruption checks ([`probe::verify_media`]).
//! - **Action functions** ([`actions`]) -- PNG/TIFF/HEIC conversion, animation
//!   encoding, MP4 rewrap and transcode, and metadata carry-over.

pub mod actions;
pub mod command;
pub mod detectors;
pub mod probe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use detectors::{BinwalkDetector, FileDetector};
pub use probe::{verify_media, StreamInfo, StreamProber};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

// Action functions
pub use actions::{
    audio_encode_args, convert_animation_to_hevc_mp4, convert_to_heic_lossless, convert_to_png,
    convert_to_tiff, copy_metadata, resolve_rewrap_or_transcode, rewrap_to_mp4,
    transcode_audio_to_aac_or_eac3, transcode_to_hevc_mp4, transcode_video_to_lossless_hevc,
    RewrapDecision,
};
