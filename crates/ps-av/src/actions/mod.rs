//! Conversion actions, one async function per external-tool transform.
//!
//! Every action takes the tool registry, input and output paths, and a
//! timeout, and reports failure through [`ps_core::Error::Tool`]. Output
//! targets are always distinct paths; actions never modify their input.

mod image;
mod metadata;
mod video;

pub use image::{
    convert_animation_to_hevc_mp4, convert_to_heic_lossless, convert_to_png, convert_to_tiff,
};
pub use metadata::copy_metadata;
pub use video::{
    audio_encode_args, resolve_rewrap_or_transcode, rewrap_to_mp4, transcode_audio_to_aac_or_eac3,
    transcode_to_hevc_mp4, transcode_video_to_lossless_hevc, RewrapDecision,
};
