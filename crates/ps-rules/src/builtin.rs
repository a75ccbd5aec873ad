//! The built-in compatibility table.
//!
//! Rules are ordered; the engine takes the first match. More specific rules
//! (animated variants, stream-token checks, color modes) sit above the broad
//! rules that share their extensions.

use ps_core::{RuleAction, RuleCategory};

use crate::condition::Condition;
use crate::rule::FormatRule;

/// Camera raw extensions imported without conversion.
const RAW_IMPORT_EXTENSIONS: &[&str] = &[
    ".dng", ".cr2", ".cr3", ".crw", ".nef", ".nrw", ".arw", ".srf", ".sr2", ".raf", ".orf",
    ".rw2", ".pef", ".rwl", ".iiq", ".cap", ".3fr", ".fff", ".gpr",
];

/// Legacy video containers that get normalized into MP4.
const LEGACY_CONTAINER_EXTENSIONS: &[&str] = &[
    ".avi", ".wmv", ".flv", ".mpg", ".mpeg", ".ts", ".m2ts", ".mts", ".3gp", ".3g2", ".vob",
    ".ogv", ".divx",
];

fn rule(
    rule_id: &str,
    category: RuleCategory,
    extensions: &[&str],
    conditions: Vec<Condition>,
    action: RuleAction,
    notes: &str,
) -> FormatRule {
    FormatRule {
        rule_id: rule_id.to_string(),
        category,
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        conditions,
        action,
        notes: notes.to_string(),
    }
}

fn stream_token(token: &str) -> Condition {
    Condition::StreamToken {
        token: token.to_string(),
    }
}

fn color_mode(value: &str) -> Condition {
    Condition::ColorMode {
        value: value.to_string(),
    }
}

/// Build the ordered built-in rule table.
pub fn builtin_rules() -> Vec<FormatRule> {
    use RuleAction::*;
    use RuleCategory::*;

    vec![
        // Images.
        rule(
            "jpeg_import",
            Image,
            &[".jpg", ".jpeg"],
            vec![],
            Import,
            "natively supported",
        ),
        rule(
            "apng_to_hevc_video",
            Image,
            &[".png"],
            vec![Condition::Animated { value: true }],
            ConvertAnimationToHevcMp4,
            "animated PNG becomes an HEVC clip",
        ),
        rule(
            "png_import",
            Image,
            &[".png"],
            vec![],
            Import,
            "natively supported",
        ),
        rule(
            "gif_import",
            Image,
            &[".gif"],
            vec![],
            Import,
            "GIFs import directly, animated or not",
        ),
        rule(
            "heic_import",
            Image,
            &[".heic", ".heif"],
            vec![],
            Import,
            "natively supported",
        ),
        rule(
            "tiff_import",
            Image,
            &[".tiff", ".tif"],
            vec![],
            Import,
            "natively supported",
        ),
        rule(
            "animated_webp_to_hevc_video",
            Image,
            &[".webp"],
            vec![Condition::Animated { value: true }],
            ConvertAnimationToHevcMp4,
            "animated WebP becomes an HEVC clip",
        ),
        rule(
            "webp_to_png",
            Image,
            &[".webp"],
            vec![],
            ConvertToPng,
            "no native WebP support",
        ),
        rule(
            "bmp_to_png",
            Image,
            &[".bmp"],
            vec![],
            ConvertToPng,
            "no native BMP support",
        ),
        rule(
            "jpeg2000_to_png",
            Image,
            &[".jp2", ".j2k", ".jpf"],
            vec![],
            ConvertToPng,
            "no native JPEG 2000 support",
        ),
        rule(
            "jxl_to_heic",
            Image,
            &[".jxl"],
            vec![],
            ConvertToHeicLossless,
            "JPEG XL re-encoded losslessly",
        ),
        rule(
            "avif_to_heic",
            Image,
            &[".avif"],
            vec![],
            ConvertToHeicLossless,
            "AVIF re-encoded losslessly",
        ),
        rule(
            "psd_rgb_to_tiff",
            Image,
            &[".psd", ".psb"],
            vec![color_mode("rgb")],
            ConvertToTiff,
            "flattened to 16-bit TIFF",
        ),
        rule(
            "psd_grayscale_to_tiff",
            Image,
            &[".psd", ".psb"],
            vec![color_mode("grayscale")],
            ConvertToTiff,
            "flattened to 16-bit TIFF",
        ),
        rule(
            "psd_cmyk_to_tiff",
            Image,
            &[".psd", ".psb"],
            vec![color_mode("cmyk")],
            ConvertToTiff,
            "flattened to 16-bit TIFF",
        ),
        rule(
            "psd_unsupported_color_mode",
            Image,
            &[".psd", ".psb"],
            vec![],
            SkipUnsupportedColorMode,
            "bitmap, indexed, duotone, multichannel, and lab modes cannot be flattened faithfully",
        ),
        // Vector graphics.
        rule(
            "svg_vector_skip",
            Vector,
            &[".svg", ".svgz"],
            vec![],
            SkipVector,
            "vector graphics have no canonical raster form",
        ),
        rule(
            "postscript_vector_skip",
            Vector,
            &[".eps", ".ai"],
            vec![],
            SkipVector,
            "vector graphics have no canonical raster form",
        ),
        // Camera raw.
        rule(
            "camera_raw_import",
            Raw,
            RAW_IMPORT_EXTENSIONS,
            vec![],
            Import,
            "camera raw imports untouched",
        ),
        rule(
            "foveon_raw_skip",
            Raw,
            &[".x3f"],
            vec![],
            SkipUnsupportedRaw,
            "Foveon X3F has no lossless converter",
        ),
        // Video.
        rule(
            "prores_to_lossless_hevc",
            Video,
            &[".mov", ".mkv", ".mxf"],
            vec![stream_token("video:prores")],
            TranscodeVideoToLosslessHevc,
            "mezzanine codec, re-encoded losslessly with audio untouched",
        ),
        rule(
            "matroska_h264_aac_rewrap",
            Video,
            &[".mkv", ".webm"],
            vec![stream_token("video:h264"), stream_token("audio:aac")],
            RewrapToMp4,
            "compatible codecs in a foreign container",
        ),
        rule(
            "matroska_hevc_aac_rewrap",
            Video,
            &[".mkv", ".webm"],
            vec![stream_token("video:hevc"), stream_token("audio:aac")],
            RewrapToMp4,
            "compatible codecs in a foreign container",
        ),
        rule(
            "quicktime_family_normalize",
            Video,
            &[".mp4", ".m4v", ".mov", ".qt"],
            vec![],
            RewrapOrTranscodeToMp4,
            "normalized against the probed streams",
        ),
        rule(
            "matroska_normalize",
            Video,
            &[".mkv", ".webm"],
            vec![],
            RewrapOrTranscodeToMp4,
            "normalized against the probed streams",
        ),
        rule(
            "legacy_container_normalize",
            Video,
            LEGACY_CONTAINER_EXTENSIONS,
            vec![],
            RewrapOrTranscodeToMp4,
            "legacy container normalized into MP4",
        ),
        rule(
            "unconvertible_video_skip",
            Video,
            &[".rm", ".rmvb", ".asf", ".swf"],
            vec![],
            SkipUnknownVideo,
            "no faithful conversion path exists",
        ),
    ]
}
