//! Built-in magic byte signature table.
//!
//! Pure-Rust header matcher covering the image, raw, video, audio, and
//! archive formats the pipeline meets in practice. Runs on every file with
//! no external tools, so the consensus always has at least this vote and
//! the `infer` vote to work with.

use std::path::Path;

use async_trait::async_trait;
use ps_core::MediaKind;

use crate::content::read_prefix;
use crate::detector::Detector;
use crate::vote::{DetectorId, FormatVote};

/// Header window the table inspects. Large enough for the ftyp compatible
/// brand list, the Matroska DocType, the tar magic at offset 257, and the
/// third MPEG-TS sync byte at offset 376.
const HEADER_LEN: usize = 512;

/// A match from the signature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    pub mime: &'static str,
    pub extension: &'static str,
    /// Only set where the MIME prefix alone would mislead (camera raws
    /// report `image/x-*` but must vote raw).
    pub kind: Option<MediaKind>,
    pub description: &'static str,
}

fn found(
    mime: &'static str,
    extension: &'static str,
    description: &'static str,
) -> Option<HeaderMatch> {
    Some(HeaderMatch {
        mime,
        extension,
        kind: None,
        description,
    })
}

fn found_raw(
    mime: &'static str,
    extension: &'static str,
    description: &'static str,
) -> Option<HeaderMatch> {
    Some(HeaderMatch {
        mime,
        extension,
        kind: Some(MediaKind::Raw),
        description,
    })
}

/// Match a file header against the built-in table.
///
/// Checks run most-specific first: camera raw signatures before the generic
/// TIFF magic they embed, WebP/WAVE/AVI before the shared RIFF prefix would
/// be ambiguous, and ftyp brands before any generic ISO media fallback.
pub fn sniff_header(header: &[u8]) -> Option<HeaderMatch> {
    if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return found("image/png", ".png", "PNG image data");
    }
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return found("image/jpeg", ".jpg", "JPEG image data");
    }
    if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
        return found("image/gif", ".gif", "GIF image data");
    }

    if header.len() >= 12 && header.starts_with(b"RIFF") {
        return match &header[8..12] {
            b"WEBP" => found("image/webp", ".webp", "WebP image"),
            b"WAVE" => found("audio/x-wav", ".wav", "WAVE audio"),
            b"AVI " => found("video/x-msvideo", ".avi", "AVI video"),
            _ => found("application/octet-stream", ".riff", "RIFF data"),
        };
    }

    if let Some(m) = match_ftyp(header) {
        return Some(m);
    }

    if header.starts_with(&[0xFF, 0x0A])
        || header.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x4A, 0x58, 0x4C, 0x20])
    {
        return found("image/jxl", ".jxl", "JPEG XL image");
    }

    // Camera raws, before the generic TIFF magic most of them embed.
    if header.len() >= 10 && header.starts_with(&[0x49, 0x49, 0x2A, 0x00]) && &header[8..10] == b"CR"
    {
        return found_raw("image/x-canon-cr2", ".cr2", "Canon CR2 raw image");
    }
    if header.starts_with(b"IIRO") || header.starts_with(b"IIRS") || header.starts_with(b"MMOR") {
        return found_raw("image/x-olympus-orf", ".orf", "Olympus ORF raw image");
    }
    if header.starts_with(&[0x49, 0x49, 0x55, 0x00]) {
        return found_raw("image/x-panasonic-rw2", ".rw2", "Panasonic RW2 raw image");
    }
    if header.starts_with(b"FUJIFILMCCD-RAW") {
        return found_raw("image/x-fuji-raf", ".raf", "Fujifilm RAF raw image");
    }
    if header.starts_with(b"FOVb") {
        return found_raw("image/x-sigma-x3f", ".x3f", "Sigma X3F raw image");
    }
    if header.len() >= 14
        && header.starts_with(&[0x49, 0x49, 0x1A, 0x00, 0x00, 0x00])
        && &header[6..14] == b"HEAPCCDR"
    {
        return found_raw("image/x-canon-crw", ".crw", "Canon CRW raw image");
    }

    if header.starts_with(&[0x49, 0x49, 0x2A, 0x00])
        || header.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        || header.starts_with(&[0x49, 0x49, 0x2B, 0x00])
        || header.starts_with(&[0x4D, 0x4D, 0x00, 0x2B])
    {
        return found("image/tiff", ".tiff", "TIFF image data");
    }

    if header.starts_with(b"8BPS") {
        return found(
            "image/vnd.adobe.photoshop",
            ".psd",
            "Adobe Photoshop image",
        );
    }
    if header.starts_with(b"BM") {
        return found("image/bmp", ".bmp", "BMP image data");
    }
    if header.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
        || header.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
    {
        return found("image/jp2", ".jp2", "JPEG 2000 image");
    }

    if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML container; the DocType distinguishes WebM from Matroska.
        if header.windows(4).any(|w| w == b"webm") {
            return found("video/webm", ".webm", "WebM video");
        }
        return found("video/x-matroska", ".mkv", "Matroska data");
    }

    if header.starts_with(&[0x00, 0x00, 0x01, 0xBA]) {
        return found("video/mpeg", ".mpg", "MPEG program stream");
    }
    if header.len() > 376 && header[0] == 0x47 && header[188] == 0x47 && header[376] == 0x47 {
        return found("video/mp2t", ".ts", "MPEG transport stream");
    }
    if header.starts_with(b"FLV\x01") {
        return found("video/x-flv", ".flv", "Flash video");
    }
    if header.starts_with(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]) {
        return found("video/x-ms-asf", ".wmv", "Microsoft ASF");
    }
    if header.starts_with(b".RMF") {
        return found("application/vnd.rn-realmedia", ".rm", "RealMedia data");
    }
    if header.starts_with(b"FWS") || header.starts_with(b"CWS") || header.starts_with(b"ZWS") {
        return found("application/x-shockwave-flash", ".swf", "Shockwave Flash");
    }
    if header.starts_with(&[0x06, 0x0E, 0x2B, 0x34]) {
        return found("application/mxf", ".mxf", "MXF media container");
    }

    if header.starts_with(b"ID3")
        || header.starts_with(&[0xFF, 0xFB])
        || header.starts_with(&[0xFF, 0xF3])
        || header.starts_with(&[0xFF, 0xF2])
    {
        return found("audio/mpeg", ".mp3", "MPEG audio");
    }
    if header.starts_with(b"fLaC") {
        return found("audio/flac", ".flac", "FLAC audio");
    }
    if header.starts_with(b"OggS") {
        return found("application/ogg", ".ogg", "Ogg data");
    }

    if header.starts_with(b"PK\x03\x04")
        || header.starts_with(b"PK\x05\x06")
        || header.starts_with(b"PK\x07\x08")
    {
        return found("application/zip", ".zip", "Zip archive");
    }
    if header.starts_with(b"Rar!\x1a\x07") {
        return found("application/vnd.rar", ".rar", "RAR archive");
    }
    if header.starts_with(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C]) {
        return found("application/x-7z-compressed", ".7z", "7-zip archive");
    }
    if header.starts_with(&[0x1F, 0x8B]) {
        return found("application/gzip", ".gz", "gzip compressed data");
    }
    if header.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]) {
        return found("application/x-xz", ".xz", "XZ compressed data");
    }
    if header.starts_with(b"BZh") {
        return found("application/x-bzip2", ".bz2", "bzip2 compressed data");
    }
    if header.len() >= 262 && &header[257..262] == b"ustar" {
        return found("application/x-tar", ".tar", "POSIX tar archive");
    }

    if header.starts_with(b"%PDF") {
        return found("application/pdf", ".pdf", "PDF document");
    }
    if header.starts_with(b"%!PS") || header.starts_with(&[0xC5, 0xD0, 0xD3, 0xC6]) {
        return found("application/postscript", ".eps", "PostScript document");
    }
    if let Some(m) = match_svg(header) {
        return Some(m);
    }

    None
}

fn match_ftyp(header: &[u8]) -> Option<HeaderMatch> {
    if header.len() < 12 || &header[4..8] != b"ftyp" {
        return None;
    }
    let brand = &header[8..12];
    match brand {
        b"crx " => found_raw("image/x-canon-cr3", ".cr3", "Canon CR3 raw image"),
        b"avif" | b"avis" => found("image/avif", ".avif", "AVIF image"),
        b"heic" | b"heix" | b"heim" | b"heis" | b"hevc" | b"hevx" | b"hev1" => {
            found("image/heic", ".heic", "HEIC image")
        }
        b"heif" => found("image/heif", ".heif", "HEIF image"),
        // mif1/msf1 major brand is ambiguous; the compatible brand list decides.
        b"mif1" | b"msf1" => resolve_ambiguous_ftyp(header),
        b"qt  " => found("video/quicktime", ".mov", "QuickTime movie"),
        b"M4V " | b"M4VH" | b"M4VP" => found("video/x-m4v", ".m4v", "iTunes video"),
        b"M4A " => found("audio/mp4", ".m4a", "MPEG-4 audio"),
        _ if brand.starts_with(b"3gp") => found("video/3gpp", ".3gp", "3GPP media"),
        _ if brand.starts_with(b"3g2") => found("video/3gpp2", ".3g2", "3GPP2 media"),
        _ => found("video/mp4", ".mp4", "ISO media, MP4"),
    }
}

fn resolve_ambiguous_ftyp(header: &[u8]) -> Option<HeaderMatch> {
    let box_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let end = box_size.min(header.len());
    if end >= 16 {
        for chunk in header[16..end].chunks_exact(4) {
            if chunk == b"avif" || chunk == b"avis" {
                return found("image/avif", ".avif", "AVIF image");
            }
        }
    }
    found("image/heic", ".heic", "HEIC image")
}

fn match_svg(header: &[u8]) -> Option<HeaderMatch> {
    let body = header.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(header);
    let looks_like_svg = body.starts_with(b"<svg")
        || (body.starts_with(b"<?xml") && body.windows(4).any(|w| w == b"<svg"));
    if looks_like_svg {
        found("image/svg+xml", ".svg", "SVG vector image")
    } else {
        None
    }
}

/// The always-available detector backed by [`sniff_header`].
#[derive(Debug, Default)]
pub struct SigDbDetector;

impl SigDbDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Detector for SigDbDetector {
    fn id(&self) -> DetectorId {
        DetectorId::SigDb
    }

    async fn identify(&self, path: &Path) -> FormatVote {
        let header = match read_prefix(path, HEADER_LEN) {
            Ok(header) => header,
            Err(e) => return FormatVote::failed(DetectorId::SigDb, e.to_string()),
        };
        match sniff_header(&header) {
            Some(m) => FormatVote {
                detector: DetectorId::SigDb,
                mime: Some(m.mime.to_string()),
                extension: Some(m.extension.to_string()),
                description: Some(m.description.to_string()),
                kind: m.kind,
                error: None,
            },
            None => FormatVote::empty(DetectorId::SigDb),
        }
    }
}
