//! Weighted-majority resolution over detector votes.
//!
//! Detectors disagree constantly: `file` may call something `video/mp4`
//! while the magic table says `video/quicktime`. The resolver groups votes
//! by what they claim, sums each group's detector weight, and picks the
//! heaviest claim. Grouping runs over MIME first, then extension, then
//! falls back to the single strongest vote. The result is deterministic
//! for a given vote list: groups iterate in key order and weight ties are
//! broken by fixed detector rank.

use std::collections::BTreeMap;

use ps_core::{Error, MediaKind, Result};

use crate::vote::{normalize_extension, FormatVote};

/// Relative tolerance when comparing summed vote weights.
const WEIGHT_EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= WEIGHT_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Outcome of weighing all detector votes for one file.
#[derive(Debug, Clone)]
pub struct Consensus {
    /// The winning group's highest-priority vote.
    pub representative: FormatVote,
    /// Media kind resolved across all usable votes. Always importable;
    /// audio and non-media resolutions are rejected during [`resolve`].
    pub kind: MediaKind,
}

impl Consensus {
    /// Consensus extension (normalized, with leading dot), if any vote had one.
    pub fn extension(&self) -> Option<String> {
        self.representative
            .extension
            .as_deref()
            .map(normalize_extension)
            .filter(|e| !e.is_empty())
    }

    /// Consensus MIME type, lowercased.
    pub fn mime(&self) -> Option<String> {
        self.representative
            .mime
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase())
    }

    /// Human-readable format name for logs and the manifest.
    pub fn format_name(&self) -> String {
        if let Some(desc) = &self.representative.description {
            return desc.clone();
        }
        if let Some(mime) = self.mime() {
            return mime;
        }
        self.extension().unwrap_or_else(|| "unknown".to_string())
    }
}

/// Resolve the vote list into a single format decision.
///
/// Fails with [`Error::NoConsensus`] when no detector produced a usable
/// vote, and with [`Error::UnsupportedCategory`] when the weighted kind
/// resolution lands outside {image, video, raw}.
pub fn resolve(votes: &[FormatVote]) -> Result<Consensus> {
    let usable: Vec<&FormatVote> = votes.iter().filter(|v| v.is_usable()).collect();
    if usable.is_empty() {
        return Err(Error::NoConsensus(
            "no detector produced a usable vote".to_string(),
        ));
    }

    let representative = pick_representative(&usable);

    let kind = match resolve_kind(&usable, representative) {
        Some(kind) => kind,
        None => {
            return Err(Error::unsupported(
                "non-media file",
                describe(representative),
            ))
        }
    };
    if !kind.is_importable() {
        return Err(Error::unsupported(
            "non-media file",
            format!("{} resolved as {kind}", describe(representative)),
        ));
    }

    Ok(Consensus {
        representative: representative.clone(),
        kind,
    })
}

fn describe(vote: &FormatVote) -> String {
    vote.description
        .clone()
        .or_else(|| vote.mime.clone())
        .or_else(|| vote.extension.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

fn pick_representative<'a>(usable: &[&'a FormatVote]) -> &'a FormatVote {
    if let Some(winner) = winning_group(usable, |v| {
        v.mime
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
    }) {
        return winner;
    }

    if let Some(winner) = winning_group(usable, |v| {
        v.extension
            .as_deref()
            .map(|e| fold_extension(&normalize_extension(e)))
            .filter(|e| !e.is_empty())
    }) {
        return winner;
    }

    // No shared claims at all: strongest single vote wins, rank breaking
    // exact weight ties.
    usable
        .iter()
        .min_by(|a, b| {
            b.detector
                .weight()
                .partial_cmp(&a.detector.weight())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.detector.rank().cmp(&b.detector.rank()))
        })
        .copied()
        .expect("usable votes are non-empty")
}

/// Group votes by `key`, sum detector weights per group, and return the
/// best vote of the winning group. Returns `None` when no vote carries the
/// key or when several groups tie at the maximum weight.
fn winning_group<'a, F>(usable: &[&'a FormatVote], key: F) -> Option<&'a FormatVote>
where
    F: Fn(&FormatVote) -> Option<String>,
{
    let mut groups: BTreeMap<String, (f64, &'a FormatVote)> = BTreeMap::new();
    for vote in usable {
        let Some(k) = key(vote) else { continue };
        groups
            .entry(k)
            .and_modify(|(weight, best)| {
                *weight += vote.detector.weight();
                if vote.detector.rank() < best.detector.rank() {
                    *best = vote;
                }
            })
            .or_insert((vote.detector.weight(), vote));
    }
    if groups.is_empty() {
        return None;
    }

    let max_weight = groups
        .values()
        .map(|(w, _)| *w)
        .fold(f64::MIN, f64::max);
    let mut winners = groups
        .values()
        .filter(|(w, _)| approx_eq(*w, max_weight));

    let (_, best) = winners.next()?;
    if winners.next().is_some() {
        // Ambiguous at this grouping level; caller falls through.
        return None;
    }
    Some(best)
}

/// Extension aliases folded before grouping, so `.jpeg` and `.jpg` votes
/// land in the same bucket.
fn fold_extension(ext: &str) -> String {
    match ext {
        ".jpeg" | ".jpe" => ".jpg".to_string(),
        ".tif" => ".tiff".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Kind resolution
// ---------------------------------------------------------------------------

const RAW_EXTENSIONS: &[&str] = &[
    ".dng", ".cr2", ".cr3", ".crw", ".nef", ".nrw", ".arw", ".srf", ".sr2", ".raf", ".orf",
    ".rw2", ".pef", ".rwl", ".iiq", ".cap", ".3fr", ".fff", ".gpr", ".x3f",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".heic", ".heif", ".tiff", ".tif", ".webp", ".bmp", ".jp2",
    ".j2k", ".jpf", ".jxl", ".avif", ".psd", ".psb",
];

const VECTOR_EXTENSIONS: &[&str] = &[".svg", ".svgz", ".eps", ".ai"];

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".m4v", ".mov", ".qt", ".mkv", ".webm", ".avi", ".wmv", ".flv", ".mpg", ".mpeg",
    ".ts", ".m2ts", ".mts", ".3gp", ".3g2", ".vob", ".ogv", ".divx", ".mxf", ".rm", ".rmvb",
    ".asf", ".swf",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    ".mp3", ".m4a", ".aac", ".flac", ".wav", ".ogg", ".oga", ".opus", ".wma", ".aiff", ".alac",
];

/// Whether a normalized extension belongs to a camera raw format.
pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext)
}

fn is_raw_mime(mime: &str) -> bool {
    if mime == "image/x-dcraw" {
        return true;
    }
    // Vendor raw MIME types end in the raw extension: image/x-canon-cr2,
    // image/x-nikon-nef, image/x-adobe-dng, ...
    mime.starts_with("image/x-")
        && mime
            .rsplit('-')
            .next()
            .is_some_and(|tail| RAW_EXTENSIONS.contains(&format!(".{tail}").as_str()))
}

/// Canonical extension for a recognized media MIME type.
///
/// Detectors that only report a MIME or free-text description (file, binwalk)
/// use these to join the extension grouping pass with the same vocabulary as
/// the byte-sniffing detectors.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.trim().to_ascii_lowercase();
    let mapped = match mime.as_str() {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/tiff" => ".tiff",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/heif" | "image/heic" => ".heic",
        "image/avif" => ".avif",
        "image/jxl" => ".jxl",
        "image/jp2" => ".jp2",
        "image/svg+xml" => ".svg",
        "image/vnd.adobe.photoshop" => ".psd",
        "application/postscript" => ".eps",
        "video/mp4" => ".mp4",
        "video/x-m4v" => ".m4v",
        "video/quicktime" | "video/x-quicktime" => ".mov",
        "video/x-msvideo" => ".avi",
        "video/x-matroska" => ".mkv",
        "video/webm" => ".webm",
        "video/x-flv" => ".flv",
        "video/x-ms-wmv" => ".wmv",
        "video/mpeg" => ".mpg",
        "video/mp2t" => ".ts",
        "video/3gpp" => ".3gp",
        "video/3gpp2" => ".3g2",
        "application/mxf" => ".mxf",
        _ => "",
    };
    if !mapped.is_empty() {
        return Some(mapped);
    }
    // Vendor raw MIME types carry the extension in their tail.
    if mime.starts_with("image/x-") {
        if let Some(tail) = mime.rsplit('-').next() {
            return RAW_EXTENSIONS
                .iter()
                .find(|e| e.trim_start_matches('.') == tail)
                .copied();
        }
    }
    None
}

const DESCRIPTION_EXTENSION_HINTS: &[(&str, &[&str])] = &[
    (".jpg", &["jpeg", "jpg"]),
    (".png", &["png"]),
    (".gif", &["gif"]),
    (".bmp", &["bitmap", "bmp"]),
    (".tiff", &["tiff", "tif"]),
    (".heic", &["heic", "heif"]),
    (".mp4", &["mp4", "mpeg-4", "h.264", "h264"]),
    (".mov", &["quicktime", "mov"]),
    (".m4v", &["m4v"]),
    (".webm", &["webm"]),
    (".avi", &["avi"]),
    (".mkv", &["matroska", "mkv"]),
];

/// Best-effort extension hint mined from a free-text detector description.
/// Checked in table order, first keyword hit wins.
pub fn extension_for_description(description: &str) -> Option<&'static str> {
    let lowered = description.to_ascii_lowercase();
    DESCRIPTION_EXTENSION_HINTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(ext, _)| *ext)
}

/// Derive the kind a single vote advocates for, if any.
fn infer_kind(vote: &FormatVote) -> Option<MediaKind> {
    if let Some(kind) = vote.kind {
        return Some(kind);
    }

    if let Some(mime) = &vote.mime {
        let mime = mime.trim().to_ascii_lowercase();
        if is_raw_mime(&mime) {
            return Some(MediaKind::Raw);
        }
        if mime.starts_with("image/") {
            return Some(MediaKind::Image);
        }
        if mime.starts_with("video/") {
            return Some(MediaKind::Video);
        }
        if mime.starts_with("audio/") {
            return Some(MediaKind::Audio);
        }
    }

    if let Some(ext) = &vote.extension {
        let ext = normalize_extension(ext);
        if RAW_EXTENSIONS.contains(&ext.as_str()) {
            return Some(MediaKind::Raw);
        }
        // Vector formats flow through as images so the vector rules can
        // reject them with a dedicated reason.
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) || VECTOR_EXTENSIONS.contains(&ext.as_str()) {
            return Some(MediaKind::Image);
        }
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Some(MediaKind::Video);
        }
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            return Some(MediaKind::Audio);
        }
    }

    if let Some(desc) = &vote.description {
        let desc = desc.to_ascii_lowercase();
        if desc.contains("camera raw") || desc.contains("raw image") || desc.contains("digital negative") {
            return Some(MediaKind::Raw);
        }
        if desc.contains("audio") || desc.contains("sound") {
            return Some(MediaKind::Audio);
        }
        if desc.contains("video") || desc.contains("movie") || desc.contains("film") {
            return Some(MediaKind::Video);
        }
        if desc.contains("image") || desc.contains("bitmap") {
            return Some(MediaKind::Image);
        }
    }

    None
}

/// Weighted kind vote across all usable votes; the representative's own
/// inferred kind breaks ties.
fn resolve_kind(usable: &[&FormatVote], representative: &FormatVote) -> Option<MediaKind> {
    let mut tally = [
        (MediaKind::Image, 0.0f64),
        (MediaKind::Video, 0.0),
        (MediaKind::Audio, 0.0),
        (MediaKind::Raw, 0.0),
    ];
    for vote in usable {
        if let Some(kind) = infer_kind(vote) {
            for slot in &mut tally {
                if slot.0 == kind {
                    slot.1 += vote.detector.weight();
                }
            }
        }
    }

    let max_weight = tally.iter().map(|(_, w)| *w).fold(f64::MIN, f64::max);
    if max_weight <= 0.0 {
        return None;
    }

    let tied: Vec<MediaKind> = tally
        .iter()
        .filter(|(_, w)| approx_eq(*w, max_weight))
        .map(|(k, _)| *k)
        .collect();
    if tied.len() == 1 {
        return Some(tied[0]);
    }
    if let Some(rep_kind) = infer_kind(representative) {
        if tied.contains(&rep_kind) {
            return Some(rep_kind);
        }
    }
    tied.first().copied()
}
