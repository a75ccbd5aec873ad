//! Filesystem walking and pre-detection filtering.
//!
//! The walker yields candidate files in a stable sorted order, pruning the
//! run's own artifacts (staging directories, skip logs, manifests) and
//! hidden entries. Each candidate then passes the pre-filters, cheapest
//! first, so empty files, archives, and text never reach the detectors.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Container formats that hold other files, never media themselves.
const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "dmg", "iso",
];

/// Extensions that are always text; skipped without opening the file.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "xml", "yaml", "yml", "html", "htm", "css", "js", "csv", "log", "ini",
    "toml", "py", "sh",
];

/// How much of the file the content checks inspect.
const HEAD_PROBE_BYTES: usize = 8 * 1024;

/// What the pre-detection filters decided about one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefilter {
    /// Binary payload; hand it to the detectors.
    Binary,
    /// Text content; counted separately, never detected.
    Text,
    /// Zero bytes on disk.
    Empty,
    /// The file cannot be opened or read.
    Unreadable,
    /// An archive by extension or signature.
    Archive,
}

impl Prefilter {
    /// Skip-log reason for filtered files; `None` for binary survivors.
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            Prefilter::Binary => None,
            Prefilter::Text => Some("text file"),
            Prefilter::Empty => Some("file is empty"),
            Prefilter::Unreadable => Some("file is not readable"),
            Prefilter::Archive => Some("archive file"),
        }
    }
}

/// Walk `root` and collect candidate files in sorted order.
///
/// Prunes hidden entries (dot-prefixed), directories named like staging
/// areas (`<staging_prefix>-*`), earlier runs' skip logs, and import
/// manifests. Unreadable directory entries are dropped silently; the
/// per-file readability check happens later in [`prefilter`].
pub fn collect_files(root: &Path, staging_prefix: &str, manifest_name: &str) -> Vec<PathBuf> {
    let staged_dir_prefix = format!("{staging_prefix}-");
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The root itself is always entered, whatever its name.
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                return false;
            }
            if entry.file_type().is_dir() && name.starts_with(&staged_dir_prefix) {
                return false;
            }
            !(is_skip_log_name(&name) || name == manifest_name)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn is_skip_log_name(name: &str) -> bool {
    name.starts_with("skipped_files_") && name.ends_with(".log")
}

/// Run the pre-detection filters over one file, cheapest check first.
///
/// `text_exempt` holds extensions (lowercase, no dot) the rule table knows;
/// those bypass the content heuristic so that, say, an SVG reaches the rule
/// engine and is rejected with its vector note instead of as generic text.
pub fn prefilter(path: &Path, text_exempt: &BTreeSet<String>) -> Prefilter {
    let ext = extension_of(path);

    let len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return Prefilter::Unreadable,
    };
    if len == 0 {
        return Prefilter::Empty;
    }

    if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) {
        return Prefilter::Archive;
    }

    let head = match read_head(path) {
        Ok(head) => head,
        Err(_) => return Prefilter::Unreadable,
    };
    if has_archive_signature(&head) {
        return Prefilter::Archive;
    }

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Prefilter::Text;
    }
    if !text_exempt.contains(&ext) && looks_like_text(&head) {
        return Prefilter::Text;
    }

    Prefilter::Binary
}

/// Lowercased extension without the dot; empty when there is none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEAD_PROBE_BYTES);
    File::open(path)?
        .take(HEAD_PROBE_BYTES as u64)
        .read_to_end(&mut buf)?;
    Ok(buf)
}

/// Archive magic at the start of the file, plus the tar magic at its fixed
/// offset. ISO images sit past the probe window and rely on the extension
/// check alone.
fn has_archive_signature(head: &[u8]) -> bool {
    const PREFIXES: &[&[u8]] = &[
        b"PK\x03\x04",
        b"PK\x05\x06",
        &[0x1f, 0x8b],
        b"BZh",
        &[0xfd, b'7', b'z', b'X', b'Z', 0x00],
        &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c],
        b"Rar!\x1a\x07",
    ];
    if PREFIXES.iter().any(|prefix| head.starts_with(prefix)) {
        return true;
    }
    head.len() > 262 && &head[257..262] == b"ustar"
}

/// NUL-free valid UTF-8 counts as text. A multi-byte sequence cut off by
/// the probe window still counts; an invalid byte does not.
fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
