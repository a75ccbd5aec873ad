//! Detector identities and the votes they cast.
//!
//! Every detector consulted for a file produces one [`FormatVote`], even on
//! failure. A failed detector's vote carries only `error`, so the run report
//! can still show which tools were consulted. Weighing the usable votes
//! against each other is the job of [`crate::consensus`].

use std::fmt;

use ps_core::MediaKind;
use serde::{Deserialize, Serialize};

/// One of the format detectors consulted for every scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorId {
    /// The external `file` binary (`--brief --mime-type` plus description).
    File,
    /// The external `binwalk` signature scanner.
    Binwalk,
    /// The `infer` crate's pure-Rust matcher.
    Infer,
    /// The built-in magic byte table.
    SigDb,
}

impl DetectorId {
    /// All detectors in tie-break priority order.
    pub const ALL: [DetectorId; 4] = [Self::File, Self::Binwalk, Self::Infer, Self::SigDb];

    /// Relative trust placed in this detector when votes disagree.
    ///
    /// `file` carries the broadest signature database and gets the highest
    /// weight; the built-in table is the 1.0 baseline.
    pub fn weight(self) -> f64 {
        match self {
            Self::File => 1.4,
            Self::Binwalk => 1.2,
            Self::Infer => 1.1,
            Self::SigDb => 1.0,
        }
    }

    /// Position in the fixed priority order. Lower wins ties.
    pub fn rank(self) -> usize {
        match self {
            Self::File => 0,
            Self::Binwalk => 1,
            Self::Infer => 2,
            Self::SigDb => 3,
        }
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Binwalk => write!(f, "binwalk"),
            Self::Infer => write!(f, "infer"),
            Self::SigDb => write!(f, "sigdb"),
        }
    }
}

/// A single detector's opinion about a file's format.
///
/// Votes may be partial: `file` reports a MIME type and a prose description
/// but no extension, while the magic table reports all three. Fields the
/// detector could not determine stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatVote {
    /// Which detector cast this vote.
    pub detector: DetectorId,
    /// MIME type, e.g. `image/png`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    /// Canonical extension with leading dot, e.g. `.png`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Free-text description, e.g. `PNG image data, 640 x 480`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media kind when the detector knows it outright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    /// Set when the detector itself failed; such votes are never counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormatVote {
    /// A vote with no findings at all (detector ran but matched nothing).
    pub fn empty(detector: DetectorId) -> Self {
        Self {
            detector,
            mime: None,
            extension: None,
            description: None,
            kind: None,
            error: None,
        }
    }

    /// A vote recording a detector failure.
    pub fn failed(detector: DetectorId, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(detector)
        }
    }

    /// Whether this vote counts toward consensus.
    pub fn is_usable(&self) -> bool {
        self.error.is_none()
            && (self.mime.is_some() || self.extension.is_some() || self.description.is_some())
    }
}

/// Lowercase an extension and ensure it carries a leading dot.
///
/// `"PNG"` and `".png"` both normalize to `".png"`; empty input stays empty.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return String::new();
    }
    format!(".{}", trimmed.to_ascii_lowercase())
}
