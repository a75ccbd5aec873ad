//! Unified error type for the photostage pipeline.
//!
//! All crates funnel their failures into [`Error`]. Per-file errors carry
//! enough context for the run driver to derive a skip-log reason and a
//! statistics bucket via [`Error::skip_category`].

use std::fmt;

/// Unified error type covering all failure modes in photostage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No detector produced usable output for a file.
    #[error("no format consensus: {0}")]
    NoConsensus(String),

    /// A consensus was reached but no rule matches any extension candidate.
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// The matched rule marks the category as unsupported.
    #[error("unsupported {category}: {note}")]
    UnsupportedCategory {
        /// The rule category (e.g. "vector") or skip action that fired.
        category: String,
        /// The rule's note, surfaced to the skip log.
        note: String,
    },

    /// The prober or bounded decode detected truncation or invalid streams.
    #[error("corrupt media: {0}")]
    CorruptMedia(String),

    /// An external transform exited non-zero, timed out, or failed to spawn.
    #[error("transform failed [{action}]: {message}")]
    TransformFailure {
        /// The action identifier that was being executed.
        action: String,
        /// Diagnostic excerpt from the external tool.
        message: String,
    },

    /// An external tool (ffmpeg, exiftool, etc.) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Stream probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// Staging (move, archive, rename) failed.
    #[error("Staging error: {0}")]
    Staging(String),
}

/// Statistics bucket a per-file error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCategory {
    /// No consensus or no matching rule.
    UnknownFormat,
    /// Corrupt, truncated, or empty media.
    CorruptOrEmpty,
    /// A conversion was attempted and failed.
    TransformFailed,
    /// Recognized but deliberately unsupported (vector, skip rules).
    Unsupported,
    /// Infrastructure failure (tool, I/O, staging).
    Error,
}

impl Error {
    /// Map this error to the statistics bucket the run driver increments.
    pub fn skip_category(&self) -> SkipCategory {
        match self {
            Error::NoConsensus(_) | Error::UnrecognizedFormat(_) => SkipCategory::UnknownFormat,
            Error::CorruptMedia(_) => SkipCategory::CorruptOrEmpty,
            Error::TransformFailure { .. } => SkipCategory::TransformFailed,
            Error::UnsupportedCategory { .. } => SkipCategory::Unsupported,
            Error::Tool { .. }
            | Error::Probe(_)
            | Error::Io { .. }
            | Error::Config(_)
            | Error::Staging(_) => SkipCategory::Error,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::TransformFailure`].
    pub fn transform(action: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::TransformFailure {
            action: action.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::UnsupportedCategory`].
    pub fn unsupported(category: impl fmt::Display, note: impl Into<String>) -> Self {
        Error::UnsupportedCategory {
            category: category.to_string(),
            note: note.into(),
        }
    }

    /// Convenience constructor for [`Error::Staging`].
    pub fn staging(message: impl Into<String>) -> Self {
        Error::Staging(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
