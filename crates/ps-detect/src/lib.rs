//! # ps-detect
//!
//! Multi-detector format identification with weighted consensus.
//!
//! Several detectors inspect each file independently (the built-in magic
//! table, the `infer` crate, and subprocess-backed detectors registered by
//! the caller). Each produces a [`FormatVote`]; the consensus resolver
//! weighs the votes and settles on a single format and media kind.
//!
//! ## Quick start
//!
//! ```no_run
//! use ps_detect::{consensus, SignatureCollector};
//! use std::path::Path;
//!
//! # async fn example() -> ps_core::Result<()> {
//! let collector = SignatureCollector::builtin();
//! let votes = collector.collect(Path::new("photo.heic")).await;
//! let consensus = consensus::resolve(&votes)?;
//! println!("{} ({})", consensus.format_name(), consensus.kind);
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod consensus;
pub mod content;
pub mod detector;
pub mod infer_detector;
pub mod sigdb;
pub mod vote;

// Re-export key types at crate root for convenience.
pub use collector::SignatureCollector;
pub use consensus::{extension_for_description, extension_for_mime, Consensus};
pub use content::ContentFlags;
pub use detector::Detector;
pub use infer_detector::InferDetector;
pub use sigdb::SigDbDetector;
pub use vote::{normalize_extension, DetectorId, FormatVote};
