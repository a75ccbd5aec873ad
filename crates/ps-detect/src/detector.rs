//! The [`Detector`] trait implemented by every format detector.

use std::path::Path;

use async_trait::async_trait;

use crate::vote::{DetectorId, FormatVote};

/// A single format detector.
///
/// Implementations never abort the run: failures are folded into the
/// returned vote's `error` field, so one broken tool cannot stop
/// classification. Detectors read the file; they must never mutate it.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Which detector this is.
    fn id(&self) -> DetectorId;

    /// Inspect `path` and return this detector's vote.
    async fn identify(&self, path: &Path) -> FormatVote;
}
