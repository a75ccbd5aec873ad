//! Runs every registered detector over a file and gathers their votes.

use std::path::Path;

use crate::detector::Detector;
use crate::infer_detector::InferDetector;
use crate::sigdb::SigDbDetector;
use crate::vote::FormatVote;

/// Fans a file out to all registered [`Detector`]s and collects one vote
/// per detector.
///
/// The two pure-Rust detectors are always present; subprocess-backed ones
/// are registered at startup only when their tools were discovered, so an
/// uninstalled tool simply casts no vote.
pub struct SignatureCollector {
    detectors: Vec<Box<dyn Detector>>,
}

impl SignatureCollector {
    /// Collector with only the built-in detectors (magic table + `infer`).
    pub fn builtin() -> Self {
        Self {
            detectors: vec![Box::new(SigDbDetector::new()), Box::new(InferDetector::new())],
        }
    }

    /// Collector over an explicit detector list.
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// Register an additional detector.
    pub fn push(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Collect one vote per registered detector.
    ///
    /// Detector failures surface as error-carrying votes, never as an early
    /// return; one broken tool must not stop classification.
    pub async fn collect(&self, path: &Path) -> Vec<FormatVote> {
        let mut votes = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let vote = detector.identify(path).await;
            if let Some(error) = &vote.error {
                tracing::debug!(
                    detector = %detector.id(),
                    error = %error,
                    "detector failed, continuing with remaining votes"
                );
            }
            votes.push(vote);
        }
        votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::DetectorId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn builtin_collector_votes_on_png() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0])
            .unwrap();

        let collector = SignatureCollector::builtin();
        let votes = collector.collect(file.path()).await;
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|v| v.is_usable()));
        assert!(votes
            .iter()
            .any(|v| v.detector == DetectorId::SigDb && v.mime.as_deref() == Some("image/png")));
    }

    #[tokio::test]
    async fn missing_file_produces_error_votes() {
        let collector = SignatureCollector::builtin();
        let votes = collector.collect(Path::new("/nonexistent/file.png")).await;
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|v| v.error.is_some()));
    }

    #[tokio::test]
    async fn empty_collector_collects_nothing() {
        let collector = SignatureCollector::new(vec![]);
        assert!(collector.is_empty());
        let votes = collector.collect(Path::new("whatever")).await;
        assert!(votes.is_empty());
    }
}
