//! Aggregate counters for one scan-and-import run.

use ps_core::SkipCategory;

/// Counters updated by every stage of a run and read once for the final
/// report.
///
/// The run driver owns the single instance; stages never hold it across a
/// file boundary. All counts are per-file, so one file increments at most
/// one counter in each group.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    /// Files the scanner handed to pre-detection filtering.
    pub total_files_scanned: u64,
    /// Files filtered out as text before detection.
    pub total_text_files: u64,
    /// Files that survived all pre-filters and reached the detectors.
    pub total_binary_files: u64,
    /// Files classified as importable media by the rule engine.
    pub total_media_detected: u64,
    /// Media files importable as-is.
    pub media_compatible: u64,
    /// Media files that need a conversion before import.
    pub media_incompatible: u64,
    /// Conversions started.
    pub conversion_attempted: u64,
    /// Conversions that produced a verified output.
    pub conversion_succeeded: u64,
    /// Conversions that failed; the staged original is left untouched.
    pub conversion_failed: u64,
    /// Files imported without any transform.
    pub imported_without_conversion: u64,
    /// Files imported after a successful transform.
    pub imported_after_conversion: u64,
    /// Files the importer accepted, converted or not.
    pub total_imported: u64,
    /// Files the importer rejected with a reason.
    pub refused_by_importer: u64,
    /// Rejected: no consensus or no matching rule.
    pub skipped_unknown_format: u64,
    /// Rejected: empty, truncated, or undecodable media.
    pub skipped_corrupt_or_empty: u64,
    /// Rejected: tool, I/O, or staging failure.
    pub skipped_errors: u64,
    /// Rejected: recognized but deliberately unsupported, plus archives.
    pub skipped_other: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a per-file rejection into its statistics bucket.
    pub fn record_skip(&mut self, category: SkipCategory) {
        match category {
            SkipCategory::UnknownFormat => self.skipped_unknown_format += 1,
            SkipCategory::CorruptOrEmpty => self.skipped_corrupt_or_empty += 1,
            SkipCategory::TransformFailed => self.conversion_failed += 1,
            SkipCategory::Unsupported => self.skipped_other += 1,
            SkipCategory::Error => self.skipped_errors += 1,
        }
    }

    /// Total files rejected before or during conversion.
    pub fn total_skipped(&self) -> u64 {
        self.skipped_unknown_format
            + self.skipped_corrupt_or_empty
            + self.skipped_errors
            + self.skipped_other
            + self.conversion_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_statistics_are_zero() {
        let stats = RunStatistics::new();
        assert_eq!(stats, RunStatistics::default());
        assert_eq!(stats.total_skipped(), 0);
    }

    #[test]
    fn skips_land_in_their_buckets() {
        let mut stats = RunStatistics::new();
        stats.record_skip(SkipCategory::UnknownFormat);
        stats.record_skip(SkipCategory::UnknownFormat);
        stats.record_skip(SkipCategory::CorruptOrEmpty);
        stats.record_skip(SkipCategory::TransformFailed);
        stats.record_skip(SkipCategory::Unsupported);
        stats.record_skip(SkipCategory::Error);

        assert_eq!(stats.skipped_unknown_format, 2);
        assert_eq!(stats.skipped_corrupt_or_empty, 1);
        assert_eq!(stats.conversion_failed, 1);
        assert_eq!(stats.skipped_other, 1);
        assert_eq!(stats.skipped_errors, 1);
        assert_eq!(stats.total_skipped(), 6);
    }

    #[test]
    fn import_counters_are_independent() {
        let mut stats = RunStatistics::new();
        stats.total_imported = 3;
        stats.imported_without_conversion = 2;
        stats.imported_after_conversion = 1;
        stats.refused_by_importer = 1;
        assert_eq!(stats.total_skipped(), 0);
    }
}
