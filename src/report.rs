//! End-of-run summary printed after the last file is handled.

use std::fmt::Write as _;
use std::path::Path;

use crate::stats::RunStatistics;

/// Render the grouped summary as one block of text.
pub fn render_summary(
    stats: &RunStatistics,
    staging_dir: Option<&Path>,
    skip_log: Option<&Path>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Scan");
    let _ = writeln!(out, "  Files scanned:        {}", stats.total_files_scanned);
    let _ = writeln!(out, "  Text files:           {}", stats.total_text_files);
    let _ = writeln!(out, "  Binary files:         {}", stats.total_binary_files);

    let _ = writeln!(out, "\nDetection");
    let _ = writeln!(out, "  Media detected:       {}", stats.total_media_detected);
    let _ = writeln!(out, "  Compatible:           {}", stats.media_compatible);
    let _ = writeln!(out, "  Need conversion:      {}", stats.media_incompatible);

    let _ = writeln!(out, "\nConversion");
    let _ = writeln!(out, "  Attempted:            {}", stats.conversion_attempted);
    let _ = writeln!(out, "  Succeeded:            {}", stats.conversion_succeeded);
    let _ = writeln!(out, "  Failed:               {}", stats.conversion_failed);

    let _ = writeln!(out, "\nImport");
    let _ = writeln!(out, "  Imported:             {}", stats.total_imported);
    let _ = writeln!(
        out,
        "    without conversion: {}",
        stats.imported_without_conversion
    );
    let _ = writeln!(
        out,
        "    after conversion:   {}",
        stats.imported_after_conversion
    );
    let _ = writeln!(out, "  Refused by importer:  {}", stats.refused_by_importer);

    let _ = writeln!(out, "\nSkipped ({} total)", stats.total_skipped());
    let _ = writeln!(out, "  Unknown format:       {}", stats.skipped_unknown_format);
    let _ = writeln!(
        out,
        "  Corrupt or empty:     {}",
        stats.skipped_corrupt_or_empty
    );
    let _ = writeln!(out, "  Conversion failed:    {}", stats.conversion_failed);
    let _ = writeln!(out, "  Unsupported:          {}", stats.skipped_other);
    let _ = writeln!(out, "  Errors:               {}", stats.skipped_errors);

    if staging_dir.is_some() || skip_log.is_some() {
        let _ = writeln!(out);
    }
    if let Some(dir) = staging_dir {
        let _ = writeln!(out, "Staging directory: {}", dir.display());
    }
    if let Some(log) = skip_log {
        let _ = writeln!(out, "Skip log: {}", log.display());
    }

    out
}

pub fn print_summary(
    stats: &RunStatistics,
    staging_dir: Option<&Path>,
    skip_log: Option<&Path>,
) {
    println!("\n{}", render_summary(stats, staging_dir, skip_log));
}
