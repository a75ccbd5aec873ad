//! The end-to-end run driver: walk, filter, classify, stage, convert,
//! import, and report, one file at a time in scan order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;

use ps_av::ToolRegistry;
use ps_core::config::Config;
use ps_core::{Error, MediaFile, Result};
use ps_rules::{load_rules_file, RuleEngine};

use crate::classify::Classifier;
use crate::convert::ConversionPipeline;
use crate::importer::{LibraryImporter, ManifestImporter};
use crate::report;
use crate::scan::{self, Prefilter};
use crate::skiplog::SkipLog;
use crate::staging::{self, StagingArea};
use crate::stats::RunStatistics;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scan_root: PathBuf,
    /// Classify and report only; nothing is staged, converted, or imported.
    pub dry_run: bool,
}

/// Process every file under the scan root and return the run's counters.
///
/// Per-file failures are logged and counted, never fatal; only setup
/// problems (bad scan root, unreadable rules file, staging directory
/// creation) abort the run.
pub async fn execute(config: &Config, options: RunOptions) -> Result<RunStatistics> {
    let scan_root = options.scan_root.canonicalize().map_err(|e| {
        Error::Config(format!(
            "scan root {}: {e}",
            options.scan_root.display()
        ))
    })?;

    let run_token = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    if options.dry_run {
        tracing::info!("Run {} over {:?} (dry run)", run_token, scan_root);
    } else {
        tracing::info!("Run {} over {:?}", run_token, scan_root);
    }

    let tools = ToolRegistry::discover(&config.tools);
    let engine = match &config.rules.rules_file {
        Some(path) => RuleEngine::new(load_rules_file(path)?),
        None => RuleEngine::builtin(),
    };
    let classifier = Classifier::new(config, &tools, engine);
    let text_exempt = classifier.rule_extensions();
    let pipeline = ConversionPipeline::new(config, &tools);

    let files = scan::collect_files(
        &scan_root,
        &config.staging.dir_prefix,
        &config.import.manifest_name,
    );
    tracing::info!("Found {} files to examine", files.len());

    let mut staging = if options.dry_run {
        None
    } else {
        Some(StagingArea::create(&scan_root, &config.staging, &run_token)?)
    };
    let mut skip_log = SkipLog::new(
        &staging::staging_parent(&scan_root, &config.staging),
        &run_token,
    );

    let interrupted = interrupt_flag();
    let mut stats = RunStatistics::new();
    // Staged records waiting for the import batch; the bool marks files
    // that went through a conversion.
    let mut staged: Vec<(MediaFile, bool)> = Vec::new();

    for path in &files {
        if interrupted.load(Ordering::SeqCst) {
            tracing::warn!(
                "Interrupted; stopping before {:?} (staged files are kept)",
                path
            );
            break;
        }
        stats.total_files_scanned += 1;

        let filter = scan::prefilter(path, &text_exempt);
        if let Some(reason) = filter.skip_reason() {
            match filter {
                Prefilter::Text => stats.total_text_files += 1,
                _ => stats.record_skip(filter_skip_category(filter)),
            }
            skip_log.record(path, reason);
            tracing::debug!("Skipping {:?}: {}", path, reason);
            continue;
        }
        stats.total_binary_files += 1;

        let mut media = match classifier.classify(path).await {
            Ok(media) => media,
            Err(e) => {
                reject(&mut stats, &mut skip_log, path, &e);
                continue;
            }
        };
        stats.total_media_detected += 1;
        if media.compatible {
            stats.media_compatible += 1;
        } else {
            stats.media_incompatible += 1;
        }

        if options.dry_run {
            tracing::info!(
                "[dry run] {:?}: {} ({}, rule {})",
                path,
                media.format_name,
                media.action,
                media.rule_id
            );
            continue;
        }
        let area = match staging.as_mut() {
            Some(area) => area,
            None => continue,
        };

        if let Err(e) = area.stage(&mut media) {
            reject(&mut stats, &mut skip_log, path, &e);
            continue;
        }

        let mut converted = false;
        if media.requires_processing {
            if area.archives_originals() {
                if let Err(e) = area.archive_original(&media) {
                    tracing::warn!("Cannot archive original of {:?}: {}", path, e);
                }
            }
            stats.conversion_attempted += 1;
            match pipeline.process(&mut media).await {
                Ok(()) => {
                    stats.conversion_succeeded += 1;
                    converted = true;
                }
                Err(e) => {
                    // The staged original stays for manual follow-up.
                    reject(&mut stats, &mut skip_log, path, &e);
                    continue;
                }
            }
        }
        staged.push((media, converted));
    }

    if let Some(area) = staging.as_ref() {
        if config.import.enabled && !staged.is_empty() {
            let importer = ManifestImporter::new(area.dir(), &config.import.manifest_name);
            import_batch(&importer, &staged, &mut stats, &mut skip_log);
        }
    }

    let skip_log_path = skip_log.exists().then(|| skip_log.path().to_path_buf());
    report::print_summary(
        &stats,
        staging.as_ref().map(|a| a.dir()),
        skip_log_path.as_deref(),
    );
    Ok(stats)
}

fn import_batch(
    importer: &dyn LibraryImporter,
    staged: &[(MediaFile, bool)],
    stats: &mut RunStatistics,
    skip_log: &mut SkipLog,
) {
    let paths: Vec<PathBuf> = staged
        .iter()
        .map(|(media, _)| media.current_path().to_path_buf())
        .collect();
    let converted: HashMap<&Path, bool> = staged
        .iter()
        .map(|(media, was_converted)| (media.current_path(), *was_converted))
        .collect();

    match importer.import(&paths) {
        Ok(outcome) => {
            for path in &outcome.accepted {
                stats.total_imported += 1;
                if converted.get(path.as_path()).copied().unwrap_or(false) {
                    stats.imported_after_conversion += 1;
                } else {
                    stats.imported_without_conversion += 1;
                }
            }
            for (path, reason) in &outcome.refused {
                stats.refused_by_importer += 1;
                skip_log.record(path, &format!("importer refused: {reason}"));
                tracing::warn!("Importer refused {:?}: {}", path, reason);
            }
        }
        Err(e) => {
            tracing::error!("Import batch failed: {}", e);
            for path in &paths {
                stats.refused_by_importer += 1;
                skip_log.record(path, &format!("importer refused: {e}"));
            }
        }
    }
}

fn reject(stats: &mut RunStatistics, skip_log: &mut SkipLog, path: &Path, error: &Error) {
    stats.record_skip(error.skip_category());
    skip_log.record(path, &error.to_string());
    tracing::info!("Skipping {:?}: {}", path, error);
}

fn filter_skip_category(filter: Prefilter) -> ps_core::SkipCategory {
    match filter {
        Prefilter::Empty => ps_core::SkipCategory::CorruptOrEmpty,
        Prefilter::Unreadable => ps_core::SkipCategory::Error,
        Prefilter::Archive => ps_core::SkipCategory::Unsupported,
        Prefilter::Text | Prefilter::Binary => ps_core::SkipCategory::Error,
    }
}

/// Spawn a watcher that flips the flag on Ctrl-C (or SIGTERM on unix);
/// the driver checks it between files.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watched = flag.clone();
    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        tracing::warn!("Shutdown signal received; finishing the current file");
        watched.store(true, Ordering::SeqCst);
    });
    flag
}
