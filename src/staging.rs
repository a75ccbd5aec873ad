//! Run-scoped staging directory with collision-free naming.
//!
//! Accepted files move out of the scanned tree into one directory per run.
//! Names are the bare source stem plus the classified extension; collisions
//! get an `_N` disambiguator, and hostile names (non-ASCII, control bytes,
//! oversized) are rewritten deterministically. Nothing here ever overwrites
//! an existing file.

use std::path::{Path, PathBuf};

use ps_core::config::StagingConfig;
use ps_core::{Error, MediaFile, Result};

/// Stems longer than this are rewritten; keeps paths safe on every
/// filesystem the staged files may land on.
const MAX_STEM_LEN: usize = 120;

/// Subdirectory receiving audit copies of files that still need conversion.
const ORIGINALS_DIR: &str = "ORIGINALS";

/// One run's staging directory and its naming state.
pub struct StagingArea {
    dir: PathBuf,
    run_token: String,
    archive_originals: bool,
    sanitize_seq: u32,
}

/// Where run artifacts land: `staging.output_root` when configured,
/// else the scan root's parent. Skip logs share this parent so a dry
/// run can write one without creating the staging directory.
pub fn staging_parent(scan_root: &Path, config: &StagingConfig) -> PathBuf {
    match &config.output_root {
        Some(root) => root.clone(),
        None => scan_root
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(scan_root)
            .to_path_buf(),
    }
}

impl StagingArea {
    /// Create `<parent>/<dir_prefix>-<run_token>` under [`staging_parent`].
    pub fn create(scan_root: &Path, config: &StagingConfig, run_token: &str) -> Result<Self> {
        let dir = staging_parent(scan_root, config)
            .join(format!("{}-{}", config.dir_prefix, run_token));
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::staging(format!(
                "cannot create staging directory {}: {e}",
                dir.display()
            ))
        })?;
        tracing::info!("Staging into {:?}", dir);
        Ok(Self {
            dir,
            run_token: run_token.to_string(),
            archive_originals: config.archive_originals,
            sanitize_seq: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_token(&self) -> &str {
        &self.run_token
    }

    /// Whether pre-conversion originals should be archived.
    pub fn archives_originals(&self) -> bool {
        self.archive_originals
    }

    /// Move the file into the staging directory and record the new location
    /// in `media.stage_path`.
    ///
    /// The staged name carries the classified extension, so a JPEG that
    /// arrived as `photo.tiff` stages as `photo.jpg`.
    pub fn stage(&mut self, media: &mut MediaFile) -> Result<()> {
        let stem = media
            .source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let stem = if needs_sanitizing(stem) {
            let rewritten = self.sanitize_stem(stem);
            tracing::debug!(
                "Sanitized stem {:?} -> {:?} for {:?}",
                stem,
                rewritten,
                media.source_path
            );
            rewritten
        } else {
            stem.to_string()
        };

        let target = unique_path(&self.dir, &stem, &media.extension);
        move_file(&media.source_path, &target)?;
        tracing::debug!("Staged {:?} as {:?}", media.source_path, target);
        media.stage_path = Some(target);
        Ok(())
    }

    /// Copy the staged, pre-conversion file into `ORIGINALS/` for audit.
    ///
    /// Conversion never reads from this archive.
    pub fn archive_original(&self, media: &MediaFile) -> Result<PathBuf> {
        let source = media.current_path();
        let archive_dir = self.dir.join(ORIGINALS_DIR);
        std::fs::create_dir_all(&archive_dir).map_err(|e| {
            Error::staging(format!(
                "cannot create archive directory {}: {e}",
                archive_dir.display()
            ))
        })?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("original");
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let target = unique_path(&archive_dir, stem, &extension);
        std::fs::copy(source, &target).map_err(|e| {
            Error::staging(format!("cannot archive original {}: {e}", source.display()))
        })?;
        tracing::debug!("Archived original {:?} as {:?}", source, target);
        Ok(target)
    }

    /// Rewrite a hostile stem: ASCII-filtered transliteration plus a suffix
    /// from the run token and a per-run sequence number.
    fn sanitize_stem(&mut self, stem: &str) -> String {
        let mut base = String::new();
        let mut gap = false;
        for c in stem.chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                base.push(c);
                gap = false;
            } else if !gap {
                base.push('_');
                gap = true;
            }
        }
        let base = base.trim_matches('_');

        self.sanitize_seq += 1;
        let digits: String = self
            .run_token
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        let token_tail = &digits[digits.len().saturating_sub(6)..];
        let suffix = format!("_{token_tail}{:04}", self.sanitize_seq);

        let budget = MAX_STEM_LEN.saturating_sub(suffix.len());
        let mut out: String = base.chars().take(budget).collect();
        if out.is_empty() {
            out.push_str("file");
        }
        out.push_str(&suffix);
        out
    }
}

/// First free path `dir/stem<ext>`, `dir/stem_1<ext>`, `dir/stem_2<ext>`...
///
/// `extension` carries its leading dot; an empty string means no extension.
pub fn unique_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}{extension}"));
    let mut n = 0u32;
    while candidate.exists() {
        n += 1;
        candidate = dir.join(format!("{stem}_{n}{extension}"));
    }
    candidate
}

/// Rename, falling back to copy+delete for cross-device moves.
fn move_file(source: &Path, target: &Path) -> Result<()> {
    if std::fs::rename(source, target).is_ok() {
        return Ok(());
    }
    std::fs::copy(source, target)
        .map_err(|e| Error::staging(format!("cannot stage {}: {e}", source.display())))?;
    std::fs::remove_file(source).map_err(|e| {
        Error::staging(format!(
            "staged copy of {} left behind, source not removed: {e}",
            source.display()
        ))
    })?;
    Ok(())
}

fn needs_sanitizing(stem: &str) -> bool {
    if stem.is_empty() || stem.len() > MAX_STEM_LEN {
        return true;
    }
    stem.chars().any(|c| {
        !c.is_ascii()
            || c.is_ascii_control()
            || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
    })
}
