//! Hand-off boundary to the photo library.
//!
//! The run driver delivers one batch of staged, already-compatible files
//! and gets back a per-file verdict. The default [`ManifestImporter`]
//! records the batch as a JSON manifest in the staging directory so an
//! external library tool can consume it later; it never refuses a file
//! itself.

use std::path::{Path, PathBuf};

use serde::Serialize;

use ps_core::{Error, Result};

/// Per-file outcome of one import batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: Vec<PathBuf>,
    /// Files the importer would not take, with the reason it gave.
    pub refused: Vec<(PathBuf, String)>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.refused.is_empty()
    }
}

/// One batch call per run; files are absolute staged paths.
pub trait LibraryImporter {
    fn import(&self, files: &[PathBuf]) -> Result<ImportReport>;
}

#[derive(Serialize)]
struct ImportManifest<'a> {
    created_at: String,
    staging_dir: &'a Path,
    files: &'a [PathBuf],
}

/// Writes `<staging_dir>/<manifest_name>` listing every staged file and
/// accepts the whole batch. The real library hand-off reads the manifest.
pub struct ManifestImporter {
    staging_dir: PathBuf,
    manifest_name: String,
}

impl ManifestImporter {
    pub fn new(staging_dir: impl Into<PathBuf>, manifest_name: impl Into<String>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            manifest_name: manifest_name.into(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir.join(&self.manifest_name)
    }
}

impl LibraryImporter for ManifestImporter {
    fn import(&self, files: &[PathBuf]) -> Result<ImportReport> {
        let manifest = ImportManifest {
            created_at: chrono::Local::now().to_rfc3339(),
            staging_dir: &self.staging_dir,
            files,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| Error::staging(format!("cannot encode import manifest: {e}")))?;

        let path = self.manifest_path();
        std::fs::write(&path, json).map_err(|e| {
            Error::staging(format!("cannot write import manifest {}: {e}", path.display()))
        })?;
        tracing::info!("Wrote import manifest {:?} ({} files)", path, files.len());

        Ok(ImportReport {
            accepted: files.to_vec(),
            refused: Vec::new(),
        })
    }
}
