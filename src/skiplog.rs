//! Per-run append-only log of rejected and failed files.
//!
//! One `path<TAB>reason` line per file, written for post-run audit. The
//! pipeline never reads it back.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only skip log, created lazily on the first record.
///
/// A run that rejects nothing leaves no log file behind.
pub struct SkipLog {
    path: PathBuf,
    file: Option<File>,
}

impl SkipLog {
    /// Log at `<dir>/skipped_files_<run_token>.log`.
    pub fn new(dir: &Path, run_token: &str) -> Self {
        Self {
            path: dir.join(format!("skipped_files_{run_token}.log")),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any record has been written yet.
    pub fn exists(&self) -> bool {
        self.file.is_some()
    }

    /// Append one `path<TAB>reason` line.
    ///
    /// Write failures are logged and swallowed; a broken audit log must not
    /// stop the run.
    pub fn record(&mut self, file: &Path, reason: &str) {
        let line = format!("{}\t{}\n", file.display(), sanitize_reason(reason));
        if let Err(e) = self.append(&line) {
            tracing::warn!("Cannot write skip log {:?}: {}", self.path, e);
        }
    }

    fn append(&mut self, line: &str) -> std::io::Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Keep the log line-oriented: reasons collapse onto one line with the
/// tab separator reserved for the path/reason split.
fn sanitize_reason(reason: &str) -> String {
    reason
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect()
}
