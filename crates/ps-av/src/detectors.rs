//! Subprocess-backed format detectors: file(1) and binwalk.
//!
//! Both implement [`ps_detect::Detector`] so the signature collector can mix
//! them with the built-in byte sniffers. A missing binary means the detector
//! is simply not registered; a runtime failure folds into an error vote and
//! never aborts the pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ps_detect::{
    extension_for_description, extension_for_mime, Detector, DetectorId, FormatVote,
};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Detector backed by the `file` command.
///
/// Issues two invocations per file: `file --brief --mime-type` for the MIME
/// type and `file --brief` for the human-readable description.
#[derive(Debug, Clone)]
pub struct FileDetector {
    file_path: PathBuf,
    timeout: Duration,
}

impl FileDetector {
    pub fn new(file_path: PathBuf, timeout: Duration) -> Self {
        Self { file_path, timeout }
    }

    /// Build from a discovered registry; `None` when file(1) is unavailable.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Option<Self> {
        tools
            .require("file")
            .ok()
            .map(|cfg| Self::new(cfg.path.clone(), timeout))
    }

    async fn run_brief(&self, path: &Path, mime: bool) -> ps_core::Result<String> {
        let mut cmd = ToolCommand::new(self.file_path.clone());
        cmd.arg("--brief");
        if mime {
            cmd.arg("--mime-type");
        }
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(self.timeout);
        let output = cmd.execute().await?;
        Ok(output.stdout.trim().to_string())
    }
}

#[async_trait]
impl Detector for FileDetector {
    fn id(&self) -> DetectorId {
        DetectorId::File
    }

    async fn identify(&self, path: &Path) -> FormatVote {
        let mime = match self.run_brief(path, true).await {
            Ok(s) => s,
            Err(e) => return FormatVote::failed(DetectorId::File, e.to_string()),
        };
        let description = match self.run_brief(path, false).await {
            Ok(s) => s,
            Err(e) => return FormatVote::failed(DetectorId::File, e.to_string()),
        };

        // file(1) answers "data"/"application/octet-stream" for anything it
        // cannot name; such answers carry no format information.
        let mime = {
            let normalized = mime.to_ascii_lowercase();
            (!normalized.is_empty() && normalized != "application/octet-stream")
                .then_some(normalized)
        };
        let description = (!description.is_empty() && description != "data").then_some(description);
        if mime.is_none() && description.is_none() {
            return FormatVote::empty(DetectorId::File);
        }

        let extension = mime
            .as_deref()
            .and_then(extension_for_mime)
            .or_else(|| description.as_deref().and_then(extension_for_description))
            .map(str::to_string);

        FormatVote {
            detector: DetectorId::File,
            mime,
            extension,
            description,
            kind: None,
            error: None,
        }
    }
}

/// Detector backed by binwalk's embedded-signature scan.
///
/// Runs `binwalk --signature --length 0` and keeps the first row of the
/// signature table. Binwalk exits 1 when nothing matched; that is a miss,
/// not a failure.
#[derive(Debug, Clone)]
pub struct BinwalkDetector {
    binwalk_path: PathBuf,
    timeout: Duration,
}

impl BinwalkDetector {
    pub fn new(binwalk_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binwalk_path,
            timeout,
        }
    }

    /// Build from a discovered registry; `None` when binwalk is unavailable.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Option<Self> {
        tools
            .require("binwalk")
            .ok()
            .map(|cfg| Self::new(cfg.path.clone(), timeout))
    }
}

#[async_trait]
impl Detector for BinwalkDetector {
    fn id(&self) -> DetectorId {
        DetectorId::Binwalk
    }

    async fn identify(&self, path: &Path) -> FormatVote {
        let mut cmd = ToolCommand::new(self.binwalk_path.clone());
        cmd.args(["--signature", "--length", "0"]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(self.timeout);

        let output = match cmd.execute_unchecked().await {
            Ok(o) => o,
            Err(e) => return FormatVote::failed(DetectorId::Binwalk, e.to_string()),
        };
        if !matches!(output.status.code(), Some(0) | Some(1)) {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("exited with status {}", output.status)
            } else {
                stderr.to_string()
            };
            return FormatVote::failed(DetectorId::Binwalk, message);
        }

        match first_signature(&output.stdout) {
            Some(description) => {
                let extension = extension_for_description(&description).map(str::to_string);
                FormatVote {
                    detector: DetectorId::Binwalk,
                    mime: None,
                    extension,
                    description: Some(description),
                    kind: None,
                    error: None,
                }
            }
            None => FormatVote::failed(DetectorId::Binwalk, "no signature match"),
        }
    }
}

/// First data row of binwalk's `DECIMAL  HEXADECIMAL  DESCRIPTION` table.
fn first_signature(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let stripped = line.trim();
        if stripped.is_empty()
            || stripped.to_uppercase().starts_with("DECIMAL")
            || stripped.starts_with("--")
        {
            continue;
        }
        let mut fields = stripped.split_whitespace();
        let Some(offset) = fields.next() else { continue };
        if offset.parse::<u64>().is_err() || fields.next().is_none() {
            continue;
        }
        let description = fields.collect::<Vec<_>>().join(" ");
        if !description.is_empty() {
            return Some(description);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINWALK_TABLE: &str = "\
DECIMAL       HEXADECIMAL     DESCRIPTION
--------------------------------------------------------------------------------
0             0x0             PNG image, 1920 x 1080, 8-bit/color RGBA, non-interlaced
41            0x29            Zlib compressed data, best compression
";

    #[test]
    fn first_signature_picks_first_data_row() {
        assert_eq!(
            first_signature(BINWALK_TABLE).as_deref(),
            Some("PNG image, 1920 x 1080, 8-bit/color RGBA, non-interlaced")
        );
    }

    #[test]
    fn first_signature_skips_header_only_output() {
        let stdout = "DECIMAL       HEXADECIMAL     DESCRIPTION\n----------\n\n";
        assert_eq!(first_signature(stdout), None);
        assert_eq!(first_signature(""), None);
    }

    #[test]
    fn from_registry_absent_tool() {
        let registry = ToolRegistry::from_paths(std::iter::empty());
        assert!(FileDetector::from_registry(&registry, Duration::from_secs(5)).is_none());
        assert!(BinwalkDetector::from_registry(&registry, Duration::from_secs(5)).is_none());
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_detector_parses_stub_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "file",
            "#!/bin/sh\nif [ \"$2\" = \"--mime-type\" ]; then\n  echo image/png\nelse\n  echo 'PNG image data, 8-bit/color RGBA'\nfi\n",
        );
        let detector = FileDetector::new(script, Duration::from_secs(5));
        let vote = detector.identify(Path::new("/tmp/whatever.bin")).await;
        assert!(vote.error.is_none());
        assert_eq!(vote.mime.as_deref(), Some("image/png"));
        assert_eq!(vote.extension.as_deref(), Some(".png"));
        assert!(vote.description.as_deref().unwrap().contains("PNG image"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_catch_all_answers_are_empty_votes() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "file",
            "#!/bin/sh\nif [ \"$2\" = \"--mime-type\" ]; then\n  echo application/octet-stream\nelse\n  echo data\nfi\n",
        );
        let detector = FileDetector::new(script, Duration::from_secs(5));
        let vote = detector.identify(Path::new("/tmp/mystery.bin")).await;
        assert!(vote.error.is_none());
        assert!(!vote.is_usable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn binwalk_detector_parses_stub_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "binwalk",
            "#!/bin/sh\nprintf 'DECIMAL       HEXADECIMAL     DESCRIPTION\\n----\\n0    0x0    JPEG image data, JFIF standard 1.01\\n'\n",
        );
        let detector = BinwalkDetector::new(script, Duration::from_secs(5));
        let vote = detector.identify(Path::new("/tmp/whatever.bin")).await;
        assert!(vote.error.is_none());
        assert_eq!(
            vote.description.as_deref(),
            Some("JPEG image data, JFIF standard 1.01")
        );
        assert_eq!(vote.extension.as_deref(), Some(".jpg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn binwalk_no_match_is_an_error_vote() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "binwalk", "#!/bin/sh\nexit 1\n");
        let detector = BinwalkDetector::new(script, Duration::from_secs(5));
        let vote = detector.identify(Path::new("/tmp/whatever.bin")).await;
        assert_eq!(vote.error.as_deref(), Some("no signature match"));
        assert!(!vote.is_usable());
    }
}
