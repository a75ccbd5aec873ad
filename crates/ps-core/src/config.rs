//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for tools, timeouts, staging, rules, and import. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub timeouts: TimeoutsConfig,
    pub staging: StagingConfig,
    pub rules: RulesConfig,
    pub import: ImportConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.timeouts.detect_secs == 0 {
            warnings.push("timeouts.detect_secs is 0; detectors will always time out".into());
        }
        if self.timeouts.probe_secs == 0 {
            warnings.push("timeouts.probe_secs is 0; probing will always time out".into());
        }
        if self.timeouts.convert_secs == 0 {
            warnings.push("timeouts.convert_secs is 0; conversions will always time out".into());
        }

        if self.staging.dir_prefix.is_empty() {
            warnings.push("staging.dir_prefix is empty; run directories will be bare tokens".into());
        }

        if self.import.enabled && self.import.manifest_name.is_empty() {
            warnings.push("import.manifest_name is empty but import is enabled".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
///
/// Unset entries are discovered on `PATH`; a tool that is neither configured
/// nor on `PATH` is simply unavailable (detectors degrade, transforms that
/// need it fail per file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub magick_path: Option<PathBuf>,
    pub exiftool_path: Option<PathBuf>,
    pub heif_enc_path: Option<PathBuf>,
    pub djxl_path: Option<PathBuf>,
    pub file_path: Option<PathBuf>,
    pub binwalk_path: Option<PathBuf>,
}

/// Wall-clock limits for the three subprocess classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Signature detectors (file, binwalk).
    #[serde(default = "default_detect_secs")]
    pub detect_secs: u64,
    /// Stream probing and the bounded corruption decode.
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,
    /// Conversion transforms.
    #[serde(default = "default_convert_secs")]
    pub convert_secs: u64,
}

fn default_detect_secs() -> u64 {
    30
}
fn default_probe_secs() -> u64 {
    60
}
fn default_convert_secs() -> u64 {
    3600
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            detect_secs: default_detect_secs(),
            probe_secs: default_probe_secs(),
            convert_secs: default_convert_secs(),
        }
    }
}

/// Staging directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Parent directory for run directories; defaults to the scan
    /// root's parent.
    pub output_root: Option<PathBuf>,
    /// Run directory name prefix; the run token is appended.
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
    /// Archive pre-conversion files into an ORIGINALS subdirectory.
    #[serde(default = "default_true")]
    pub archive_originals: bool,
}

fn default_dir_prefix() -> String {
    "staged-media".into()
}
fn default_true() -> bool {
    true
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            dir_prefix: default_dir_prefix(),
            archive_originals: true,
        }
    }
}

/// Rule table source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// JSON file with an ordered rule array replacing the built-in table.
    pub rules_file: Option<PathBuf>,
}

/// Library import hand-off settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// When false, the run stops after conversion (files stay staged).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Manifest filename written into the staging directory.
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
}

fn default_manifest_name() -> String {
    "import_manifest.json".into()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            manifest_name: default_manifest_name(),
        }
    }
}
