//! Vote from the `infer` crate's pure-Rust signature matcher.

use std::path::Path;

use async_trait::async_trait;
use infer::MatcherType;
use ps_core::MediaKind;

use crate::consensus::is_raw_extension;
use crate::content::read_prefix;
use crate::detector::Detector;
use crate::vote::{normalize_extension, DetectorId, FormatVote};

/// `infer` only needs the first few KiB to match its signature set.
const PREFIX_LEN: usize = 8192;

/// Always-available detector wrapping [`infer::get`].
#[derive(Debug, Default)]
pub struct InferDetector;

impl InferDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Detector for InferDetector {
    fn id(&self) -> DetectorId {
        DetectorId::Infer
    }

    async fn identify(&self, path: &Path) -> FormatVote {
        let buf = match read_prefix(path, PREFIX_LEN) {
            Ok(buf) => buf,
            Err(e) => return FormatVote::failed(DetectorId::Infer, e.to_string()),
        };
        let Some(ty) = infer::get(&buf) else {
            return FormatVote::empty(DetectorId::Infer);
        };

        let extension = normalize_extension(ty.extension());
        // infer files camera raws under its image matcher; the pipeline
        // treats raw as its own kind.
        let kind = if is_raw_extension(&extension) {
            Some(MediaKind::Raw)
        } else {
            match ty.matcher_type() {
                MatcherType::Image => Some(MediaKind::Image),
                MatcherType::Video => Some(MediaKind::Video),
                MatcherType::Audio => Some(MediaKind::Audio),
                _ => None,
            }
        };

        FormatVote {
            detector: DetectorId::Infer,
            mime: Some(ty.mime_type().to_string()),
            extension: Some(extension),
            description: None,
            kind,
            error: None,
        }
    }
}
