//! Still-image and animation transforms.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Raster formats heif-enc accepts directly.
const HEIF_ENC_INPUTS: &[&str] = &[".png", ".tif", ".tiff", ".jpg", ".jpeg", ".bmp"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Re-encode a still image to PNG via ffmpeg.
pub async fn convert_to_png(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("convert {:?} -> png", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args(["-pix_fmt", "rgba"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Flatten to a 16-bit TIFF via ImageMagick.
pub async fn convert_to_tiff(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let magick = tools.require("magick")?;
    tracing::info!("convert {:?} -> tiff", input);

    let mut cmd = ToolCommand::new(magick.path.clone());
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args(["-alpha", "on", "-depth", "16", "-flatten"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Lossless HEIC encode.
///
/// heif-enc consumes common raster formats directly; JPEG XL sources are
/// decoded to a temporary PNG with djxl first. When heif-enc cannot take the
/// source (or is not installed), ffmpeg's lossless x265 path is used instead.
pub async fn convert_to_heic_lossless(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    tracing::info!("convert {:?} -> heic (lossless)", input);

    // Keeps the djxl intermediate alive until the encode finishes.
    let mut _decoded_dir: Option<tempfile::TempDir> = None;
    let mut source: PathBuf = input.to_path_buf();

    if extension_of(input) == ".jxl" {
        if let Ok(djxl) = tools.require("djxl") {
            let dir = tempfile::tempdir()?;
            let decoded = dir.path().join("decoded.png");
            let mut cmd = ToolCommand::new(djxl.path.clone());
            cmd.arg(input.to_string_lossy().as_ref());
            cmd.arg(decoded.to_string_lossy().as_ref());
            cmd.timeout(timeout);
            cmd.execute().await?;
            source = decoded;
            _decoded_dir = Some(dir);
        }
    }

    if HEIF_ENC_INPUTS.contains(&extension_of(&source).as_str()) {
        if let Ok(heif_enc) = tools.require("heif-enc") {
            let mut cmd = ToolCommand::new(heif_enc.path.clone());
            cmd.args(["--lossless", "-o"]);
            cmd.arg(output.to_string_lossy().as_ref());
            cmd.arg(source.to_string_lossy().as_ref());
            cmd.timeout(timeout);
            cmd.execute().await?;
            return Ok(());
        }
    }

    let ffmpeg = tools.require("ffmpeg")?;
    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(source.to_string_lossy().as_ref());
    cmd.args([
        "-c:v",
        "libx265",
        "-preset",
        "slow",
        "-x265-params",
        "lossless=1",
        "-pix_fmt",
        "yuv444p10le",
    ]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

/// Animated image (GIF, APNG, animated WebP) to a lossless HEVC clip.
///
/// The scale filter rounds dimensions down to even values; x265 refuses odd
/// frame sizes.
pub async fn convert_animation_to_hevc_mp4(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    tracing::info!("convert animation {:?} -> hevc mp4", input);

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args([
        "-vf",
        "scale=trunc(iw/2)*2:trunc(ih/2)*2",
        "-c:v",
        "libx265",
        "-preset",
        "slow",
        "-x265-params",
        "lossless=1",
        "-pix_fmt",
        "yuv444p10le",
        "-an",
        "-movflags",
        "+faststart",
    ]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}
