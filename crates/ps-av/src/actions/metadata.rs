//! Tag carry-over between source and converted files.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Copy tags from `source` onto `target` with exiftool.
///
/// Callers treat a failure here as non-fatal: a converted file without its
/// tags is still worth importing, so errors are logged and swallowed at the
/// call site rather than aborting the pipeline.
pub async fn copy_metadata(
    tools: &ToolRegistry,
    source: &Path,
    target: &Path,
    timeout: Duration,
) -> ps_core::Result<()> {
    let exiftool = tools.require("exiftool")?;
    tracing::debug!("copy metadata {:?} -> {:?}", source, target);

    let mut cmd = ToolCommand::new(exiftool.path.clone());
    cmd.args(["-overwrite_original", "-TagsFromFile"]);
    cmd.arg(source.to_string_lossy().as_ref());
    cmd.arg(target.to_string_lossy().as_ref());
    cmd.timeout(timeout);
    cmd.execute().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_exiftool_is_an_error() {
        let tools = ToolRegistry::from_paths(std::iter::empty());
        let err = copy_metadata(
            &tools,
            Path::new("/a/src.jpg"),
            Path::new("/a/dst.heic"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("exiftool"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tags_are_copied_from_source() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("args.log");
        let path = dir.path().join("exiftool");
        let body = format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display());
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let tools = ToolRegistry::from_paths([("exiftool".to_string(), path)]);

        copy_metadata(
            &tools,
            Path::new("/a/src.jpg"),
            Path::new("/a/dst.heic"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let args = std::fs::read_to_string(&log).unwrap();
        assert!(
            args.contains("-overwrite_original -TagsFromFile /a/src.jpg /a/dst.heic"),
            "args: {args}"
        );
    }
}
