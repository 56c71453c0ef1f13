//! Log file sink.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::error::{Error, Result};

/// Open `path` for appending behind a background writer.
///
/// The file keeps its exact name (no rotation suffix). Events are flushed
/// when the returned guard is dropped.
pub fn log_file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config(format!("Log path {} has no file name", path.display())))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| Error::Config(format!("Cannot open log file {}: {}", path.display(), e)))?;

    Ok(tracing_appender::non_blocking(appender))
}
