//! Atomic rewrite of JSONL files.
//!
//! Data is written to a sibling temp file, flushed, and renamed over the
//! target. A rename within one filesystem is atomic on POSIX, so readers see
//! either the old file or the new one, never a partial write.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically replaces `path` with one JSON line per value.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created or written, a value
/// fails to serialize, or the final rename fails. On failure the original
/// file is left unchanged and the temp file is removed on a best-effort basis.
///
/// # Examples
///
/// ```no_run
/// use skein_jsonl::write_jsonl_atomic;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rows = vec![serde_json::json!({"id": 1}), serde_json::json!({"id": 2})];
/// write_jsonl_atomic("rows.jsonl", &rows).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// `deps.jsonl` becomes `deps.jsonl.tmp`; extensionless names get `.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let extension = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => OsString::from("tmp"),
    };
    temp_path.set_extension(extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await
}
