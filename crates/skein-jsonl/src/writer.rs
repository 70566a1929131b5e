//! JSONL writing operations.
//!
//! [`JsonlWriter`] serializes values one per line through a buffered writer.
//! [`append_jsonl`] is the append-only entry point used for audit logs.

use crate::Result;
use serde::Serialize;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Async writer for JSONL (JSON Lines) data.
///
/// Values are written in compact JSON form followed by `\n`. Call
/// [`flush`](Self::flush) before dropping, buffered bytes are otherwise lost.
pub struct JsonlWriter<W> {
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> JsonlWriter<W> {
    /// Creates a new `JsonlWriter` wrapping the given async writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Serializes one value as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub async fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let line = serde_json::to_vec(value)?;
        self.writer.write_all(&line).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Serializes every value from the iterator, one per line.
    ///
    /// # Errors
    ///
    /// Stops at the first serialization or write failure.
    pub async fn write_all<T, I>(&mut self, values: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.write(&value).await?;
        }
        Ok(())
    }

    /// Flushes buffered data to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying writer.
    ///
    /// Buffered data that has not been flushed is discarded.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Appends a single value as a new line, creating the file if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened for appending or the value
/// cannot be serialized or written.
pub async fn append_jsonl<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .await?;
    let mut writer = JsonlWriter::new(file);
    writer.write(value).await?;
    writer.flush().await
}
