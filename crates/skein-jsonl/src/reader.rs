//! JSONL reading operations.
//!
//! [`JsonlReader`] walks a JSONL source line by line and keeps a 1-based line
//! counter so that parse failures can be reported precisely. Blank lines are
//! skipped silently in both strict and resilient modes.

use crate::{Error, Result, Warning};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// A raw line pulled from the source before JSON parsing.
enum RawLine {
    Text(String),
    InvalidUtf8,
}

/// Async reader for JSONL (JSON Lines) data.
///
/// # Examples
///
/// ```no_run
/// use skein_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("data.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_value::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 0 before any line is read, then the number of the last line read.
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buf: Vec::new(),
        }
    }

    /// Returns the number of the last line read (0 before the first read).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next non-blank line, or `None` at end of input.
    async fn next_raw_line(&mut self) -> Result<Option<RawLine>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf).await?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let Ok(text) = std::str::from_utf8(&self.buf) else {
                return Ok(Some(RawLine::InvalidUtf8));
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(RawLine::Text(trimmed.to_string())));
        }
    }

    /// Reads and deserializes the next record, failing on the first bad line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] naming the line number when a line is
    /// not valid UTF-8 or not a valid `T`, and [`Error::Io`] on read failure.
    pub async fn read_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next_raw_line().await? {
            None => Ok(None),
            Some(RawLine::InvalidUtf8) => Err(Error::InvalidFormat(format!(
                "line {}: invalid UTF-8",
                self.line_number
            ))),
            Some(RawLine::Text(line)) => serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| Error::InvalidFormat(format!("line {}: {e}", self.line_number))),
        }
    }

    /// Reads every remaining record, turning bad lines into warnings.
    ///
    /// # Errors
    ///
    /// Only I/O failures are returned as errors.
    pub async fn read_all_resilient<T: DeserializeOwned>(
        mut self,
    ) -> Result<(Vec<T>, Vec<Warning>)> {
        let mut values = Vec::new();
        let mut warnings = Vec::new();

        while let Some(raw) = self.next_raw_line().await? {
            let line_number = self.line_number;
            match raw {
                RawLine::InvalidUtf8 => warnings.push(Warning::SkippedLine {
                    line_number,
                    reason: "invalid UTF-8".to_string(),
                }),
                RawLine::Text(line) => match serde_json::from_str::<T>(&line) {
                    Ok(value) => values.push(value),
                    Err(e) => warnings.push(Warning::MalformedJson {
                        line_number,
                        error: e.to_string(),
                    }),
                },
            }
        }

        if !warnings.is_empty() {
            tracing::debug!(
                records = values.len(),
                warnings = warnings.len(),
                "Resilient JSONL read finished with warnings"
            );
        }

        Ok((values, warnings))
    }
}

/// Reads a JSONL file, skipping malformed lines instead of failing.
///
/// Returns the parsed records together with one [`Warning`] per skipped line.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read. A missing file
/// is an error here; callers that treat "no file yet" as empty should check
/// for [`std::io::ErrorKind::NotFound`].
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    JsonlReader::new(file).read_all_resilient().await
}
