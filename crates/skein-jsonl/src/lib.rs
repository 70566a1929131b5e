//! Async JSON Lines helpers for skein.
//!
//! Skein keeps its records as one JSON object per line. This crate covers the
//! three ways those files are touched:
//!
//! - [`read_jsonl_resilient`]: load a whole file, skipping bad lines with a
//!   [`Warning`] instead of failing
//! - [`append_jsonl`]: add one record to the end of an append-only log
//! - [`write_jsonl_atomic`]: rewrite a file through a temp file and rename

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::write_jsonl_atomic;
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl_resilient};
pub use warning::Warning;
pub use writer::{JsonlWriter, append_jsonl};
