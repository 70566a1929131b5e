//! Optional per-issue effort estimates.
//!
//! The impact analyzer sums these along a critical path. Issues themselves
//! live outside this crate, so estimates arrive through [`EstimateSource`];
//! the CLI reads them from `estimates.jsonl`.

use crate::domain::IssueId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use skein_jsonl::read_jsonl_resilient;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Lookup of estimated hours per issue.
pub trait EstimateSource: Send + Sync {
    /// Hours estimated for `issue`, if known.
    fn estimated_hours(&self, issue: &IssueId) -> Option<f64>;
}

impl EstimateSource for HashMap<IssueId, f64> {
    fn estimated_hours(&self, issue: &IssueId) -> Option<f64> {
        self.get(issue).copied()
    }
}

/// One line of `estimates.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    /// Estimated issue
    pub issue_id: IssueId,
    /// Estimated effort in hours
    pub estimated_hours: f64,
}

/// Read an estimates file into a lookup table.
///
/// A missing file yields an empty table. Malformed lines and negative or
/// non-finite values are skipped with a warning; a later line for the same
/// issue replaces an earlier one.
///
/// # Errors
///
/// Returns `Error::Io` if the file exists but cannot be read.
pub async fn load_estimates(path: &Path) -> Result<HashMap<IssueId, f64>> {
    let (records, warnings) = match read_jsonl_resilient::<EstimateRecord, _>(path).await {
        Ok(result) => result,
        Err(skein_jsonl::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(HashMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    for warning in &warnings {
        tracing::warn!(path = %path.display(), %warning, "Skipped estimate");
    }

    let mut table = HashMap::with_capacity(records.len());
    for record in records {
        if record.estimated_hours.is_finite() && record.estimated_hours >= 0.0 {
            table.insert(record.issue_id, record.estimated_hours);
        } else {
            tracing::warn!(
                issue = %record.issue_id,
                hours = record.estimated_hours,
                "Ignoring invalid estimate"
            );
        }
    }
    Ok(table)
}
