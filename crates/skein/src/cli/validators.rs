//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::MAX_DESCRIPTION_LENGTH;
use crate::id_generation::{DEPENDENCY_ID_PREFIX, validate_id};
use chrono::{DateTime, NaiveDate, Utc};

/// Validate an issue ID.
///
/// Issue IDs are opaque here, so only obviously broken input is rejected:
/// empty strings, whitespace and control characters.
pub fn validate_issue_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Issue ID cannot be empty".to_string());
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("Issue ID '{s}' cannot contain whitespace"));
    }

    if s.chars().any(char::is_control) {
        return Err("Issue ID cannot contain control characters".to_string());
    }

    Ok(s.to_string())
}

/// Validate a dependency ID (`dep-` followed by 6-8 base36 characters).
pub fn validate_dependency_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if validate_id(s, DEPENDENCY_ID_PREFIX) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Invalid dependency ID: '{s}'. Expected format: {DEPENDENCY_ID_PREFIX}-xxxxxx (6-8 lowercase letters or digits)"
        ))
    }
}

/// Validate a dependency description.
///
/// Newlines are allowed; other control characters are not.
pub fn validate_description(s: &str) -> Result<String, String> {
    if s.len() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters, got {}",
            s.len()
        ));
    }

    if let Some(pos) = s
        .chars()
        .position(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(format!(
            "Description contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate an actor name.
pub fn validate_actor(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Actor cannot be empty".to_string());
    }
    if s.chars().any(char::is_control) {
        return Err("Actor cannot contain control characters".to_string());
    }
    Ok(s.to_string())
}

/// Parse a timestamp: RFC 3339, or a plain `YYYY-MM-DD` date meaning
/// midnight UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            format!("Invalid timestamp '{s}'. Expected RFC 3339 (2026-01-31T12:00:00Z) or YYYY-MM-DD")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case::simple("proj-abc", "proj-abc")]
    #[case::trimmed("  proj-abc  ", "proj-abc")]
    #[case::opaque("ISSUE_42", "ISSUE_42")]
    #[case::nested("team/proj-9", "team/proj-9")]
    fn test_validate_issue_id_valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate_issue_id(input).unwrap(), expected);
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::blank("   ", "empty")]
    #[case::space("proj abc", "whitespace")]
    #[case::control("proj\u{7}abc", "control")]
    fn test_validate_issue_id_invalid(#[case] input: &str, #[case] expected: &str) {
        let err = validate_issue_id(input).unwrap_err().to_lowercase();
        assert!(err.contains(expected), "got: {err}");
    }

    #[rstest]
    #[case::six("dep-abc123", true)]
    #[case::eight("dep-abcd1234", true)]
    #[case::short("dep-abc", false)]
    #[case::upper("dep-ABC123", false)]
    #[case::wrong_prefix("proj-abc123", false)]
    #[case::no_prefix("abc123", false)]
    fn test_validate_dependency_id(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(validate_dependency_id(input).is_ok(), ok);
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("multi\nline\ttext").is_ok());
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH)).is_ok());

        let err = validate_description(&"x".repeat(MAX_DESCRIPTION_LENGTH + 1)).unwrap_err();
        assert!(err.contains("cannot exceed"));

        let err = validate_description("bell\u{7}").unwrap_err();
        assert!(err.contains("position 4"));
    }

    #[test]
    fn test_validate_actor() {
        assert_eq!(validate_actor(" alice ").unwrap(), "alice");
        assert!(validate_actor("  ").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("2026-03-01T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2026-03-01").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
