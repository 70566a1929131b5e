//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Valid:  green   (resolved edges, valid graphs)
//!   - Warning/Medium: yellow  (warnings, medium risk, requires edges)
//!   - Error/Blocked:  red     (blocked issues, cycles, high risk, blocks edges)
//!   - Info/Reference: cyan    (issue and dependency IDs)
//!   - Muted:          dimmed  (field labels, timestamps)
//!   - Emphasis:       bold    (section headers)

use crate::domain::{DependencyStatus, DependencyType, RiskLevel};
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    info(id, config)
}

pub(crate) fn colorize_dep_type(dep_type: DependencyType, config: &OutputConfig) -> String {
    let text = dep_type.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match dep_type {
        DependencyType::Blocks => text.red().to_string(),
        DependencyType::Requires => text.yellow().to_string(),
    }
}

pub(crate) fn colorize_status(status: DependencyStatus, config: &OutputConfig) -> String {
    let text = status.to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        DependencyStatus::Active => text.white().to_string(),
        DependencyStatus::Resolved => text.green().to_string(),
    }
}

pub(crate) fn colorize_risk(risk: RiskLevel, config: &OutputConfig) -> String {
    let text = risk.as_str();
    if !config.use_colors {
        return text.to_string();
    }
    match risk {
        RiskLevel::None => text.dimmed().to_string(),
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::High => text.red().bold().to_string(),
    }
}

/// Status icon for an edge, with ASCII fallback.
pub(crate) fn status_icon(status: DependencyStatus, config: &OutputConfig) -> String {
    let icon = match (status, config.use_ascii) {
        (DependencyStatus::Active, true) => "o",
        (DependencyStatus::Resolved, true) => "+",
        (DependencyStatus::Active, false) => "○",
        (DependencyStatus::Resolved, false) => "✓",
    };
    match status {
        DependencyStatus::Active => icon.to_string(),
        DependencyStatus::Resolved => success(icon, config),
    }
}

/// Arrow connecting two issues, with ASCII fallback.
pub(crate) fn arrow(config: &OutputConfig) -> &'static str {
    if config.use_ascii { "->" } else { "→" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::control::set_override;
    use std::sync::{Mutex, MutexGuard};

    // colored's override is process-global
    static COLOR_MUTEX: Mutex<()> = Mutex::new(());

    struct ColorGuard<'a> {
        _guard: MutexGuard<'a, ()>,
    }

    impl ColorGuard<'_> {
        fn new() -> Self {
            let guard = COLOR_MUTEX
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            set_override(true);
            Self { _guard: guard }
        }
    }

    impl Drop for ColorGuard<'_> {
        fn drop(&mut self) {
            colored::control::unset_override();
        }
    }

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false, false)
    }

    #[test]
    fn test_semantic_colors_without_colors() {
        let config = plain();
        assert_eq!(success("ok", &config), "ok");
        assert_eq!(error("bad", &config), "bad");
        assert_eq!(warning("hmm", &config), "hmm");
        assert_eq!(info("id", &config), "id");
        assert_eq!(bold("title", &config), "title");
        assert_eq!(dimmed("label", &config), "label");
    }

    #[test]
    fn test_semantic_colors_with_colors_enabled() {
        let _guard = ColorGuard::new();
        let config = OutputConfig::new(80, false, true);

        let text = error("cycle", &config);
        assert!(text.contains("\x1b["), "expected ANSI codes in {text:?}");
        assert!(text.contains("cycle"));
        assert!(colorize_risk(RiskLevel::High, &config).contains("\x1b["));
    }

    #[test]
    fn test_plain_labels_match_domain_names() {
        let config = plain();
        assert_eq!(colorize_dep_type(DependencyType::Requires, &config), "requires");
        assert_eq!(colorize_status(DependencyStatus::Resolved, &config), "resolved");
        assert_eq!(colorize_risk(RiskLevel::Medium, &config), "medium");
    }

    #[test]
    fn test_ascii_fallback() {
        let ascii = OutputConfig::new(80, true, false);
        assert_eq!(status_icon(DependencyStatus::Active, &ascii), "o");
        assert_eq!(status_icon(DependencyStatus::Resolved, &ascii), "+");
        assert_eq!(arrow(&ascii), "->");
        assert_eq!(arrow(&plain()), "→");
    }
}
