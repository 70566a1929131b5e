//! Output formatting for CLI commands.
//!
//! Every command prints either pretty JSON (the serialized result type) or a
//! human-readable rendering. The text renderers take any [`Write`] so tests
//! can capture them.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)

pub mod color;

use crate::domain::{
    BlockingInfo, Dependency, DependencyStats, ImpactAnalysis, IssueId, RankedIssue,
    ValidationResult,
};
use crate::graph::GraphSnapshot;
use crate::storage::HistoryEntry;
use serde::Serialize;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{
    arrow, bold, colorize_dep_type, colorize_id, colorize_risk, colorize_status, dimmed,
    status_icon,
};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;
const MIN_CONTENT_WIDTH: usize = 20;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from the process environment.
    ///
    /// Reads:
    /// - `SKEIN_MAX_WIDTH`: maximum content width (default: 100)
    /// - `SKEIN_ASCII`: `1`/`true` for ASCII-only icons
    /// - `NO_COLOR`: any value disables colors
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create an `OutputConfig` from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("SKEIN_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse::<usize>() {
                Ok(width) if width >= MIN_CONTENT_WIDTH => width,
                _ => {
                    tracing::warn!(
                        env_var = "SKEIN_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = lookup("SKEIN_ASCII")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none();

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Width to wrap text at: the terminal width capped by `max_width`.
    #[must_use]
    pub fn wrap_width(&self) -> usize {
        terminal_width().min(self.max_width).max(MIN_CONTENT_WIDTH)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(usize::from(DEFAULT_TERMINAL_WIDTH), |(w, _)| usize::from(w.0))
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print `value` to stdout: as JSON, or through `render_text`.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print<T, F>(value: &T, mode: OutputMode, render_text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut dyn Write, &OutputConfig) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Json => write_json(&mut handle, value),
        OutputMode::Text => render_text(&mut handle, &OutputConfig::from_env()),
    }
}

/// Print a value as pretty JSON to stdout.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

/// Write a value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write + ?Sized, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

/// Print non-fatal warnings to stderr.
pub fn print_warnings(warnings: &[String]) {
    let config = OutputConfig::from_env();
    for message in warnings {
        eprintln!("{} {message}", warning("warning:", &config));
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

/// One-line summary of a dependency record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_dependency<W: Write + ?Sized>(
    w: &mut W,
    dep: &Dependency,
    config: &OutputConfig,
) -> io::Result<()> {
    write!(
        w,
        "{} {} {} {} {} {} [{}]",
        status_icon(dep.status, config),
        colorize_id(dep.id.as_str(), config),
        dep.source_id,
        colorize_dep_type(dep.dep_type, config),
        arrow(config),
        dep.target_id,
        colorize_status(dep.status, config),
    )?;
    if let Some(description) = &dep.description {
        write!(w, " {}", dimmed(&format!("- {description}"), config))?;
    }
    writeln!(w)
}

/// Every record touching `issue`, split into outgoing and incoming.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_dependency_list<W: Write + ?Sized>(
    w: &mut W,
    issue: &IssueId,
    deps: &[Dependency],
    config: &OutputConfig,
) -> io::Result<()> {
    if deps.is_empty() {
        return writeln!(w, "{issue} has no dependencies");
    }
    writeln!(
        w,
        "{} ({})",
        bold(&format!("Dependencies of {issue}"), config),
        deps.len()
    )?;
    let (outgoing, incoming): (Vec<&Dependency>, Vec<&Dependency>) =
        deps.iter().partition(|dep| &dep.source_id == issue);
    for (title, group) in [("Outgoing", outgoing), ("Incoming", incoming)] {
        if group.is_empty() {
            continue;
        }
        writeln!(w, "  {}:", dimmed(title, config))?;
        for dep in group {
            write!(w, "    ")?;
            write_dependency(w, dep, config)?;
        }
    }
    Ok(())
}

/// Issues, active edges and blocks adjacency of a graph snapshot.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_graph<W: Write + ?Sized>(
    w: &mut W,
    snapshot: &GraphSnapshot,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} issues, {} active edges, {} resolved",
        bold("Dependency graph:", config),
        snapshot.issues.len(),
        snapshot.edges.len(),
        snapshot.resolved_count
    )?;
    if snapshot.edges.is_empty() {
        return writeln!(w, "  (no active dependencies)");
    }
    for edge in &snapshot.edges {
        writeln!(
            w,
            "  {} {} {} {} {}",
            colorize_id(edge.id.as_str(), config),
            edge.source_id,
            colorize_dep_type(edge.dep_type, config),
            arrow(config),
            edge.target_id
        )?;
    }
    if !snapshot.adjacency.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Blocks:", config))?;
        for (issue, blocked) in &snapshot.adjacency {
            writeln!(w, "  {issue} {} {}", arrow(config), join_ids(blocked))?;
        }
    }
    Ok(())
}

/// Blocking status of one issue.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_blocking<W: Write + ?Sized>(
    w: &mut W,
    blocking: &BlockingInfo,
    config: &OutputConfig,
) -> io::Result<()> {
    let state = if blocking.is_blocked {
        error("blocked", config)
    } else {
        success("not blocked", config)
    };
    writeln!(w, "{}: {state}", colorize_id(blocking.issue_id.as_str(), config))?;
    if !blocking.blocked_by.is_empty() {
        writeln!(
            w,
            "  {} {}",
            dimmed("Blocked by:", config),
            join_ids(&blocking.blocked_by)
        )?;
    }
    if blocking.blocking_count > 0 {
        writeln!(
            w,
            "  {} {} ({})",
            dimmed("Blocking:", config),
            join_ids(&blocking.blocking),
            blocking.blocking_count
        )?;
    }
    if blocking.critical_path {
        writeln!(
            w,
            "  {}",
            warning("On the critical path: blocked and blocking others", config)
        )?;
    }
    Ok(())
}

/// Validation outcome: cycles, conflicts, warnings.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_validation<W: Write + ?Sized>(
    w: &mut W,
    result: &ValidationResult,
    config: &OutputConfig,
) -> io::Result<()> {
    if result.is_valid {
        writeln!(w, "{}", success("Dependency graph is valid", config))?;
    } else {
        writeln!(w, "{}", error("Dependency graph is invalid", config))?;
    }

    if !result.circular_paths.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({})",
            bold("Cycles", config),
            result.circular_paths.len()
        )?;
        for cycle in &result.circular_paths {
            let mut path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            if let Some(first) = cycle.first() {
                path.push(first.to_string());
            }
            writeln!(w, "  {}", path.join(&format!(" {} ", arrow(config))))?;
        }
    }

    if !result.conflicting_deps.is_empty() {
        writeln!(w)?;
        writeln!(
            w,
            "{} ({})",
            bold("Conflicts", config),
            result.conflicting_deps.len()
        )?;
        for conflict in &result.conflicting_deps {
            writeln!(
                w,
                "  {}: {} and {}",
                error(&conflict.kind.to_string(), config),
                colorize_id(conflict.first.id.as_str(), config),
                colorize_id(conflict.second.id.as_str(), config)
            )?;
        }
    }

    if !result.warnings.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({})", bold("Warnings", config), result.warnings.len())?;
        write_wrapped_items(w, &result.warnings, config)?;
    }
    Ok(())
}

/// Impact analysis of changing one issue.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_impact<W: Write + ?Sized>(
    w: &mut W,
    analysis: &ImpactAnalysis,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        bold("Impact of", config),
        colorize_id(analysis.origin.as_str(), config)
    )?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Risk:", config),
        colorize_risk(analysis.risk_level, config)
    )?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Affected:", config),
        if analysis.affected_issues.is_empty() {
            "none".to_string()
        } else {
            format!(
                "{} ({})",
                join_ids(&analysis.affected_issues),
                analysis.affected_issues.len()
            )
        }
    )?;
    if !analysis.critical_path.is_empty() {
        let path: Vec<String> = analysis.critical_path.iter().map(ToString::to_string).collect();
        writeln!(
            w,
            "  {} {}",
            dimmed("Critical path:", config),
            path.join(&format!(" {} ", arrow(config)))
        )?;
    }
    if let Some(hours) = analysis.delay_estimate_hours {
        writeln!(w, "  {} {hours:.1}h", dimmed("Estimated delay:", config))?;
    }
    if !analysis.recommendations.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("Recommendations", config))?;
        write_wrapped_items(w, &analysis.recommendations, config)?;
    }
    Ok(())
}

/// Counts and rankings.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stats<W: Write + ?Sized>(
    w: &mut W,
    stats: &DependencyStats,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Dependency statistics", config))?;
    writeln!(
        w,
        "  Total: {} ({} active, {} resolved)",
        stats.total_dependencies, stats.active_dependencies, stats.resolved_dependencies
    )?;
    writeln!(
        w,
        "  Issues with dependencies: {} (avg {:.2} per issue)",
        stats.issues_with_dependencies, stats.average_dependencies_per_issue
    )?;
    let cycles = stats.circular_dependencies.to_string();
    writeln!(
        w,
        "  Cycles: {}",
        if stats.circular_dependencies == 0 {
            success(&cycles, config)
        } else {
            error(&cycles, config)
        }
    )?;

    if !stats.by_type.is_empty() {
        let parts: Vec<String> = stats
            .by_type
            .iter()
            .map(|(dep_type, count)| format!("{} {count}", colorize_dep_type(*dep_type, config)))
            .collect();
        writeln!(w, "  By type: {}", parts.join(", "))?;
    }
    if !stats.created_by.is_empty() {
        let parts: Vec<String> = stats
            .created_by
            .iter()
            .map(|(author, count)| format!("{author} {count}"))
            .collect();
        writeln!(w, "  By author: {}", parts.join(", "))?;
    }

    write_ranking(w, "Most blocked", &stats.most_blocked, config)?;
    write_ranking(w, "Most blocking", &stats.most_blocking, config)
}

fn write_ranking<W: Write + ?Sized>(
    w: &mut W,
    title: &str,
    ranking: &[RankedIssue],
    config: &OutputConfig,
) -> io::Result<()> {
    if ranking.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{}", bold(title, config))?;
    for (rank, entry) in ranking.iter().enumerate() {
        writeln!(
            w,
            "  {:>2}. {} ({})",
            rank + 1,
            colorize_id(entry.issue_id.as_str(), config),
            entry.count
        )?;
    }
    Ok(())
}

/// Audit entries, oldest first.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_history<W: Write + ?Sized>(
    w: &mut W,
    entries: &[HistoryEntry],
    config: &OutputConfig,
) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(w, "No history recorded");
    }
    for entry in entries {
        writeln!(
            w,
            "{} {} {} {} {}",
            dimmed(&entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(), config),
            info(entry.event.as_str(), config),
            entry.issue_id,
            entry.message,
            dimmed(&format!("({})", entry.actor), config)
        )?;
    }
    Ok(())
}

fn write_wrapped_items<W: Write + ?Sized>(
    w: &mut W,
    items: &[String],
    config: &OutputConfig,
) -> io::Result<()> {
    let width = config.wrap_width().saturating_sub(4);
    for item in items {
        for (i, line) in wrap_text(item, width).iter().enumerate() {
            let bullet = if i == 0 { "- " } else { "  " };
            writeln!(w, "  {bullet}{line}")?;
        }
    }
    Ok(())
}

fn join_ids(ids: &[IssueId]) -> String {
    ids.iter()
        .map(IssueId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConflictKind, DependencyConflict, DependencyType, RiskLevel};
    use crate::graph::DependencyGraph;
    use crate::graph::test_support::{blocks, requires, resolved};
    use std::collections::HashMap;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, true, false)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a test of text wrapping functionality", 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|line| line.len() <= 20));
        assert_eq!(wrap_text("one\ntwo\nthree", 50).len(), 3);
    }

    #[test]
    fn test_output_config_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("SKEIN_MAX_WIDTH", "120"), ("SKEIN_ASCII", "true")]);
        let config = OutputConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config, OutputConfig::new(120, true, true));

        let vars: HashMap<&str, &str> = HashMap::from([("SKEIN_MAX_WIDTH", "wide"), ("NO_COLOR", "")]);
        let config = OutputConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.max_width, DEFAULT_MAX_CONTENT_WIDTH);
        assert!(!config.use_colors);
        assert!(!config.use_ascii);

        let config = OutputConfig::from_lookup(|_| None);
        assert_eq!(config, OutputConfig::default());
    }

    #[test]
    fn test_write_dependency_line() {
        let mut dep = blocks("dep-aaaaaa", "proj-a", "proj-b");
        dep.description = Some("schema first".to_string());

        let out = render(|w| write_dependency(w, &dep, &plain()));
        assert_eq!(
            out,
            "o dep-aaaaaa proj-a blocks -> proj-b [active] - schema first\n"
        );
    }

    #[test]
    fn test_write_dependency_list_groups_by_direction() {
        let deps = vec![
            blocks("dep-1", "proj-a", "proj-b"),
            resolved(requires("dep-2", "proj-c", "proj-a")),
        ];
        let out = render(|w| write_dependency_list(w, &IssueId::new("proj-a"), &deps, &plain()));

        assert!(out.starts_with("Dependencies of proj-a (2)"));
        let outgoing = out.find("Outgoing").unwrap();
        let incoming = out.find("Incoming").unwrap();
        assert!(outgoing < incoming);
        assert!(out.contains("[resolved]"));

        let empty = render(|w| write_dependency_list(w, &IssueId::new("x"), &[], &plain()));
        assert_eq!(empty, "x has no dependencies\n");
    }

    #[test]
    fn test_write_graph() {
        let graph = DependencyGraph::build(&[
            blocks("dep-1", "a", "b"),
            resolved(blocks("dep-2", "b", "c")),
        ]);
        let out = render(|w| write_graph(w, &graph.snapshot(), &plain()));
        assert!(out.contains("3 issues, 1 active edges, 1 resolved"));
        assert!(out.contains("a -> b"));
    }

    #[test]
    fn test_write_blocking() {
        let info = BlockingInfo {
            issue_id: IssueId::new("b"),
            is_blocked: true,
            blocked_by: vec![IssueId::new("a")],
            blocking_count: 1,
            blocking: vec![IssueId::new("c")],
            critical_path: true,
        };
        let out = render(|w| write_blocking(w, &info, &plain()));
        assert!(out.starts_with("b: blocked\n"));
        assert!(out.contains("Blocked by: a"));
        assert!(out.contains("Blocking: c (1)"));
        assert!(out.contains("critical path"));
    }

    #[test]
    fn test_write_validation_closes_cycles() {
        let first = blocks("dep-1", "a", "b");
        let second = blocks("dep-2", "b", "a");
        let result = ValidationResult {
            is_valid: false,
            circular_paths: vec![vec![IssueId::new("a"), IssueId::new("b")]],
            conflicting_deps: vec![DependencyConflict {
                kind: ConflictKind::MutualBlock,
                first,
                second,
            }],
            warnings: vec![],
        };
        let out = render(|w| write_validation(w, &result, &plain()));
        assert!(out.starts_with("Dependency graph is invalid"));
        assert!(out.contains("a -> b -> a"));
        assert!(out.contains("mutual block: dep-1 and dep-2"));
    }

    #[test]
    fn test_write_impact() {
        let analysis = ImpactAnalysis {
            origin: IssueId::new("a"),
            risk_level: RiskLevel::Low,
            affected_issues: vec![IssueId::new("b")],
            critical_path: vec![IssueId::new("a"), IssueId::new("b")],
            delay_estimate_hours: Some(3.0),
            recommendations: vec!["Resolve a before b".to_string()],
            ..ImpactAnalysis::default()
        };
        let out = render(|w| write_impact(w, &analysis, &plain()));
        assert!(out.contains("Risk: low"));
        assert!(out.contains("Critical path: a -> b"));
        assert!(out.contains("Estimated delay: 3.0h"));
        assert!(out.contains("- Resolve a before b"));
    }

    #[test]
    fn test_write_stats() {
        let stats = DependencyStats {
            total_dependencies: 3,
            active_dependencies: 2,
            resolved_dependencies: 1,
            by_type: [(DependencyType::Blocks, 3)].into_iter().collect(),
            most_blocked: vec![RankedIssue {
                issue_id: IssueId::new("b"),
                count: 2,
            }],
            ..DependencyStats::default()
        };
        let out = render(|w| write_stats(w, &stats, &plain()));
        assert!(out.contains("Total: 3 (2 active, 1 resolved)"));
        assert!(out.contains("By type: blocks 3"));
        assert!(out.contains(" 1. b (2)"));
        assert!(!out.contains("Most blocking"));
    }

    #[test]
    fn test_write_json() {
        let info = BlockingInfo {
            issue_id: IssueId::new("a"),
            ..BlockingInfo::default()
        };
        let out = render(|w| write_json(w, &info));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["issue_id"], "a");
        assert_eq!(parsed["is_blocked"], false);
    }
}
