//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use super::types::DependencyTypeArg;
use super::validators::{
    parse_timestamp, validate_actor, validate_dependency_id, validate_description,
    validate_issue_id,
};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Default actor recorded on mutations when `--actor` is not given
    #[arg(long = "default-actor", value_parser = validate_actor)]
    pub default_actor: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency subcommand
    #[command(subcommand)]
    pub action: DepAction,
}

/// Dependency management actions
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Add a dependency
    Add {
        /// Issue the dependency starts from
        #[arg(value_parser = validate_issue_id)]
        source: String,

        /// Issue the dependency points to
        #[arg(value_parser = validate_issue_id)]
        target: String,

        /// Dependency type
        #[arg(
            short = 't',
            long = "type",
            value_enum,
            ignore_case = true,
            default_value = "blocks"
        )]
        dep_type: DependencyTypeArg,

        /// Free-form description
        #[arg(short = 'D', long, value_parser = validate_description)]
        description: Option<String>,
    },

    /// Remove a dependency by ID
    Remove {
        /// Dependency ID (e.g. dep-4k2x9a)
        #[arg(value_parser = validate_dependency_id)]
        dep_id: String,
    },

    /// Remove every dependency between two issues
    RemoveBetween {
        /// First issue
        #[arg(value_parser = validate_issue_id)]
        source: String,

        /// Second issue
        #[arg(value_parser = validate_issue_id)]
        target: String,
    },

    /// Mark a dependency resolved
    Resolve {
        /// Dependency ID
        #[arg(value_parser = validate_dependency_id)]
        dep_id: String,
    },

    /// Make a resolved dependency active again
    Reactivate {
        /// Dependency ID
        #[arg(value_parser = validate_dependency_id)]
        dep_id: String,
    },

    /// List every dependency touching an issue, resolved ones included
    List {
        /// Issue ID
        #[arg(value_parser = validate_issue_id)]
        issue_id: String,
    },

    /// Show the active dependency graph
    Graph,
}

/// Arguments for commands that take a single issue
#[derive(Parser, Debug, Clone)]
pub struct IssueArgs {
    /// Issue ID
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Only dependencies created by this actor
    #[arg(long, value_parser = validate_actor)]
    pub author: Option<String>,

    /// Only dependencies created at or after this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub since: Option<DateTime<Utc>>,

    /// Only dependencies created at or before this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub until: Option<DateTime<Utc>>,
}

/// Arguments for the `history` command
#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    /// Only entries filed under this issue
    #[arg(long = "issue", value_parser = validate_issue_id)]
    pub issue_id: Option<String>,

    /// Show at most this many of the most recent entries
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}
