//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for skein using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `init`: Initialize a new skein repository
//! - `dep`: Add, remove, resolve, reactivate and list dependencies
//! - `blocking`: Show whether an issue is blocked and what it blocks
//! - `validate`: Check the graph for cycles and conflicts
//! - `impact`: Analyze the downstream impact of an issue
//! - `stats`: Dependency statistics
//! - `history`: Show the audit trail
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--actor NAME`: Who is making the change (mutating commands)
//!
//! # Example
//!
//! ```bash
//! skein dep add proj-api proj-ui --type blocks -D "UI needs the endpoints"
//! skein blocking proj-ui
//! skein validate
//! skein --json impact proj-api
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

// Re-export argument structs
pub use args::{DepAction, DepArgs, HistoryArgs, InitArgs, IssueArgs, StatsArgs};

// Re-export types
pub use types::DependencyTypeArg;

// Re-export validators for external use
pub use validators::{
    parse_timestamp, validate_actor, validate_dependency_id, validate_description,
    validate_issue_id,
};

/// Skein - dependency and blocking analysis for issue trackers
///
/// Record which issues block or require others, then ask what is blocked,
/// what a change would affect, and whether the graph is consistent.
/// Dependencies are stored in `.skein/dependencies.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "skein")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Actor recorded on mutations (defaults to config, then $USER)
    #[arg(long, global = true, value_parser = validators::validate_actor)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new skein repository
    ///
    /// Creates the `.skein/` directory with configuration and an empty
    /// dependency file. Run this once in your project root.
    Init(InitArgs),

    /// Manage dependencies between issues
    Dep(DepArgs),

    /// Show what blocks an issue and what it blocks
    Blocking(IssueArgs),

    /// Check the dependency graph for cycles and conflicts
    ///
    /// Exits with a non-zero status when the graph is invalid.
    Validate,

    /// Analyze the downstream impact of changing an issue
    Impact(IssueArgs),

    /// Show dependency statistics
    Stats(StatsArgs),

    /// Show the audit trail of dependency changes
    History(HistoryArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns clap's error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error raised while loading the repository or running the
    /// command.
    pub async fn execute(&self) -> Result<ExitCode> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await?,
            Some(Commands::Dep(args)) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_dep(&mut app, args, self.actor.as_deref(), output_mode).await?;
            }
            Some(Commands::Blocking(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_blocking(&app, args, output_mode).await?;
            }
            Some(Commands::Validate) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                if !execute::execute_validate(&app, output_mode).await? {
                    return Ok(ExitCode::FAILURE);
                }
            }
            Some(Commands::Impact(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_impact(&app, args, output_mode).await?;
            }
            Some(Commands::Stats(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_stats(&app, args, output_mode).await?;
            }
            Some(Commands::History(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_history(&app, args, output_mode).await?;
            }
            None => {
                println!("Skein dependency analysis");
                println!("Use --help for more information");
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
