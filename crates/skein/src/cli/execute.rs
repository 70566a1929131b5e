//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{DepAction, DepArgs, HistoryArgs, InitArgs, IssueArgs, StatsArgs};
use crate::app::App;
use crate::domain::{Dependency, DependencyId, IssueId};
use crate::graph::StatsFilter;
use crate::output::{self, OutputMode};
use crate::service::Mutation;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.default_actor.as_deref()).await?;

    if !args.quiet {
        println!("Initialized skein in {}", result.skein_dir.display());
        println!("  Config:       {}", result.config_file.display());
        println!("  Dependencies: {}", result.dependencies_file.display());
        if let Some(actor) = &result.default_actor {
            println!("  Default actor: {actor}");
        }
    }

    Ok(())
}

/// Execute a `dep` subcommand
pub async fn execute_dep(
    app: &mut App,
    args: &DepArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let actor = app.actor(actor);

    match &args.action {
        DepAction::Add {
            source,
            target,
            dep_type,
            description,
        } => {
            let created = app
                .service_mut()
                .create(
                    &IssueId::new(source),
                    &IssueId::new(target),
                    (*dep_type).into(),
                    description.clone(),
                    &actor,
                )
                .await?;
            print_mutation(&created, output_mode, "Added dependency")?;
        }
        DepAction::Remove { dep_id } => {
            let removed = app
                .service_mut()
                .remove(&DependencyId::new(dep_id), &actor)
                .await?;
            print_mutation(&removed, output_mode, "Removed dependency")?;
        }
        DepAction::RemoveBetween { source, target } => {
            let removed = app
                .service_mut()
                .remove_between(&IssueId::new(source), &IssueId::new(target), &actor)
                .await?;
            output::print(&removed, output_mode, |w, config| {
                writeln!(
                    w,
                    "Removed {} dependencies between {source} and {target}",
                    removed.value.len()
                )?;
                for dep in &removed.value {
                    write!(w, "  ")?;
                    output::write_dependency(w, dep, config)?;
                }
                Ok(())
            })?;
            if output_mode == OutputMode::Text {
                output::print_warnings(&removed.warnings);
            }
        }
        DepAction::Resolve { dep_id } => {
            let resolved = app
                .service_mut()
                .resolve(&DependencyId::new(dep_id), &actor)
                .await?;
            print_mutation(&resolved, output_mode, "Resolved dependency")?;
        }
        DepAction::Reactivate { dep_id } => {
            let reactivated = app
                .service_mut()
                .reactivate(&DependencyId::new(dep_id), &actor)
                .await?;
            print_mutation(&reactivated, output_mode, "Reactivated dependency")?;
        }
        DepAction::List { issue_id } => {
            let id = IssueId::new(issue_id);
            let deps = app.service().get_issue_dependencies(&id).await?;
            output::print(&deps, output_mode, |w, config| {
                output::write_dependency_list(w, &id, &deps, config)
            })?;
        }
        DepAction::Graph => {
            let snapshot = app.service().get_dependency_graph().await?;
            output::print(&snapshot, output_mode, |w, config| {
                output::write_graph(w, &snapshot, config)
            })?;
        }
    }

    Ok(())
}

fn print_mutation(
    mutation: &Mutation<Dependency>,
    output_mode: OutputMode,
    verb: &str,
) -> Result<()> {
    output::print(mutation, output_mode, |w, config| {
        write!(w, "{verb}: ")?;
        output::write_dependency(w, &mutation.value, config)
    })?;
    if output_mode == OutputMode::Text {
        output::print_warnings(&mutation.warnings);
    }
    Ok(())
}

/// Execute the blocking command
pub async fn execute_blocking(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let info = app
        .service()
        .get_blocking_info(&IssueId::new(&args.issue_id))
        .await?;
    output::print(&info, output_mode, |w, config| {
        output::write_blocking(w, &info, config)
    })?;
    Ok(())
}

/// Execute the validate command. Returns whether the graph is valid.
pub async fn execute_validate(app: &App, output_mode: OutputMode) -> Result<bool> {
    let result = app.service().validate_dependency_graph().await?;
    output::print(&result, output_mode, |w, config| {
        output::write_validation(w, &result, config)
    })?;
    Ok(result.is_valid)
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let analysis = app
        .service()
        .analyze_dependency_impact(&IssueId::new(&args.issue_id))
        .await?;
    output::print(&analysis, output_mode, |w, config| {
        output::write_impact(w, &analysis, config)
    })?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, args: &StatsArgs, output_mode: OutputMode) -> Result<()> {
    if let (Some(since), Some(until)) = (args.since, args.until)
        && since > until
    {
        anyhow::bail!("--since ({since}) is after --until ({until})");
    }
    let filter = StatsFilter {
        author: args.author.clone(),
        since: args.since,
        until: args.until,
    };
    let stats = app.service().get_dependency_stats(&filter).await?;
    output::print(&stats, output_mode, |w, config| {
        output::write_stats(w, &stats, config)
    })?;
    Ok(())
}

/// Execute the history command
pub async fn execute_history(app: &App, args: &HistoryArgs, output_mode: OutputMode) -> Result<()> {
    let mut entries = app.service().history().await?;
    if let Some(issue_id) = &args.issue_id {
        entries.retain(|entry| entry.issue_id.as_str() == issue_id);
    }
    let skip = entries.len().saturating_sub(args.limit);
    let entries = entries.split_off(skip);

    output::print(&entries, output_mode, |w, config| {
        output::write_history(w, &entries, config)
    })?;
    Ok(())
}
