// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! swarm - multi-agent coordination CLI

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod help;
mod output;
mod poll;
mod table;

use output::OutputFormat;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    agent, cell, cells, daemon, deferred, env as env_cmd, eval, log, message, project, queue,
    reservation, worker,
};
use std::path::{Path, PathBuf};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(
    name = "swarm",
    version,
    disable_version_flag = true,
    about = "swarm - coordination for fleets of agents sharing a project"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Project key override
    #[arg(long = "project", global = true)]
    project: Option<String>,

    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Agent registration and directory
    Agent(agent::AgentArgs),
    /// Inter-agent messaging
    Message(message::MessageArgs),
    /// Advisory file-path reservations
    Reservation(reservation::ReservationArgs),
    /// Work-unit CRUD
    Cell(cell::CellArgs),
    /// List cells in a project
    Cells(cells::CellsArgs),
    /// Subtask worker lifecycle
    Worker(worker::WorkerArgs),
    /// Durable cross-process futures
    Deferred(deferred::DeferredArgs),
    /// Work-queue view over cells
    Queue(queue::QueueArgs),
    /// Raw event log inspection
    Log(log::LogArgs),
    /// Eval-run recording and regression detection
    Eval(eval::EvalArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Environment variable management
    Env(env_cmd::EnvArgs),
    /// Project management
    Project(project::ProjectArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
/// Otherwise we render the full chain so context isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command()
        .help_template(help::template())
        .before_help(help::commands())
        .after_help(help::after_help())
        .styles(help::styles())
        .arg(
            clap::Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .action(clap::ArgAction::Version)
                .help("Print version"),
        )
}

async fn run() -> Result<()> {
    let matches = match cli_command().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            if e.kind() == clap::error::ErrorKind::DisplayHelp {
                let args: Vec<String> = std::env::args().collect();
                let args = strip_global_flags(&args);
                print_formatted_help(&args);
                return Ok(());
            }
            e.exit();
        }
    };
    let cli = Cli::from_arg_matches(&matches)?;
    let format = cli.output;

    // Apply -C: change working directory early, before project key discovery
    if let Some(ref dir) = cli.directory {
        let canonical = std::fs::canonicalize(dir).map_err(|e| {
            anyhow::anyhow!("cannot change to directory '{}': {}", dir.display(), e)
        })?;
        std::env::set_current_dir(&canonical).map_err(|e| {
            anyhow::anyhow!(
                "cannot change to directory '{}': {}",
                canonical.display(),
                e
            )
        })?;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            help::print_help(cli_command());
            return Ok(());
        }
    };

    // Daemon and env commands don't need a resolved project or client connection.
    if let Commands::Daemon(args) = command {
        return daemon::daemon(args, format).await;
    }
    if let Commands::Env(args) = command {
        return env_cmd::handle(args.command, format);
    }
    if let Commands::Project(args) = command {
        return project::handle_not_running_or(args.command, format).await;
    }

    let project_root = find_project_root();

    // Centralized project resolution:
    //   --project flag > SWARM_PROJECT env > auto-resolved from project root
    let project = resolve_effective_project(cli.project.as_deref(), &project_root);

    match command {
        Commands::Agent(args) => {
            use agent::AgentCommand;
            let client = match &args.command {
                AgentCommand::Register { .. } => DaemonClient::for_action()?,
                AgentCommand::List {} | AgentCommand::Show { .. } => DaemonClient::for_query()?,
            };
            agent::handle(args.command, &client, &project, format).await?
        }
        Commands::Message(args) => {
            use message::MessageCommand;
            let client = match &args.command {
                MessageCommand::Send { .. }
                | MessageCommand::Read { .. }
                | MessageCommand::Ack { .. } => DaemonClient::for_action()?,
                MessageCommand::Inbox { .. } | MessageCommand::ThreadActivity { .. } => {
                    DaemonClient::for_query()?
                }
            };
            message::handle(args.command, &client, &project, format).await?
        }
        Commands::Reservation(args) => {
            use reservation::ReservationCommand;
            let client = match &args.command {
                ReservationCommand::List { .. } => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            reservation::handle(args.command, &client, &project, format).await?
        }
        Commands::Cell(args) => {
            use cell::CellCommand;
            let client = match &args.command {
                CellCommand::Show { .. } => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            cell::handle(args.command, &client, &project, format).await?
        }
        Commands::Cells(args) => {
            let client = DaemonClient::for_query()?;
            cells::handle(args, &client, &project, format).await?
        }
        Commands::Worker(args) => {
            let client = DaemonClient::for_action()?;
            worker::handle(args.command, &client, &project, format).await?
        }
        Commands::Deferred(args) => {
            use deferred::DeferredCommand;
            let client = match &args.command {
                DeferredCommand::Await { .. } => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            deferred::handle(args.command, &client, &project, format).await?
        }
        Commands::Queue(args) => {
            use queue::QueueCommand;
            let client = match &args.command {
                QueueCommand::Status { .. } | QueueCommand::List {} => {
                    DaemonClient::for_query()?
                }
                _ => DaemonClient::for_action()?,
            };
            queue::handle(args.command, &client, &project, format).await?
        }
        Commands::Log(args) => {
            let client = DaemonClient::for_query()?;
            log::handle(args, &client, &project, format).await?
        }
        Commands::Eval(args) => {
            use eval::EvalCommand;
            let client = match &args.command {
                EvalCommand::Regressions {} => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            eval::handle(args.command, &client, &project, format).await?
        }
        Commands::Daemon(_) | Commands::Env(_) | Commands::Project(_) => unreachable!(),
    }

    Ok(())
}

/// Resolve the effective project key using the standard priority chain:
///   --project flag > SWARM_PROJECT env > project root resolution
fn resolve_effective_project(project: Option<&str>, project_root: &Path) -> String {
    if let Some(p) = project {
        return p.to_string();
    }
    if let Ok(p) = std::env::var("SWARM_PROJECT") {
        if !p.is_empty() {
            return p;
        }
    }
    sw_core::namespace::resolve_namespace(project_root)
}

/// Find the project root by walking up from current directory.
/// Looks for a `.oj` directory to identify the project root.
///
/// When running inside a git worktree, resolves to the main worktree's
/// project root so that daemon requests reference the canonical project.
fn find_project_root() -> PathBuf {
    let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project_root_from(start)
}

/// Find the project root by walking up from a given starting directory.
fn find_project_root_from(start: PathBuf) -> PathBuf {
    let mut current = start;
    loop {
        if current.join(".oj").is_dir() {
            return resolve_main_worktree(&current).unwrap_or(current);
        }
        if !current.pop() {
            return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        }
    }
}

/// If `path` is inside a git worktree, resolve to the main worktree root.
/// Returns None if `path` is already the main worktree (or not a git repo).
fn resolve_main_worktree(path: &Path) -> Option<PathBuf> {
    let git_path = path.join(".git");

    if !git_path.is_file() {
        return None;
    }

    let content = std::fs::read_to_string(&git_path).ok()?;
    let gitdir = content.strip_prefix("gitdir: ")?.trim();

    let gitdir_path = if Path::new(gitdir).is_absolute() {
        PathBuf::from(gitdir)
    } else {
        path.join(gitdir)
    };

    let main_git_dir = gitdir_path.parent()?.parent()?;
    let main_root = main_git_dir.parent()?;

    if main_root.join(".oj").is_dir() {
        Some(main_root.to_path_buf())
    } else {
        None
    }
}

/// Print help with post-hoc colorization, resolving the correct subcommand from args.
fn print_formatted_help(args: &[String]) {
    let cmd = cli_command();

    let non_flags: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .collect();

    let subcommand_names: Vec<&str> = if non_flags.first().map(|s| s.as_str()) == Some("help") {
        non_flags.iter().skip(1).map(|s| s.as_str()).collect()
    } else {
        non_flags.iter().map(|s| s.as_str()).collect()
    };

    let target_cmd = find_subcommand(cmd, &subcommand_names);
    help::print_help(target_cmd);
}

/// Strip `-C <value>` and `--project <value>` from args to avoid mistaking
/// their values for subcommand names in help formatting.
fn strip_global_flags(args: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-C" || arg == "--project" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("-C") && arg.len() > 2 {
            continue;
        }
        if arg.starts_with("--project=") {
            continue;
        }
        result.push(arg.clone());
    }
    result
}

/// Recursively find a nested subcommand by name path.
pub(crate) fn find_subcommand(mut cmd: clap::Command, names: &[&str]) -> clap::Command {
    for name in names {
        let mut found_sub = None;
        for sub in cmd.get_subcommands() {
            if sub.get_name() == *name || sub.get_all_aliases().any(|a| a == *name) {
                found_sub = Some(sub.get_name().to_string());
                break;
            }
        }
        if let Some(sub_name) = found_sub {
            if let Some(sub) = cmd.find_subcommand_mut(&sub_name) {
                cmd = sub.clone();
            } else {
                break;
            }
        } else {
            break;
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_cells_with_status_filter() {
        let matches = cli_command()
            .try_get_matches_from(["swarm", "cells", "--status", "open"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        match cli.command {
            Some(Commands::Cells(args)) => assert_eq!(args.status.as_deref(), Some("open")),
            _ => panic!("expected Cells command"),
        }
    }

    #[test]
    fn cli_parses_global_project_flag() {
        let matches = cli_command()
            .try_get_matches_from(["swarm", "--project", "demo", "cells"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert_eq!(cli.project.as_deref(), Some("demo"));
    }

    #[test]
    fn resolve_effective_project_prefers_explicit_flag() {
        let root = PathBuf::from("/nonexistent");
        assert_eq!(resolve_effective_project(Some("explicit"), &root), "explicit");
    }
}
