// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm reservation` - advisory file-path locks.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct ReservationArgs {
    #[command(subcommand)]
    pub command: ReservationCommand,
}

#[derive(Subcommand)]
pub enum ReservationCommand {
    /// Reserve one or more path patterns
    Reserve {
        /// Requesting agent
        #[arg(long)]
        agent: String,
        /// Path patterns (glob supported)
        #[arg(required = true)]
        paths: Vec<String>,
        /// Allow overlapping non-exclusive holds
        #[arg(long)]
        shared: bool,
        /// Reason shown to other agents on conflict
        #[arg(long)]
        reason: Option<String>,
        /// Expire the reservation after this many seconds
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Release paths held by an agent (all held paths if none given)
    Release {
        /// Agent releasing its holds
        #[arg(long)]
        agent: String,
        /// Specific path patterns to release
        paths: Vec<String>,
    },
    /// Release every reservation in the project
    ReleaseAllForProject {
        /// Agent performing the release, recorded for audit
        #[arg(long)]
        actor: String,
    },
    /// Release every reservation held by one agent
    ReleaseAllForAgent {
        /// Agent performing the release, recorded for audit
        #[arg(long)]
        actor: String,
        /// Agent whose reservations are released
        target_agent: String,
    },
    /// List active reservations
    List {
        /// Filter to one agent's reservations
        #[arg(long)]
        agent: Option<String>,
    },
}

pub async fn handle(
    command: ReservationCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ReservationCommand::Reserve {
            agent,
            paths,
            shared,
            reason,
            ttl,
        } => {
            let (granted, conflicts) = client
                .reserve(project, &agent, paths, !shared, reason, ttl)
                .await
                .map_err(|e| anyhow!("{}", e))?;

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "granted": granted,
                        "conflicts": conflicts,
                    }))?
                ),
                OutputFormat::Text => {
                    if !granted.is_empty() {
                        println!("Granted:");
                        for p in &granted {
                            println!("  {}", p);
                        }
                    }
                    if !conflicts.is_empty() {
                        println!("Conflicts:");
                        for c in &conflicts {
                            println!(
                                "  {} (held by {})",
                                c.requested_path, c.holder_agent
                            );
                        }
                    }
                }
            }
            Ok(())
        }
        ReservationCommand::Release { agent, paths } => {
            let paths = if paths.is_empty() { None } else { Some(paths) };
            client
                .release(project, &agent, paths)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Released");
            Ok(())
        }
        ReservationCommand::ReleaseAllForProject { actor } => {
            client
                .release_all_for_project(project, &actor)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Released all reservations for project");
            Ok(())
        }
        ReservationCommand::ReleaseAllForAgent {
            actor,
            target_agent,
        } => {
            client
                .release_all_for_agent(project, &actor, &target_agent)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Released all reservations for {}", target_agent);
            Ok(())
        }
        ReservationCommand::List { agent } => {
            let reservations = client
                .active_reservations(project, agent)
                .await
                .map_err(|e| anyhow!("{}", e))?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reservations)?),
                OutputFormat::Text => {
                    if reservations.is_empty() {
                        println!("No active reservations");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("AGENT"),
                        Column::left("PATH"),
                        Column::left("EXCLUSIVE"),
                        Column::left("REASON"),
                    ]);
                    for r in &reservations {
                        table.row(vec![
                            r.agent_name.clone(),
                            r.path_pattern.clone(),
                            r.exclusive.to_string(),
                            r.reason.clone().unwrap_or_default(),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
            }
            Ok(())
        }
    }
}
