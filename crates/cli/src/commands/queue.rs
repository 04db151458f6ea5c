// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm queue` - a thin work-queue view over cells.
//!
//! Submitting to the queue creates an open, unassigned task cell and spawns
//! a worker for it in one step. `queue worker` polls for open, unassigned
//! cells and claims them up to a concurrency limit.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::time::Duration;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::poll::{Poller, Tick};
use crate::table::{Column, Table};
use sw_core::{CellStatus, CellType};

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Submit a task to the queue and spawn a worker for it
    Submit {
        id: String,
        #[arg(long)]
        title: String,
        /// Prompt text the worker replays
        prompt: String,
        #[arg(long, default_value = "2")]
        priority: u8,
    },
    /// Show a queued task's cell
    Status { id: String },
    /// List open cells in the queue
    List {},
    /// Poll for open, unassigned cells and claim them
    Worker {
        /// Name used to assign claimed cells
        #[arg(long)]
        agent: String,
        /// Max cells to claim per poll
        #[arg(long, default_value = "1")]
        concurrency: usize,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "2000")]
        interval_ms: u64,
    },
}

pub async fn handle(
    command: QueueCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        QueueCommand::Submit {
            id,
            title,
            prompt,
            priority,
        } => {
            client
                .create_cell(project, &id, CellType::Task, &title, "", priority, None)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            let (worker_id, _) = client
                .spawn_subtask(project, &id, &prompt)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({ "id": id, "worker_id": worker_id })
                    )?
                ),
                OutputFormat::Text => println!("Submitted: {} (worker {})", id, worker_id),
            }
            Ok(())
        }
        QueueCommand::Status { id } => {
            let cell = client
                .get_cell(project, &id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            let Some(cell) = cell else {
                println!("Not found: {}", id);
                return Ok(());
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cell)?),
                OutputFormat::Text => {
                    println!("ID: {}", cell.id);
                    println!("Status: {:?}", cell.status);
                    println!("Title: {}", cell.title);
                    if let Some(assignee) = &cell.assignee {
                        println!("Assignee: {}", assignee);
                    }
                }
            }
            Ok(())
        }
        QueueCommand::List {} => {
            let cells = client
                .list_cells(project)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            let open: Vec<_> = cells
                .into_iter()
                .filter(|c| matches!(c.status, CellStatus::Open | CellStatus::InProgress))
                .collect();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&open)?),
                OutputFormat::Text => {
                    if open.is_empty() {
                        println!("Queue empty");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("ID"),
                        Column::status("STATUS"),
                        Column::left("TITLE").with_max(47),
                        Column::left("ASSIGNEE"),
                    ]);
                    for c in &open {
                        table.row(vec![
                            c.id.to_string(),
                            format!("{:?}", c.status).to_lowercase(),
                            c.truncated_title(47),
                            c.assignee.clone().unwrap_or_default(),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
            }
            Ok(())
        }
        QueueCommand::Worker {
            agent,
            concurrency,
            interval_ms,
        } => {
            let mut poller = Poller::new(Duration::from_millis(interval_ms), None);
            loop {
                let cells = client
                    .list_cells(project)
                    .await
                    .map_err(|e| anyhow!("{}", e))?;
                let claimable: Vec<_> = cells
                    .into_iter()
                    .filter(|c| c.status == CellStatus::Open && c.assignee.is_none())
                    .take(concurrency)
                    .collect();
                for cell in claimable {
                    client
                        .assign_cell(project, &cell.id.to_string(), &agent)
                        .await
                        .map_err(|e| anyhow!("{}", e))?;
                    println!("Claimed: {}", cell.id);
                }
                match poller.tick().await {
                    Tick::Ready => continue,
                    Tick::Timeout | Tick::Interrupted => break,
                }
            }
            Ok(())
        }
    }
}
