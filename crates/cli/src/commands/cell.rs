// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm cell` - work-unit CRUD.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use sw_core::{CellStatus, CellType, DependencyRelationship};

#[derive(Args)]
pub struct CellArgs {
    #[command(subcommand)]
    pub command: CellCommand,
}

#[derive(Subcommand)]
pub enum CellCommand {
    /// Create a cell
    Create {
        /// Caller-chosen id
        id: String,
        /// bug, feature, task, epic, chore
        #[arg(long = "type", default_value = "task")]
        cell_type: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "2")]
        priority: u8,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Update a cell's mutable fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<u8>,
    },
    /// Change a cell's status
    Status {
        id: String,
        /// open, in_progress, blocked, closed
        to: String,
    },
    /// Close a cell with a reason
    Close { id: String, reason: String },
    /// Reopen a closed cell
    Reopen { id: String },
    /// Tombstone a cell
    Delete { id: String },
    /// Record a dependency edge
    AddDependency {
        cell_id: String,
        depends_on_id: String,
        /// blocks, relates, duplicates
        #[arg(long, default_value = "blocks")]
        relationship: String,
    },
    /// Remove a dependency edge
    RemoveDependency {
        cell_id: String,
        depends_on_id: String,
    },
    /// Add a label
    AddLabel { id: String, label: String },
    /// Remove a label
    RemoveLabel { id: String, label: String },
    /// Add a comment
    Comment {
        id: String,
        #[arg(long)]
        author: String,
        body: String,
    },
    /// Attach a child cell to an epic
    AddEpicChild { epic_id: String, child_id: String },
    /// Assign a cell to an agent
    Assign { id: String, assignee: String },
    /// Show a single cell
    Show { id: String },
}

fn parse_cell_type(s: &str) -> Result<CellType> {
    match s.to_ascii_lowercase().as_str() {
        "bug" => Ok(CellType::Bug),
        "feature" => Ok(CellType::Feature),
        "task" => Ok(CellType::Task),
        "epic" => Ok(CellType::Epic),
        "chore" => Ok(CellType::Chore),
        other => Err(anyhow!(
            "invalid cell type '{}' (expected bug, feature, task, epic, chore)",
            other
        )),
    }
}

fn parse_cell_status(s: &str) -> Result<CellStatus> {
    match s.to_ascii_lowercase().as_str() {
        "open" => Ok(CellStatus::Open),
        "in_progress" | "in-progress" => Ok(CellStatus::InProgress),
        "blocked" => Ok(CellStatus::Blocked),
        "closed" => Ok(CellStatus::Closed),
        other => Err(anyhow!(
            "invalid status '{}' (expected open, in_progress, blocked, closed)",
            other
        )),
    }
}

fn parse_relationship(s: &str) -> Result<DependencyRelationship> {
    match s.to_ascii_lowercase().as_str() {
        "blocks" => Ok(DependencyRelationship::Blocks),
        "relates" => Ok(DependencyRelationship::Relates),
        "duplicates" => Ok(DependencyRelationship::Duplicates),
        other => Err(anyhow!(
            "invalid relationship '{}' (expected blocks, relates, duplicates)",
            other
        )),
    }
}

pub async fn handle(
    command: CellCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        CellCommand::Create {
            id,
            cell_type,
            title,
            description,
            priority,
            parent,
        } => {
            let cell_type = parse_cell_type(&cell_type)?;
            let created = client
                .create_cell(project, &id, cell_type, &title, &description, priority, parent)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            print_json_or(format, &serde_json::json!({ "created": created }), || {
                println!("Created: {}", created)
            })
        }
        CellCommand::Update {
            id,
            title,
            description,
            priority,
        } => {
            client
                .update_cell(project, &id, title, description, priority)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Updated: {}", id);
            Ok(())
        }
        CellCommand::Status { id, to } => {
            let to = parse_cell_status(&to)?;
            client
                .change_cell_status(project, &id, to)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Status changed: {}", id);
            Ok(())
        }
        CellCommand::Close { id, reason } => {
            client
                .close_cell(project, &id, &reason)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Closed: {}", id);
            Ok(())
        }
        CellCommand::Reopen { id } => {
            client
                .reopen_cell(project, &id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Reopened: {}", id);
            Ok(())
        }
        CellCommand::Delete { id } => {
            client
                .delete_cell(project, &id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Deleted: {}", id);
            Ok(())
        }
        CellCommand::AddDependency {
            cell_id,
            depends_on_id,
            relationship,
        } => {
            let relationship = parse_relationship(&relationship)?;
            client
                .add_dependency(project, &cell_id, &depends_on_id, relationship)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Dependency added: {} -> {}", cell_id, depends_on_id);
            Ok(())
        }
        CellCommand::RemoveDependency {
            cell_id,
            depends_on_id,
        } => {
            client
                .remove_dependency(project, &cell_id, &depends_on_id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Dependency removed: {} -> {}", cell_id, depends_on_id);
            Ok(())
        }
        CellCommand::AddLabel { id, label } => {
            client
                .add_label(project, &id, &label)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Label added: {} +{}", id, label);
            Ok(())
        }
        CellCommand::RemoveLabel { id, label } => {
            client
                .remove_label(project, &id, &label)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Label removed: {} -{}", id, label);
            Ok(())
        }
        CellCommand::Comment { id, author, body } => {
            client
                .add_comment(project, &id, &author, &body)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Comment added to {}", id);
            Ok(())
        }
        CellCommand::AddEpicChild { epic_id, child_id } => {
            client
                .add_epic_child(project, &epic_id, &child_id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Child {} attached to epic {}", child_id, epic_id);
            Ok(())
        }
        CellCommand::Assign { id, assignee } => {
            client
                .assign_cell(project, &id, &assignee)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Assigned: {} -> {}", id, assignee);
            Ok(())
        }
        CellCommand::Show { id } => {
            let cell = client
                .get_cell(project, &id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            let Some(cell) = cell else {
                println!("Cell not found: {}", id);
                return Ok(());
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cell)?),
                OutputFormat::Text => {
                    println!("ID: {}", cell.id);
                    println!("Type: {:?}", cell.cell_type);
                    println!("Status: {:?}", cell.status);
                    println!("Title: {}", cell.title);
                    println!("Priority: {}", cell.priority);
                    if let Some(assignee) = &cell.assignee {
                        println!("Assignee: {}", assignee);
                    }
                    if !cell.labels.is_empty() {
                        println!("Labels: {}", cell.labels.join(", "));
                    }
                    if !cell.description.is_empty() {
                        println!("\n{}", cell.description);
                    }
                }
            }
            Ok(())
        }
    }
}

fn print_json_or(
    format: OutputFormat,
    json: &serde_json::Value,
    text: impl FnOnce(),
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(json)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}
