// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm agent` - agent registry commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent with the project
    Register {
        /// Agent-chosen name, unique within the project
        name: String,
        /// Program the agent runs under (e.g. "claude", "codex")
        #[arg(long, default_value = "unknown")]
        program: String,
        /// Model identifier
        #[arg(long, default_value = "unknown")]
        model: String,
        /// Short description of the agent's current task
        #[arg(long = "task", default_value = "")]
        task_description: String,
    },
    /// List registered agents
    List {},
    /// Show a single agent's details
    Show {
        /// Agent name
        name: String,
    },
}

pub async fn handle(
    command: AgentCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AgentCommand::Register {
            name,
            program,
            model,
            task_description,
        } => {
            handle_register(client, project, &name, &program, &model, &task_description, format)
                .await
        }
        AgentCommand::List {} => handle_list(client, project, format).await,
        AgentCommand::Show { name } => handle_show(client, project, &name, format).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_register(
    client: &DaemonClient,
    project: &str,
    name: &str,
    program: &str,
    model: &str,
    task_description: &str,
    format: OutputFormat,
) -> Result<()> {
    client
        .register_agent(project, name, program, model, task_description)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    match format {
        OutputFormat::Text => println!("Registered agent: {}", name),
        OutputFormat::Json => {
            let obj = serde_json::json!({ "registered": name });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }
    Ok(())
}

async fn handle_list(client: &DaemonClient, project: &str, format: OutputFormat) -> Result<()> {
    let agents = client
        .list_agents(project)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&agents)?),
        OutputFormat::Text => {
            if agents.is_empty() {
                println!("No agents registered");
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::left("NAME"),
                Column::left("PROGRAM"),
                Column::left("MODEL"),
                Column::left("TASK").with_max(40),
                Column::left("LAST ACTIVE"),
            ]);
            for a in &agents {
                table.row(vec![
                    a.name.clone(),
                    a.program.clone(),
                    a.model.clone(),
                    a.task_description.clone(),
                    format_time_ago(a.last_active_at_epoch_ms as u64),
                ]);
            }
            table.render(&mut std::io::stdout());
        }
    }
    Ok(())
}

async fn handle_show(
    client: &DaemonClient,
    project: &str,
    name: &str,
    format: OutputFormat,
) -> Result<()> {
    let agent = client
        .get_agent(project, name)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    let Some(agent) = agent else {
        match format {
            OutputFormat::Text => println!("Agent not found: {}", name),
            OutputFormat::Json => println!(r#"{{ "error": "not found" }}"#),
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&agent)?),
        OutputFormat::Text => {
            println!("Name: {}", agent.name);
            println!("Program: {}", agent.program);
            println!("Model: {}", agent.model);
            println!("Task: {}", agent.task_description);
            println!(
                "Registered: {}",
                format_time_ago(agent.registered_at_epoch_ms as u64)
            );
            println!(
                "Last active: {}",
                format_time_ago(agent.last_active_at_epoch_ms as u64)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
