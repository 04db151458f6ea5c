// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm message` - inter-agent messaging.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{Column, Table};
use sw_core::Importance;

#[derive(Args)]
pub struct MessageArgs {
    #[command(subcommand)]
    pub command: MessageCommand,
}

#[derive(Subcommand)]
pub enum MessageCommand {
    /// Send a message to one or more agents
    Send {
        /// Sending agent's name
        #[arg(long)]
        from: String,
        /// Recipient agent names
        #[arg(long = "to", required = true)]
        to: Vec<String>,
        /// Message subject
        #[arg(long)]
        subject: String,
        /// Message body
        body: String,
        /// Thread to append to (defaults to a new thread)
        #[arg(long)]
        thread: Option<String>,
        /// Importance: low, normal, high, urgent
        #[arg(long, default_value = "normal")]
        importance: String,
        /// Require an explicit ack from every recipient
        #[arg(long)]
        ack_required: bool,
    },
    /// Read a message body (marks it read for the given agent)
    Read {
        /// Message id
        message_id: String,
        /// Reading agent's name
        #[arg(long)]
        agent: String,
    },
    /// Acknowledge a message
    Ack {
        /// Message id
        message_id: String,
        /// Acknowledging agent's name
        #[arg(long)]
        agent: String,
    },
    /// Show an agent's inbox
    Inbox {
        /// Agent name
        agent: String,
        /// Max entries to return
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Only show urgent messages
        #[arg(long)]
        urgent_only: bool,
    },
    /// Recompute and show aggregate activity for a thread
    ThreadActivity {
        /// Thread id
        thread_id: String,
    },
}

fn parse_importance(s: &str) -> Result<Importance> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(Importance::Low),
        "normal" => Ok(Importance::Normal),
        "high" => Ok(Importance::High),
        "urgent" => Ok(Importance::Urgent),
        other => Err(anyhow!(
            "invalid importance '{}' (expected low, normal, high, urgent)",
            other
        )),
    }
}

pub async fn handle(
    command: MessageCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        MessageCommand::Send {
            from,
            to,
            subject,
            body,
            thread,
            importance,
            ack_required,
        } => {
            let importance = parse_importance(&importance)?;
            let message_id = client
                .send_message(
                    project,
                    &from,
                    to,
                    &subject,
                    &body,
                    thread,
                    importance,
                    ack_required,
                )
                .await
                .map_err(|e| anyhow!("{}", e))?;

            match format {
                OutputFormat::Text => println!("Sent: {}", message_id),
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "message_id": message_id }))?
                    )
                }
            }
            Ok(())
        }
        MessageCommand::Read { message_id, agent } => {
            let body = client
                .read_message(project, &message_id, &agent)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Text => println!("{}", body),
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "body": body }))?
                    )
                }
            }
            Ok(())
        }
        MessageCommand::Ack { message_id, agent } => {
            client
                .ack_message(project, &message_id, &agent)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Text => println!("Acked: {}", message_id),
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "acked": message_id }))?
                    )
                }
            }
            Ok(())
        }
        MessageCommand::Inbox {
            agent,
            limit,
            urgent_only,
        } => {
            let entries = client
                .inbox(project, &agent, limit, urgent_only)
                .await
                .map_err(|e| anyhow!("{}", e))?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("Inbox empty");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("ID"),
                        Column::left("FROM"),
                        Column::left("SUBJECT").with_max(50),
                        Column::left("IMPORTANCE"),
                        Column::left("RECEIVED"),
                        Column::left("READ"),
                    ]);
                    for e in &entries {
                        table.row(vec![
                            e.id.short(8).to_string(),
                            e.from_agent.clone(),
                            e.subject.clone(),
                            format!("{:?}", e.importance).to_lowercase(),
                            format_time_ago(e.created_at_epoch_ms as u64),
                            if e.read_at_epoch_ms.is_some() {
                                "yes".to_string()
                            } else {
                                "no".to_string()
                            },
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
            }
            Ok(())
        }
        MessageCommand::ThreadActivity { thread_id } => {
            let activity = client
                .emit_thread_activity(project, &thread_id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&activity)?),
                OutputFormat::Text => {
                    println!("Thread: {}", activity.thread_id);
                    println!("Messages: {}", activity.message_count);
                    println!("Participants: {}", activity.participant_count);
                    println!("Last from: {}", activity.last_message_agent);
                }
            }
            Ok(())
        }
    }
}
