// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm worker` - subtask worker lifecycle.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use sw_core::ReviewVerdict;

#[derive(Args)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// Spawn a worker for a cell's decomposed subtask
    Spawn {
        cell_id: String,
        /// Original prompt text the worker replays on retry
        prompt: String,
    },
    /// Record that a worker has begun work, claiming its cell
    BeginWork {
        worker_id: String,
        cell_id: String,
        #[arg(long)]
        agent: String,
    },
    /// Record review feedback for a worker's cell
    ReviewFeedback {
        cell_id: String,
        worker_id: String,
        /// approved, needs_changes
        verdict: String,
        /// Issues to replay on retry (repeatable)
        #[arg(long = "issue")]
        issues: Vec<String>,
    },
    /// Record a worker's successful completion
    Complete {
        worker_id: String,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        duration_ms: i64,
        /// Resolve a deferred future this completion satisfies
        #[arg(long)]
        deferred_id: Option<String>,
    },
    /// Record a worker's failure
    Fail {
        worker_id: String,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        duration_ms: i64,
    },
}

fn parse_verdict(s: &str) -> Result<ReviewVerdict> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "approved" => Ok(ReviewVerdict::Approved),
        "needs_changes" => Ok(ReviewVerdict::NeedsChanges),
        other => Err(anyhow!(
            "invalid verdict '{}' (expected approved, needs_changes)",
            other
        )),
    }
}

pub async fn handle(
    command: WorkerCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        WorkerCommand::Spawn { cell_id, prompt } => {
            let (worker_id, prompt) = client
                .spawn_subtask(project, &cell_id, &prompt)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({ "worker_id": worker_id, "prompt": prompt })
                    )?
                ),
                OutputFormat::Text => {
                    println!("Worker: {}", worker_id);
                    println!("{}", prompt);
                }
            }
            Ok(())
        }
        WorkerCommand::BeginWork {
            worker_id,
            cell_id,
            agent,
        } => {
            client
                .worker_begin_work(project, &worker_id, &cell_id, &agent)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Work begun: {}", worker_id);
            Ok(())
        }
        WorkerCommand::ReviewFeedback {
            cell_id,
            worker_id,
            verdict,
            issues,
        } => {
            let verdict = parse_verdict(&verdict)?;
            let retry = client
                .record_review_feedback(project, &cell_id, &worker_id, verdict, issues)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&retry)?),
                OutputFormat::Text => match retry {
                    Some(retry) => {
                        println!(
                            "Retry scheduled (attempt {}/{}): {}",
                            retry.attempt,
                            retry.max_attempts,
                            retry.issues.join("; ")
                        );
                    }
                    None => println!("Feedback recorded, no retry needed"),
                },
            }
            Ok(())
        }
        WorkerCommand::Complete {
            worker_id,
            agent,
            duration_ms,
            deferred_id,
        } => {
            let (success, duration_ms) = client
                .complete_subtask(project, &worker_id, &agent, duration_ms, deferred_id)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({ "success": success, "duration_ms": duration_ms })
                    )?
                ),
                OutputFormat::Text => println!(
                    "Completed: {} ({}ms, success={})",
                    worker_id, duration_ms, success
                ),
            }
            Ok(())
        }
        WorkerCommand::Fail {
            worker_id,
            agent,
            duration_ms,
        } => {
            client
                .fail_subtask(project, &worker_id, &agent, duration_ms)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Failed: {}", worker_id);
            Ok(())
        }
    }
}
