// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm eval` - eval-run recording and regression detection.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct EvalArgs {
    #[command(subcommand)]
    pub command: EvalCommand,
}

#[derive(Subcommand)]
pub enum EvalCommand {
    /// Record one run's score for a named eval
    Record {
        name: String,
        #[arg(long)]
        score: f64,
    },
    /// List evals whose most recent run scored lower than the one before it
    Regressions {},
}

pub async fn handle(
    command: EvalCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        EvalCommand::Record { name, score } => {
            client
                .record_eval_run(project, &name, score)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Recorded: {} = {}", name, score);
            Ok(())
        }
        EvalCommand::Regressions {} => {
            let regressions = client
                .eval_regressions(project)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&regressions)?),
                OutputFormat::Text => {
                    if regressions.is_empty() {
                        println!("No regressions");
                        return Ok(());
                    }
                    for r in &regressions {
                        println!(
                            "{}: {:.4} -> {:.4} ({:+.1}%)",
                            r.eval_name, r.previous_score, r.current_score, r.delta_percent
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
