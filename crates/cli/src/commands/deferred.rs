// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm deferred` - durable cross-process futures.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use sw_core::AwaitOutcome;

#[derive(Args)]
pub struct DeferredArgs {
    #[command(subcommand)]
    pub command: DeferredCommand,
}

#[derive(Subcommand)]
pub enum DeferredCommand {
    /// Create a deferred value that another agent will later resolve
    Create {
        /// Expire unresolved after this many seconds
        #[arg(long, default_value = "3600")]
        ttl: i64,
    },
    /// Resolve a deferred value with a JSON value or an error
    Resolve {
        id: String,
        /// JSON value to resolve with
        #[arg(long)]
        value: Option<String>,
        /// Resolve as a failure with this message instead
        #[arg(long)]
        error: Option<String>,
    },
    /// Block until a deferred value resolves or the timeout elapses
    Await {
        id: String,
        #[arg(long, default_value = "30")]
        timeout: i64,
    },
}

pub async fn handle(
    command: DeferredCommand,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    match command {
        DeferredCommand::Create { ttl } => {
            let id = client
                .create_deferred(project, ttl)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "id": id }))?)
                }
                OutputFormat::Text => println!("Created: {}", id),
            }
            Ok(())
        }
        DeferredCommand::Resolve { id, value, error } => {
            let value = value
                .map(|v| serde_json::from_str(&v))
                .transpose()
                .map_err(|e| anyhow!("invalid --value JSON: {}", e))?;
            client
                .resolve_deferred(project, &id, value, error)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            println!("Resolved: {}", id);
            Ok(())
        }
        DeferredCommand::Await { id, timeout } => {
            let outcome = client
                .await_deferred(project, &id, timeout)
                .await
                .map_err(|e| anyhow!("{}", e))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Text => match outcome {
                    AwaitOutcome::Value(v) => println!("{}", v),
                    AwaitOutcome::Error(e) => println!("error: {}", e),
                    AwaitOutcome::TimedOut => println!("timed out"),
                },
            }
            Ok(())
        }
    }
}
