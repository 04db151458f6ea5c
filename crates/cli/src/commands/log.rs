// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm log` - raw event log inspection.

use anyhow::{anyhow, Result};
use clap::Args;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct LogArgs {
    /// Only show events after this sequence number
    #[arg(long)]
    pub since_seq: Option<u64>,
    /// Max entries to return
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

pub async fn handle(
    args: LogArgs,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    let entries = client
        .log_entries(project, args.since_seq, args.limit)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No events found");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::right("SEQ"),
                Column::left("TYPE"),
                Column::left("SUMMARY").with_max(80),
            ]);
            for entry in &entries {
                let json = serde_json::to_value(&entry.event)?;
                let event_type = json
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                table.row(vec![entry.seq.to_string(), event_type, json.to_string()]);
            }
            table.render(&mut std::io::stdout());
        }
    }
    Ok(())
}
