// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swarm cells` - flat table view over all cells in a project.

use anyhow::{anyhow, Result};
use clap::Args;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

/// Title column width; matches [`sw_core::Cell::truncated_title`]'s
/// own default truncation point for table display.
const TITLE_WIDTH: usize = 47;

#[derive(Args)]
pub struct CellsArgs {
    /// Only show cells with this status: open, in_progress, blocked, closed
    #[arg(long)]
    pub status: Option<String>,
}

pub async fn handle(
    args: CellsArgs,
    client: &DaemonClient,
    project: &str,
    format: OutputFormat,
) -> Result<()> {
    let mut cells = client
        .list_cells(project)
        .await
        .map_err(|e| anyhow!("{}", e))?;

    if let Some(status) = &args.status {
        let status = status.to_ascii_lowercase();
        cells.retain(|c| format!("{:?}", c.status).to_ascii_lowercase() == status.replace('-', ""));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cells)?),
        OutputFormat::Text => {
            if cells.is_empty() {
                println!("No cells found");
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::left("TYPE"),
                Column::status("STATUS"),
                Column::left("TITLE").with_max(TITLE_WIDTH),
                Column::right("PRI"),
                Column::left("ASSIGNEE"),
            ]);
            for c in &cells {
                table.row(vec![
                    c.id.to_string(),
                    format!("{:?}", c.cell_type).to_lowercase(),
                    format!("{:?}", c.status).to_lowercase(),
                    c.truncated_title(TITLE_WIDTH),
                    c.priority.to_string(),
                    c.assignee.clone().unwrap_or_default(),
                ]);
            }
            table.render(&mut std::io::stdout());
        }
    }
    Ok(())
}
