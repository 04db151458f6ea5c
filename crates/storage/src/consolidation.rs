// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stray-log discovery and consolidation.
//!
//! Generalizes the registry-of-migrations pattern in [`crate::migration`]
//! from schema-version upgrades of one project's own snapshot to merging
//! other tools' scattered per-subdirectory sqlite databases
//! (`.opencode/*.db`, `.hive/*.db`, `packages/*/.opencode/*.db`) into a
//! single consolidated database, table-by-table, with first-writer-wins
//! (`INSERT OR IGNORE`) conflict semantics. The stray file is renamed with
//! a `.migrated` suffix on success; its schema is never dropped.

use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema shape detected in a stray database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StraySchema {
    /// Has `events`, `agents`, and `messages` tables.
    Modern,
    /// Has a `bead_events` table but not the modern trio.
    Legacy,
    /// Neither; left untouched.
    Unknown,
}

/// A stray database found on disk, classified but not yet migrated.
#[derive(Debug, Clone)]
pub struct StrayFinding {
    pub path: PathBuf,
    pub schema: StraySchema,
}

/// What consolidation will do with a finding.
#[derive(Debug, Clone)]
pub enum PlanAction {
    Migrate { estimated_rows: u64 },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ConsolidationPlan {
    pub finding: StrayFinding,
    pub action: PlanAction,
}

/// Per-table outcome of a single stray's migration.
#[derive(Debug, Clone, Default)]
pub struct TableMigration {
    pub migrated: u64,
    pub skipped: u64,
}

/// Result of migrating one stray database.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub per_table: BTreeMap<String, TableMigration>,
    /// Non-fatal per-row/per-table errors; migration proceeds past these.
    pub errors: Vec<String>,
}

/// Conventional locations scanned for stray databases, relative to a
/// project root.
const STRAY_DIRS: &[&str] = &[".opencode", ".hive"];

/// Walk `project_root` for stray sqlite files at the conventional
/// locations, excluding already-migrated (`.migrated`) and backup
/// (`.backup-*`) files.
pub fn discover_strays(project_root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in STRAY_DIRS {
        collect_db_files(&project_root.join(dir), &mut found);
    }
    if let Ok(entries) = fs::read_dir(project_root.join("packages")) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_db_files(&path.join(".opencode"), &mut found);
            }
        }
    }
    found
}

fn collect_db_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("db") {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.contains(".migrated") || name.contains(".backup-") {
            continue;
        }
        out.push(path);
    }
}

/// Open and classify a stray database by which tables it has.
pub fn classify_stray(path: &Path) -> Result<StrayFinding, ConsolidationError> {
    let conn = Connection::open(path)?;
    let tables = table_names(&conn, "main")?;
    let schema = if ["events", "agents", "messages"]
        .iter()
        .all(|t| tables.iter().any(|existing| existing == t))
    {
        StraySchema::Modern
    } else if tables.iter().any(|t| t == "bead_events") {
        StraySchema::Legacy
    } else {
        StraySchema::Unknown
    };
    Ok(StrayFinding {
        path: path.to_path_buf(),
        schema,
    })
}

fn table_names(conn: &Connection, schema: &str) -> Result<Vec<String>, ConsolidationError> {
    let sql = format!("SELECT name FROM {schema}.sqlite_master WHERE type='table'");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Plan what to do with a classified finding: `Unknown` schemas are
/// skipped, everything else gets an estimated row count from its primary
/// table.
pub fn plan_stray(finding: StrayFinding) -> Result<ConsolidationPlan, ConsolidationError> {
    let action = match finding.schema {
        StraySchema::Unknown => PlanAction::Skip,
        StraySchema::Modern | StraySchema::Legacy => {
            let conn = Connection::open(&finding.path)?;
            let table = match finding.schema {
                StraySchema::Modern => "events",
                _ => "bead_events",
            };
            let estimated_rows: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            PlanAction::Migrate {
                estimated_rows: estimated_rows.max(0) as u64,
            }
        }
    };
    Ok(ConsolidationPlan { finding, action })
}

/// Merge every table a stray database shares with the global database into
/// the global database, skipping rows that already exist there (global
/// wins). Columns are copied by name, excluding any integer primary key,
/// so the destination assigns fresh ids rather than colliding with the
/// stray's own.
pub fn migrate_stray(
    stray_path: &Path,
    global_db_path: &Path,
) -> Result<MigrationReport, ConsolidationError> {
    let conn = Connection::open(global_db_path)?;
    conn.execute(
        "ATTACH DATABASE ?1 AS stray",
        params![stray_path.to_string_lossy()],
    )?;

    let mut report = MigrationReport::default();
    let result = migrate_attached(&conn, &mut report);

    // Always try to detach, even if migration failed partway through.
    let _ = conn.execute("DETACH DATABASE stray", []);
    result?;
    Ok(report)
}

fn migrate_attached(conn: &Connection, report: &mut MigrationReport) -> Result<(), ConsolidationError> {
    let main_tables = table_names(conn, "main")?;
    let stray_tables = table_names(conn, "stray")?;

    for table in stray_tables {
        if !main_tables.contains(&table) {
            continue;
        }
        let columns = non_pk_columns(conn, "stray", &table)?;
        if columns.is_empty() {
            continue;
        }
        let col_list = columns.join(", ");
        let total: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM stray.{table}"), [], |r| {
            r.get(0)
        })?;
        let sql = format!(
            "INSERT OR IGNORE INTO main.{table} ({col_list}) SELECT {col_list} FROM stray.{table}"
        );
        match conn.execute(&sql, []) {
            Ok(migrated) => {
                let skipped = (total - migrated as i64).max(0) as u64;
                report.per_table.insert(
                    table,
                    TableMigration {
                        migrated: migrated as u64,
                        skipped,
                    },
                );
            }
            Err(e) => report.errors.push(format!("{table}: {e}")),
        }
    }
    Ok(())
}

fn non_pk_columns(
    conn: &Connection,
    schema: &str,
    table: &str,
) -> Result<Vec<String>, ConsolidationError> {
    let sql = format!("PRAGMA {schema}.table_info({table})");
    let mut stmt = conn.prepare(&sql)?;
    let cols = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let pk: i64 = row.get(5)?;
            Ok((name, pk))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols
        .into_iter()
        .filter(|(_, pk)| *pk == 0)
        .map(|(name, _)| name)
        .collect())
}

/// Rename a successfully migrated stray to its `.migrated` form. The
/// original schema and rows are left intact on disk, only inaccessible to
/// future `discover_strays` scans.
pub fn finalize_stray(stray_path: &Path) -> Result<PathBuf, ConsolidationError> {
    let migrated_path = PathBuf::from(format!("{}.migrated", stray_path.display()));
    fs::rename(stray_path, &migrated_path)?;
    Ok(migrated_path)
}

#[cfg(test)]
#[path = "consolidation_tests.rs"]
mod tests;
