use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::Connection;

/// Apply every pending `.sql` file from the migrations directory, in
/// filename order. Applied filenames are recorded in `schema_migrations`
/// so restarts and redeploys are no-ops.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            filename TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create schema_migrations table")?;

    for path in migration_files(Path::new("migrations"))? {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE filename = ?1",
                [&filename],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;
        if applied {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration: {filename}"))?;
        conn.execute_batch(&sql)
            .with_context(|| format!("failed to apply migration: {filename}"))?;
        conn.execute(
            "INSERT INTO schema_migrations (filename) VALUES (?1)",
            [&filename],
        )
        .with_context(|| format!("failed to record migration: {filename}"))?;

        tracing::info!(migration = %filename, "applied migration");
    }

    Ok(())
}

fn migration_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        tracing::warn!("migrations directory not found, skipping");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .context("failed to read migrations directory")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "sql").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}
