use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::anticheat::SessionSummary;
use crate::error::Result;
use crate::grid::GridPreset;

/// One accepted run kept on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub grid: GridPreset,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
    pub summary: SessionSummary,
}

/// Local SQLite store of accepted runs, used for personal bests
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                grid TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                moves INTEGER NOT NULL,
                trusted INTEGER NOT NULL,
                untrusted INTEGER NOT NULL,
                avg_delta_ms INTEGER NOT NULL,
                std_delta_ms INTEGER NOT NULL,
                paste BOOLEAN NOT NULL,
                vk_presses INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_runs_grid ON runs(grid, elapsed_ms)",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn record_run(&self, run: &RunRecord) -> Result<()> {
        let s = &run.summary;
        self.conn.execute(
            r#"
            INSERT INTO runs
            (grid, elapsed_ms, completed_at, duration_ms, moves, trusted, untrusted,
             avg_delta_ms, std_delta_ms, paste, vk_presses)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                run.grid.id(),
                run.elapsed_ms as i64,
                run.completed_at.to_rfc3339(),
                s.duration_ms as i64,
                s.move_count,
                s.trusted_count,
                s.untrusted_count,
                s.avg_delta_ms as i64,
                s.std_delta_ms as i64,
                s.paste_occurred,
                s.virtual_key_press_count,
            ],
        )?;
        tracing::debug!(grid = %run.grid, elapsed_ms = run.elapsed_ms, "run saved to history");
        Ok(())
    }

    /// Fastest accepted time for a grid
    pub fn best_time(&self, grid: GridPreset) -> Result<Option<u64>> {
        let best: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT MIN(elapsed_ms) FROM runs WHERE grid = ?1",
                [grid.id()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(best.flatten().map(|ms| ms as u64))
    }

    /// Most recent runs first
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT grid, elapsed_ms, completed_at, duration_ms, moves, trusted, untrusted,
                   avg_delta_ms, std_delta_ms, paste, vk_presses
            FROM runs
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let grid_id: String = row.get(0)?;
            let grid = grid_id.parse::<GridPreset>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?;
            let completed: String = row.get(2)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                })?
                .with_timezone(&Utc);

            Ok(RunRecord {
                grid,
                elapsed_ms: row.get::<_, i64>(1)? as u64,
                completed_at,
                summary: SessionSummary {
                    grid,
                    duration_ms: row.get::<_, i64>(3)? as u64,
                    move_count: row.get(4)?,
                    trusted_count: row.get(5)?,
                    untrusted_count: row.get(6)?,
                    avg_delta_ms: row.get::<_, i64>(7)? as u64,
                    std_delta_ms: row.get::<_, i64>(8)? as u64,
                    paste_occurred: row.get(9)?,
                    virtual_key_press_count: row.get(10)?,
                },
            })
        })?;

        let mut runs = Vec::new();
        for run in rows {
            runs.push(run?);
        }
        Ok(runs)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM runs", [])?;
        Ok(())
    }
}
