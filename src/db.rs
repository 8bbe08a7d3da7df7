use crate::entities::{AxieClass, PersistedCreature};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// One ingestion cycle, kept for operators (never read by retrieval)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngestionRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetched: i64,
    pub written: i64,
    pub skipped: i64,
    /// "completed", "empty" or "failed: <message>"
    pub outcome: String,
}

impl IngestionRun {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            finished_at: now,
            fetched: 0,
            written: 0,
            skipped: 0,
            outcome: String::new(),
        }
    }

    pub fn finish(mut self, outcome: impl Into<String>) -> Self {
        self.finished_at = Utc::now();
        self.outcome = outcome.into();
        self
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    // (in-memory databases report "memory" and stay that way)
    let _mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    // ==========================================================================
    // Class stores (one table per class, identical shape)
    // ==========================================================================
    for class in AxieClass::ALL {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    axie_id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    stage INTEGER NOT NULL,
                    current_price_usd TEXT NOT NULL
                )",
                class.table_name()
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Ingestion run log
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ingestion_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            fetched INTEGER NOT NULL,
            written INTEGER NOT NULL,
            skipped INTEGER NOT NULL,
            outcome TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_started_at ON ingestion_runs(started_at)",
        [],
    )?;

    Ok(())
}

/// Insert or refresh one creature in its class table, keyed on axie_id
pub fn upsert_creature(conn: &Connection, class: AxieClass, creature: &PersistedCreature) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (axie_id, name, stage, current_price_usd)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(axie_id) DO UPDATE SET
                name = excluded.name,
                stage = excluded.stage,
                current_price_usd = excluded.current_price_usd",
            class.table_name()
        ),
        params![
            creature.external_id,
            creature.display_name,
            creature.stage,
            creature.price_usd.to_string(),
        ],
    )?;

    Ok(())
}

pub fn get_creatures(conn: &Connection, class: AxieClass) -> Result<Vec<PersistedCreature>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT axie_id, name, stage, current_price_usd
         FROM {}
         ORDER BY axie_id",
        class.table_name()
    ))?;

    let creatures = stmt
        .query_map([], |row| {
            let price_text: String = row.get(3)?;
            let price_usd = Decimal::from_str(&price_text).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?;

            Ok(PersistedCreature {
                external_id: row.get(0)?,
                display_name: row.get(1)?,
                stage: row.get(2)?,
                price_usd,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(creatures)
}

pub fn count_creatures(conn: &Connection, class: AxieClass) -> Result<i64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", class.table_name()),
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

pub fn insert_run(conn: &Connection, run: &IngestionRun) -> Result<()> {
    conn.execute(
        "INSERT INTO ingestion_runs (
            run_id, started_at, finished_at, fetched, written, skipped, outcome
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            run.run_id,
            run.started_at.to_rfc3339(),
            run.finished_at.to_rfc3339(),
            run.fetched,
            run.written,
            run.skipped,
            run.outcome,
        ],
    )?;

    Ok(())
}

/// Most recent runs first
pub fn get_runs(conn: &Connection, limit: usize) -> Result<Vec<IngestionRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, started_at, finished_at, fetched, written, skipped, outcome
         FROM ingestion_runs
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let runs = stmt
        .query_map(params![limit as i64], |row| {
            let started_str: String = row.get(1)?;
            let finished_str: String = row.get(2)?;

            Ok(IngestionRun {
                run_id: row.get(0)?,
                started_at: parse_timestamp(&started_str, 1)?,
                finished_at: parse_timestamp(&finished_str, 2)?,
                fetched: row.get(3)?,
                written: row.get(4)?,
                skipped: row.get(5)?,
                outcome: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(runs)
}

/// Delete all but the newest `keep` runs. Returns the number of rows removed.
pub fn prune_runs(conn: &Connection, keep: usize) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM ingestion_runs
         WHERE id NOT IN (SELECT id FROM ingestion_runs ORDER BY id DESC LIMIT ?1)",
        params![keep as i64],
    )?;
    Ok(removed)
}

fn parse_timestamp(text: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

// ============================================================================
// Shared handle
// ============================================================================

/// Connection shared between concurrent requests.
///
/// The lock is taken per statement group, never across a whole batch, so a
/// reader can interleave with an in-progress ingestion.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("database lock poisoned"))
    }

    /// Store handle for one class
    pub fn store(&self, class: AxieClass) -> ClassStore {
        ClassStore {
            db: self.clone(),
            class,
        }
    }

    pub fn record_run(&self, run: &IngestionRun) -> Result<()> {
        let conn = self.lock()?;
        insert_run(&conn, run)
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<IngestionRun>> {
        let conn = self.lock()?;
        get_runs(&conn, limit)
    }

    pub fn prune_runs(&self, keep: usize) -> Result<usize> {
        let conn = self.lock()?;
        prune_runs(&conn, keep)
    }
}

/// The same store abstraction for all nine classes, parameterized by class
#[derive(Clone)]
pub struct ClassStore {
    db: Database,
    class: AxieClass,
}

impl ClassStore {
    pub fn class(&self) -> AxieClass {
        self.class
    }

    pub fn upsert(&self, creature: &PersistedCreature) -> Result<()> {
        let conn = self.db.lock()?;
        upsert_creature(&conn, self.class, creature)
    }

    pub fn list_all(&self) -> Result<Vec<PersistedCreature>> {
        let conn = self.db.lock()?;
        get_creatures(&conn, self.class)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.db.lock()?;
        count_creatures(&conn, self.class)
    }
}
