//! SQLite event log.
//!
//! Mirrors every committed vault event out of the ledger snapshot into an
//! append-only `events` table, and records owner check-ins (zero-amount
//! withdrawals) in `checkin_log`. A key-value `meta` table remembers how far
//! the mirror has caught up.

use heirvault_chain::{Call, Ledger};
use heirvault_core::Wei;
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;

/// Open (or create) the database at `path` and run migrations.
pub fn open_db(path: &Path) -> SqlResult<Connection> {
    let conn = Connection::open(path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            block_number INTEGER NOT NULL,
            timestamp    INTEGER NOT NULL,
            vault        TEXT NOT NULL,
            kind         TEXT NOT NULL,
            payload      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS events_vault ON events (vault);

        CREATE TABLE IF NOT EXISTS checkin_log (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            block_number INTEGER NOT NULL,
            timestamp    INTEGER NOT NULL,
            vault        TEXT NOT NULL,
            owner        TEXT NOT NULL
        );
        ",
    )?;

    Ok(conn)
}

// ============================================================================
// Meta helpers (key-value)
// ============================================================================

const SYNCED_BLOCK: &str = "synced_block";

pub fn meta_get(conn: &Connection, key: &str) -> SqlResult<Option<String>> {
    let mut stmt = conn.prepare_cached("SELECT value FROM meta WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Set a meta value (upsert).
pub fn meta_set(conn: &Connection, key: &str, value: &str) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Highest block whose receipts have been mirrored (0 if none).
pub fn synced_block(conn: &Connection) -> SqlResult<u64> {
    Ok(meta_get(conn, SYNCED_BLOCK)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

// ============================================================================
// Events
// ============================================================================

/// A mirrored vault event.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub block_number: u64,
    pub timestamp: u64,
    pub vault: String,
    pub kind: String,
    /// The event as JSON
    pub payload: String,
}

/// All events, oldest first, optionally only those of one vault.
pub fn event_list(conn: &Connection, vault: Option<&str>) -> SqlResult<Vec<EventRow>> {
    let mut stmt = conn.prepare_cached(
        "SELECT block_number, timestamp, vault, kind, payload
         FROM events WHERE ?1 IS NULL OR vault = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![vault], |row| {
        Ok(EventRow {
            block_number: row.get(0)?,
            timestamp: row.get(1)?,
            vault: row.get(2)?,
            kind: row.get(3)?,
            payload: row.get(4)?,
        })
    })?;
    rows.collect()
}

// ============================================================================
// Check-in log
// ============================================================================

/// Most recent owner check-in time for `vault`.
pub fn checkin_last(conn: &Connection, vault: &str) -> SqlResult<Option<u64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT timestamp FROM checkin_log WHERE vault = ?1 ORDER BY id DESC LIMIT 1",
    )?;
    let mut rows = stmt.query(params![vault])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub fn checkin_count(conn: &Connection, vault: &str) -> SqlResult<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM checkin_log WHERE vault = ?1",
        params![vault],
        |row| row.get(0),
    )
}

// ============================================================================
// Ledger mirror
// ============================================================================

/// Append events from receipts mined since the last sync.
///
/// Reverted transactions carry no events and are skipped. Returns the number
/// of events written.
pub fn sync_ledger(conn: &mut Connection, ledger: &Ledger) -> SqlResult<usize> {
    let from_block = synced_block(conn)?;
    let tx = conn.transaction()?;
    let mut written = 0;

    for receipt in ledger
        .receipts()
        .iter()
        .filter(|r| r.block_number > from_block && r.is_success())
    {
        let vault = receipt.to.to_string();
        for event in &receipt.events {
            let payload = serde_json::to_string(event)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            tx.execute(
                "INSERT INTO events (block_number, timestamp, vault, kind, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    receipt.block_number,
                    receipt.timestamp.as_secs(),
                    vault,
                    event.name(),
                    payload
                ],
            )?;
            written += 1;
        }

        if let Call::Withdraw { amount } = receipt.call {
            if amount == Wei::ZERO {
                tx.execute(
                    "INSERT INTO checkin_log (block_number, timestamp, vault, owner)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        receipt.block_number,
                        receipt.timestamp.as_secs(),
                        vault,
                        receipt.from.to_string()
                    ],
                )?;
            }
        }
    }

    meta_set(&tx, SYNCED_BLOCK, &ledger.head().number.to_string())?;
    tx.commit()?;

    if written > 0 {
        log::debug!("Mirrored {} events up to block {}", written, ledger.head().number);
    }
    Ok(written)
}

// ============================================================================
// Tests
// ============================================================================
