use crate::error::Result;
use crate::storage::Storage;
use crate::types::SpinRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

/// Durable record of who has already spun the wheel.
///
/// Every method takes the storage mutex for its whole duration, and
/// [`SpinLedger::reserve`] is a single insert-if-absent statement, so a
/// concurrent reserve for the same user can never overwrite the first one.
pub struct SpinLedger {
    storage: Storage,
}

impl SpinLedger {
    pub async fn open(db_path: &Path) -> Result<Self> {
        let storage = Storage::open(db_path).await?;
        tracing::debug!("Opened spin ledger at {}", db_path.display());
        Ok(Self { storage })
    }

    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self {
            storage: Storage::open_in_memory().await?,
        })
    }

    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<SpinRecord>> {
        let conn = self.storage.get_connection().await;

        let record = conn
            .query_row(
                "SELECT telegram_id, prize, created_at FROM spins WHERE telegram_id = ?1",
                params![user_id],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Create the record for `user_id` unless one exists.
    ///
    /// Returns `true` if this call created it. On `false` nothing was written
    /// and the caller must re-read to learn the stored prize.
    pub async fn reserve(&self, user_id: i64, prize: &str, created_at: DateTime<Utc>) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let inserted = conn.execute(
            "INSERT INTO spins (telegram_id, prize, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(telegram_id) DO NOTHING",
            params![user_id, prize, format_timestamp(&created_at)],
        )?;

        Ok(inserted == 1)
    }

    /// All records, oldest first.
    pub async fn list(&self) -> Result<Vec<SpinRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT telegram_id, prize, created_at FROM spins ORDER BY created_at ASC, telegram_id ASC",
        )?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let conn = self.storage.get_connection().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM spins", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SpinRecord> {
    let created_at: String = row.get(2)?;
    Ok(SpinRecord {
        user_id: row.get(0)?,
        prize: row.get(1)?,
        created_at: parse_timestamp(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
    })
}

// ISO-8601 with an explicit +00:00 offset
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}
