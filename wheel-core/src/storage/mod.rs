pub mod spin_store;

pub use spin_store::SpinLedger;

use crate::error::{Result, WheelError};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite connection owned by one service instance.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn open(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WheelError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        Self::from_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?).await
    }

    async fn from_connection(conn: Connection) -> Result<Self> {
        // Another process may hold the write lock briefly
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // One row per user; the primary key is what makes a claim exclusive
        conn.execute(
            "CREATE TABLE IF NOT EXISTS spins (
                telegram_id INTEGER PRIMARY KEY,
                prize TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Flush and release the connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner();
        conn.close().map_err(|(_, e)| WheelError::Storage(e))
    }
}
