//! Append-only CSV log of claims, compatible with the existing `spins.csv`.

use crate::auth::WebAppUser;
use crate::error::{Result, WheelError};
use crate::types::ClaimOutcome;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const SPIN_LOG_FILE: &str = "spins.csv";

const HEADER: [&str; 5] = ["timestamp", "user_id", "user_name", "prize", "already"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub user_name: String,
    pub prize: String,
    pub already: bool,
}

impl SpinLogEntry {
    fn to_record(&self) -> [String; 5] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            self.user_id.to_string(),
            self.user_name.clone(),
            self.prize.clone(),
            if self.already { "1" } else { "0" }.to_string(),
        ]
    }

    fn from_record(record: &csv::StringRecord) -> Result<Self> {
        let column = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                WheelError::internal(format!("Spin log row is missing column {}", HEADER[idx]))
            })
        };

        let timestamp = DateTime::parse_from_rfc3339(column(0)?)
            .map_err(|e| WheelError::internal(format!("Bad spin log timestamp: {}", e)))?
            .with_timezone(&Utc);
        let user_id = column(1)?
            .parse()
            .map_err(|e| WheelError::internal(format!("Bad spin log user_id: {}", e)))?;
        let already = match column(4)? {
            "1" => true,
            "0" => false,
            other => {
                return Err(WheelError::internal(format!(
                    "Bad spin log already flag: {}",
                    other
                )))
            }
        };

        Ok(Self {
            timestamp,
            user_id,
            user_name: column(2)?.to_string(),
            prize: column(3)?.to_string(),
            already,
        })
    }
}

pub struct SpinLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SpinLog {
    pub fn new(log_dir: &Path) -> Self {
        Self {
            path: log_dir.join(SPIN_LOG_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, user: &WebAppUser, outcome: &ClaimOutcome) -> Result<()> {
        let entry = SpinLogEntry {
            timestamp: Utc::now(),
            user_id: user.id,
            user_name: user.display_name(),
            prize: outcome.prize.clone(),
            already: outcome.already,
        };

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }
        writer.write_record(entry.to_record())?;
        writer.flush()?;

        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<SpinLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for record in reader.records() {
            entries.push(SpinLogEntry::from_record(&record?)?);
        }

        Ok(entries)
    }
}

impl std::fmt::Debug for SpinLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLog").field("path", &self.path).finish()
    }
}
