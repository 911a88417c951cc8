use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's claimed prize. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub user_id: i64,
    pub prize: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a claim as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// The prize was assigned by an earlier claim
    pub already: bool,
    pub prize: String,
    /// False only for the privileged identity, whose spins are not persisted
    pub locked: bool,
}

impl ClaimOutcome {
    pub fn fresh(prize: impl Into<String>) -> Self {
        Self {
            already: false,
            prize: prize.into(),
            locked: true,
        }
    }

    pub fn existing(prize: impl Into<String>) -> Self {
        Self {
            already: true,
            prize: prize.into(),
            locked: true,
        }
    }

    pub fn preview(prize: impl Into<String>) -> Self {
        Self {
            already: false,
            prize: prize.into(),
            locked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinStatus {
    pub has_spun: bool,
    pub prize: Option<String>,
}

impl From<Option<SpinRecord>> for SpinStatus {
    fn from(record: Option<SpinRecord>) -> Self {
        match record {
            Some(record) => Self {
                has_spun: true,
                prize: Some(record.prize),
            },
            None => Self {
                has_spun: false,
                prize: None,
            },
        }
    }
}
