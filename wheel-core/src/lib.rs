//! Fortune wheel core - one prize per Telegram user
//!
//! Verifies the init data a Telegram mini-app forwards to its backend and
//! records, atomically, the single prize each user may claim.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod prize;
pub mod spin;
pub mod storage;
pub mod types;

pub use audit::{SpinLog, SpinLogEntry};
pub use auth::{sign_init_data, validate_init_data, InitDataValidator, VerifiedIdentity, WebAppUser};
pub use config::WheelConfig;
pub use error::{AuthError, Result, WheelError};
pub use prize::{PrizeAssigner, PrizeCatalog};
pub use spin::SpinService;
pub use storage::SpinLedger;
pub use types::{ClaimOutcome, SpinRecord, SpinStatus};
