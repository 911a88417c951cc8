use crate::error::{Result, WheelError};
use crate::prize::{PrizeCatalog, DEFAULT_PRIZES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE: &str = "wheel.db";

#[derive(Clone, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Token of the bot that launches the mini-app; signs init data
    #[serde(default, skip_serializing)]
    pub bot_token: String,
    /// User allowed to spin repeatedly without being recorded
    pub admin_user_id: Option<i64>,
    pub db_path: PathBuf,
    /// Spin audit log directory; no audit log when unset
    pub log_dir: Option<PathBuf>,
    pub prizes: Vec<String>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            admin_user_id: None,
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_dir: None,
            prizes: DEFAULT_PRIZES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl WheelConfig {
    /// Read `BOT_TOKEN`, `ADMIN_USER_ID`, `DB_PATH`, `LOG_DIR` and
    /// `WHEEL_PRIZES` (comma separated) from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(token) = lookup("BOT_TOKEN") {
            config.bot_token = token.trim().to_string();
        }

        if let Some(raw) = lookup("ADMIN_USER_ID").filter(|v| !v.trim().is_empty()) {
            let id: i64 = raw.trim().parse().map_err(|e| {
                WheelError::config(format!("ADMIN_USER_ID '{}' is not an integer: {}", raw, e))
            })?;
            // 0 is the historical "no admin" value
            config.admin_user_id = (id != 0).then_some(id);
        }

        if let Some(path) = lookup("DB_PATH").filter(|v| !v.is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        config.log_dir = lookup("LOG_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup("WHEEL_PRIZES") {
            config.prizes = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    pub fn catalog(&self) -> Result<PrizeCatalog> {
        PrizeCatalog::new(self.prizes.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(WheelError::config("BOT_TOKEN is not set"));
        }

        if self.db_path.as_os_str().is_empty() {
            return Err(WheelError::config("Database path cannot be empty"));
        }

        self.catalog()?;
        Ok(())
    }
}

impl std::fmt::Debug for WheelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WheelConfig")
            .field("bot_token", &if self.bot_token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("admin_user_id", &self.admin_user_id)
            .field("db_path", &self.db_path)
            .field("log_dir", &self.log_dir)
            .field("prizes", &self.prizes)
            .finish()
    }
}
