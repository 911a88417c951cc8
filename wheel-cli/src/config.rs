use std::path::PathBuf;
use wheel_core::config::DEFAULT_DB_FILE;
use wheel_core::{Result, WheelConfig};

/// Environment configuration, with the database placed under the data
/// directory unless `DB_PATH` says otherwise.
pub fn load(data_dir: Option<PathBuf>) -> Result<WheelConfig> {
    let mut config = WheelConfig::from_env()?;

    if std::env::var_os("DB_PATH").is_none() {
        config.db_path = data_dir.unwrap_or_else(default_data_dir).join(DEFAULT_DB_FILE);
    }

    tracing::debug!("Using {:?}", config);
    Ok(config)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fortune-wheel")
}
