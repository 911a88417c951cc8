use chrono::Utc;
use clap::Args;
use std::collections::BTreeMap;
use wheel_core::auth::USER_FIELD;
use wheel_core::{sign_init_data, Result, WebAppUser, WheelConfig};

#[derive(Args)]
pub struct SignArgs {
    /// Telegram user ID
    #[arg(long)]
    user_id: i64,
    /// Telegram username, without the @
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    /// Unix timestamp for auth_date (defaults to now)
    #[arg(long)]
    auth_date: Option<i64>,
}

pub fn sign(args: SignArgs, config: &WheelConfig) -> Result<()> {
    let user = WebAppUser {
        id: args.user_id,
        username: args.username,
        first_name: args.first_name,
        last_name: args.last_name,
    };

    let mut fields = BTreeMap::new();
    fields.insert(
        "auth_date".to_string(),
        args.auth_date.unwrap_or_else(|| Utc::now().timestamp()).to_string(),
    );
    fields.insert(USER_FIELD.to_string(), serde_json::to_string(&user)?);

    println!("{}", sign_init_data(&fields, &config.bot_token)?);
    Ok(())
}
