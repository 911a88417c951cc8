use comfy_table::{presets::UTF8_FULL, Table};
use wheel_core::{Result, SpinLedger, SpinService, WheelConfig};

pub fn list_prizes(config: &WheelConfig) -> Result<()> {
    let catalog = config.catalog()?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Prize"]);
    for (idx, prize) in catalog.prizes().iter().enumerate() {
        table.add_row(vec![idx.to_string(), prize.clone()]);
    }

    println!("{}", table);
    Ok(())
}

pub async fn claim(config: &WheelConfig, init_data: &str) -> Result<()> {
    let service = SpinService::from_config(config).await?;

    let outcome = service.claim(init_data).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    service.close()
}

pub async fn status(config: &WheelConfig, init_data: &str) -> Result<()> {
    let service = SpinService::from_config(config).await?;

    let status = service.status(init_data).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    service.close()
}

pub async fn list_spins(config: &WheelConfig) -> Result<()> {
    let ledger = SpinLedger::open(&config.db_path).await?;
    let records = ledger.list().await?;

    if records.is_empty() {
        println!("No spins recorded in {}", config.db_path.display());
        return ledger.close();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["User ID", "Prize", "Claimed at (UTC)"]);
    for record in &records {
        table.add_row(vec![
            record.user_id.to_string(),
            record.prize.clone(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);
    println!("{} spin(s) recorded", records.len());
    ledger.close()
}
