use mungbob_inventory::{
    config::{database, master},
    core::{
        alerts::{format_expiry_alert, format_low_stock_alert},
        inventory::Inventory,
        master::seed_master_data,
        migrate, today,
    },
    errors::Result,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load master data and alert settings
    let config = master::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed configured master data (existing records are kept)
    seed_master_data(&db, &config)
        .await
        .inspect_err(|e| error!("Failed to seed master data: {}", e))?;

    // 6. Optional one-time import of a legacy snapshot
    if let Ok(path) = env::var("LEGACY_SNAPSHOT_PATH") {
        info!("Importing legacy snapshot from {}", path);
        let snapshot = migrate::load_snapshot(&path)?;
        migrate::import_snapshot(&db, snapshot, today())
            .await
            .inspect_err(|e| error!("Legacy import failed, nothing was written: {}", e))?;
    }

    // 7. Report the current state
    let inventory = Inventory::new(db, config.alerts.policy());
    let dashboard = inventory.dashboard(today()).await?;

    info!("{} lots with stock on hand", dashboard.stock.len());
    for alert in &dashboard.low_stock {
        warn!("{}", format_low_stock_alert(alert));
    }
    for alert in &dashboard.expiring {
        warn!("{}", format_expiry_alert(alert));
    }
    for drift in &dashboard.drift {
        error!(
            "{}: ledger {} vs stock {} (off by {:+})",
            drift.sku,
            drift.ledger_total,
            drift.stock_total,
            drift.difference()
        );
    }

    Ok(())
}
