//! Shared test utilities for `MungBob` inventory.
//!
//! This module provides common helper functions for setting up test databases
//! and creating products and lots with sensible defaults.

use crate::{
    core::{
        ledger::ReferenceType,
        product,
        stock::{self, StockMovement, StockPayload},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `name`: "Test product `<sku>`"
/// * `category`: "dog food"
pub async fn create_test_product(
    db: &DatabaseConnection,
    sku: &str,
    reorder_threshold: i64,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        sku.to_string(),
        format!("Test product {sku}"),
        "dog food".to_string(),
        reorder_threshold,
    )
    .await
}

/// Creates a test product with a custom name.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    sku: &str,
    name: &str,
    reorder_threshold: i64,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        sku.to_string(),
        name.to_string(),
        "dog food".to_string(),
        reorder_threshold,
    )
    .await
}

/// Receives `quantity` units into a lot as a purchase-order receipt.
///
/// `expires_on` is a `YYYY-MM-DD` string for brevity in tests.
pub async fn receive_test_lot(
    db: &DatabaseConnection,
    sku: &str,
    lot_id: &str,
    location: &str,
    quantity: i64,
    expires_on: Option<&str>,
) -> Result<StockMovement> {
    let mut payload =
        StockPayload::new(sku, lot_id, quantity, ReferenceType::PurchaseOrder).at(location);
    if let Some(date) = expires_on {
        payload = payload.expiring(crate::core::migrate::parse_legacy_date(date)?);
    }
    stock::receive_stock(db, payload).await
}

/// A sales-order shipment payload with no location, reference or date.
#[must_use]
pub fn ship_payload(sku: &str, lot_id: &str, quantity: i64) -> StockPayload {
    StockPayload::new(sku, lot_id, quantity, ReferenceType::SalesOrder)
}
