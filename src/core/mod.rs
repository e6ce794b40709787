//! Core business logic - storage-backed stock, ledger and reporting operations.
//!
//! Every function takes a `SeaORM` connection and returns structured data; nothing here
//! formats for a particular front end beyond plain one-line summaries.

/// Expiry and low-stock alerting
pub mod alerts;
/// `Inventory` service object owning the connection
pub mod inventory;
/// Ledger vocabulary, replay and reconciliation
pub mod ledger;
/// Partners, warehouses and storage locations
pub mod master;
/// One-time import of legacy key-value snapshots
pub mod migrate;
/// Product master data
pub mod product;
/// Customer returns
pub mod returns;
/// Stock lots and the receive/ship transaction
pub mod stock;

use chrono::{NaiveDate, Utc};

/// Today's date in UTC, used when an operation is not given an explicit business date.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
