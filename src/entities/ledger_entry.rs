//! Ledger entry entity - Append-only record of every stock quantity change.
//!
//! Each entry has an `entry_date`, a `kind` (see `core::ledger::MovementKind`), the SKU,
//! a single signed `change`, and the reference it originated from. Balances are never
//! stored; they are recomputed by replaying entries in (`entry_date`, `id`) order.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Insertion-ordered identifier, used as the tie-break for same-day entries
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business date of the movement
    pub entry_date: Date,
    /// Movement kind: `"opening"`, `"receipt"`, `"shipment"`, `"return"`, `"adjustment"`, `"disposal"`
    pub kind: String,
    /// SKU of the product that moved
    pub sku: String,
    /// Signed quantity delta (positive for stock increase)
    pub change: i64,
    /// Origin of the movement: `"purchase_order"`, `"sales_order"`, `"return_order"`, ...
    pub reference_type: String,
    /// Optional order or document number (e.g. `"PO-001"`)
    pub reference_id: Option<String>,
    /// Optional free-text note
    pub note: Option<String>,
    /// When the entry was written
    pub recorded_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
