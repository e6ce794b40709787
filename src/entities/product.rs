//! Product entity - Master record for a stockable item, keyed by SKU.
//!
//! Products carry the reorder threshold used by low-stock alerting. Stock lots and
//! ledger entries reference products by SKU string only; deleting a product leaves
//! those rows in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Stock keeping unit, unique product key (e.g. `"SKU-D01"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub sku: String,
    /// Display name of the product
    pub name: String,
    /// Category label (e.g. "dog food", "cat food")
    pub category: String,
    /// Aggregate quantity below which the product is flagged for reordering
    pub reorder_threshold: i64,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Products have no enforced relationships; lots and ledger rows join by SKU string
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
