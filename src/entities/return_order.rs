//! Return order entity - Goods sent back by a customer awaiting restock or disposal.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Return order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "return_orders")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Return document number (e.g. `"RT-001"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Customer the goods came back from
    pub customer: String,
    /// Category label, `"Other"` when none was given
    pub category: String,
    /// SKU of the returned product
    pub sku: String,
    /// Returned units
    pub quantity: i64,
    /// Date of the original sale
    pub transaction_date: Date,
    /// Date the goods came back
    pub return_date: Date,
    /// `"pending"`, `"restocked"` or `"disposed"`
    pub status: String,
    /// Date the return was restocked or disposed
    pub resolved_on: Option<Date>,
    /// When the return was registered
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
