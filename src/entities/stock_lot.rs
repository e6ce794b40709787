//! Stock lot entity - One physical batch of a SKU at one location.
//!
//! Lots are created on receipt and mutated in place. They are never deleted: a lot
//! shipped down to zero stays in the table and is filtered out of stock views.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock lot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_lots")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// SKU of the product (not enforced against `products`)
    pub sku: String,
    /// Lot identifier (e.g. `"D01-A251110"`)
    pub lot_id: String,
    /// Storage location code
    pub location: String,
    /// Units currently in the lot, never negative
    pub quantity: i64,
    /// Date the lot was first received
    pub received_on: Date,
    /// Best-before date, if the product has one
    pub expires_on: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
