//! Partner entity - Customers and suppliers referenced by orders and returns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Partner database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    /// Partner code (e.g. `"C-2001"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    /// Business name
    pub name: String,
    /// `"customer"` or `"supplier"`
    pub kind: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
