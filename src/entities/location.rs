//! Location entity - A storage bin or rack slot inside a warehouse.
//!
//! Stock lots store their location as a plain code, so a lot may point at a location
//! that was never registered (e.g. the receiving staging area).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage location database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    /// Location code (e.g. `"WH01-A-01"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    /// Code of the warehouse this location belongs to
    pub warehouse_code: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// Defines relationships between Location and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each location belongs to one warehouse
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseCode",
        to = "super::warehouse::Column::Code"
    )]
    Warehouse,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
