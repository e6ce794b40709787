//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the persisted collections: master data, stock lots,
//! the stock ledger and return orders.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod ledger_entry;
pub mod location;
pub mod partner;
pub mod product;
pub mod return_order;
pub mod stock_lot;
pub mod warehouse;

// Re-export specific types to avoid conflicts
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel,
};
pub use location::{Column as LocationColumn, Entity as Location, Model as LocationModel};
pub use partner::{Column as PartnerColumn, Entity as Partner, Model as PartnerModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use return_order::{
    Column as ReturnOrderColumn, Entity as ReturnOrder, Model as ReturnOrderModel,
};
pub use stock_lot::{Column as StockLotColumn, Entity as StockLot, Model as StockLotModel};
pub use warehouse::{Column as WarehouseColumn, Entity as Warehouse, Model as WarehouseModel};
