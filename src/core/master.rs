//! Reference data - partners, warehouses and storage locations, plus config seeding.

use crate::{
    config::master::Config,
    core::product,
    entities::{Location, Partner, Product, Warehouse, location, partner, warehouse},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::fmt;
use tracing::{debug, info};

/// Whether a partner buys from us or sells to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerKind {
    /// Buys goods (sales orders, returns)
    Customer,
    /// Sells goods (purchase orders)
    Supplier,
}

impl PartnerKind {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
        }
    }

    /// Parses the stored or configured string form, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "supplier" => Some(Self::Supplier),
            _ => None,
        }
    }
}

impl fmt::Display for PartnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Registers a customer or supplier.
///
/// # Errors
/// Returns an error if the code or name is empty, the code is taken, or the insert fails.
pub async fn create_partner(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    kind: PartnerKind,
) -> Result<partner::Model> {
    let code = require(code, "code")?;
    let name = require(name, "name")?;

    if Partner::find_by_id(code.as_str()).one(db).await?.is_some() {
        return Err(Error::DuplicateId {
            entity: "partner",
            code,
        });
    }

    partner::ActiveModel {
        code: Set(code),
        name: Set(name),
        kind: Set(kind.as_str().to_string()),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists partners ordered by code, optionally only one kind.
pub async fn list_partners(
    db: &DatabaseConnection,
    kind: Option<PartnerKind>,
) -> Result<Vec<partner::Model>> {
    let mut query = Partner::find().order_by_asc(partner::Column::Code);
    if let Some(kind) = kind {
        query = query.filter(partner::Column::Kind.eq(kind.as_str()));
    }
    query.all(db).await.map_err(Into::into)
}

/// Registers a warehouse.
pub async fn create_warehouse(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
) -> Result<warehouse::Model> {
    let code = require(code, "code")?;
    let name = require(name, "name")?;

    if Warehouse::find_by_id(code.as_str()).one(db).await?.is_some() {
        return Err(Error::DuplicateId {
            entity: "warehouse",
            code,
        });
    }

    warehouse::ActiveModel {
        code: Set(code),
        name: Set(name),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists warehouses ordered by code.
pub async fn list_warehouses(db: &DatabaseConnection) -> Result<Vec<warehouse::Model>> {
    Warehouse::find()
        .order_by_asc(warehouse::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a storage location inside an existing warehouse.
///
/// # Errors
/// Returns an error if the code is empty or taken, the warehouse does not exist, or the
/// insert fails.
pub async fn create_location(
    db: &DatabaseConnection,
    code: &str,
    warehouse_code: &str,
    description: Option<String>,
) -> Result<location::Model> {
    let code = require(code, "code")?;
    let warehouse_code = require(warehouse_code, "warehouse")?;

    if Warehouse::find_by_id(warehouse_code.as_str())
        .one(db)
        .await?
        .is_none()
    {
        return Err(Error::WarehouseNotFound {
            code: warehouse_code,
        });
    }

    if Location::find_by_id(code.as_str()).one(db).await?.is_some() {
        return Err(Error::DuplicateId {
            entity: "location",
            code,
        });
    }

    location::ActiveModel {
        code: Set(code),
        warehouse_code: Set(warehouse_code),
        description: Set(description.filter(|d| !d.trim().is_empty())),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists locations ordered by code, optionally only those of one warehouse.
pub async fn list_locations(
    db: &DatabaseConnection,
    warehouse_code: Option<&str>,
) -> Result<Vec<location::Model>> {
    let mut query = Location::find().order_by_asc(location::Column::Code);
    if let Some(code) = warehouse_code {
        query = query.filter(location::Column::WarehouseCode.eq(code));
    }
    query.all(db).await.map_err(Into::into)
}

/// Number of records inserted by [`seed_master_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Products inserted
    pub products: usize,
    /// Partners inserted
    pub partners: usize,
    /// Warehouses inserted
    pub warehouses: usize,
    /// Locations inserted
    pub locations: usize,
}

/// Inserts configured master data whose key is not present yet.
///
/// Existing records are left untouched, so this is safe to run on every start-up.
/// Warehouses are seeded before locations.
///
/// # Errors
/// Returns an error if a configured record fails validation (including an unknown
/// partner kind or a location pointing at an unknown warehouse) or the database fails.
pub async fn seed_master_data(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for p in &config.products {
        if Product::find_by_id(p.sku.trim()).one(db).await?.is_some() {
            debug!("Product {} already present, skipping", p.sku);
            continue;
        }
        product::create_product(
            db,
            p.sku.clone(),
            p.name.clone(),
            p.category.clone(),
            p.reorder_threshold,
        )
        .await?;
        summary.products += 1;
    }

    for p in &config.partners {
        if Partner::find_by_id(p.code.trim()).one(db).await?.is_some() {
            continue;
        }
        let kind = PartnerKind::parse(&p.kind).ok_or_else(|| Error::Config {
            message: format!("Unknown partner kind '{}' for {}", p.kind, p.code),
        })?;
        create_partner(db, &p.code, &p.name, kind).await?;
        summary.partners += 1;
    }

    for w in &config.warehouses {
        if Warehouse::find_by_id(w.code.trim()).one(db).await?.is_some() {
            continue;
        }
        create_warehouse(db, &w.code, &w.name).await?;
        summary.warehouses += 1;
    }

    for l in &config.locations {
        if Location::find_by_id(l.code.trim()).one(db).await?.is_some() {
            continue;
        }
        create_location(db, &l.code, &l.warehouse, l.description.clone()).await?;
        summary.locations += 1;
    }

    info!(
        "Seeded master data: {} products, {} partners, {} warehouses, {} locations",
        summary.products, summary.partners, summary.warehouses, summary.locations
    );
    Ok(summary)
}
