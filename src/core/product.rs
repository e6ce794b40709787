//! Product business logic - Handles the product master data.
//!
//! Products are keyed by SKU and carry the reorder threshold used by low-stock alerting.
//! Deleting a product is a hard delete: stock lots and ledger entries that reference the
//! SKU stay where they are and are shown with the [`UNKNOWN_PRODUCT_LABEL`] fallback.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;
use tracing::{info, warn};

/// Label shown for a SKU that has no product record.
pub const UNKNOWN_PRODUCT_LABEL: &str = "(unknown)";

fn validate_product(sku: &str, name: &str, reorder_threshold: i64) -> Result<()> {
    if sku.trim().is_empty() {
        return Err(Error::MissingField { field: "sku" });
    }

    if name.trim().is_empty() {
        return Err(Error::MissingField { field: "name" });
    }

    if reorder_threshold < 0 {
        return Err(Error::InvalidQuantity {
            quantity: reorder_threshold,
        });
    }

    Ok(())
}

/// Retrieves all products ordered by SKU.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Sku)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by SKU, returning None if it does not exist.
pub async fn get_product_by_sku(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Option<product::Model>> {
    Product::find_by_id(sku.trim())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product after validating its fields.
///
/// # Errors
/// Returns an error if:
/// - The SKU or name is empty or whitespace-only
/// - The reorder threshold is negative
/// - A product with the same SKU already exists
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    sku: String,
    name: String,
    category: String,
    reorder_threshold: i64,
) -> Result<product::Model> {
    validate_product(&sku, &name, reorder_threshold)?;

    let sku = sku.trim().to_string();
    if Product::find_by_id(sku.as_str()).one(db).await?.is_some() {
        return Err(Error::DuplicateProduct { sku });
    }

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        sku: Set(sku),
        name: Set(name.trim().to_string()),
        category: Set(category.trim().to_string()),
        reorder_threshold: Set(reorder_threshold),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = product.insert(db).await?;
    info!("Created product {} ({})", created.sku, created.name);
    Ok(created)
}

/// Updates the name, category and reorder threshold of an existing product.
///
/// # Errors
/// Returns an error if validation fails, the product does not exist, or the update fails.
pub async fn update_product(
    db: &DatabaseConnection,
    sku: &str,
    new_name: String,
    new_category: String,
    new_reorder_threshold: i64,
) -> Result<product::Model> {
    validate_product(sku, &new_name, new_reorder_threshold)?;

    let mut product: product::ActiveModel = Product::find_by_id(sku.trim())
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            sku: sku.trim().to_string(),
        })?
        .into();

    product.name = Set(new_name.trim().to_string());
    product.category = Set(new_category.trim().to_string());
    product.reorder_threshold = Set(new_reorder_threshold);
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    product.update(db).await.map_err(Into::into)
}

/// Deletes a product and returns the removed record.
///
/// Stock lots and ledger entries for the SKU are not touched.
pub async fn delete_product(db: &DatabaseConnection, sku: &str) -> Result<product::Model> {
    let product = Product::find_by_id(sku.trim())
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            sku: sku.trim().to_string(),
        })?;

    Product::delete_by_id(product.sku.as_str()).exec(db).await?;
    warn!(
        "Deleted product {}; existing lots and ledger rows are kept",
        product.sku
    );
    Ok(product)
}

/// Loads a SKU → name map for display joins.
pub async fn product_names<C>(db: &C) -> Result<HashMap<String, String>>
where
    C: ConnectionTrait,
{
    let products = Product::find().all(db).await?;
    Ok(products.into_iter().map(|p| (p.sku, p.name)).collect())
}

/// Returns the product name for `sku`, or [`UNKNOWN_PRODUCT_LABEL`] for orphaned SKUs.
#[must_use]
pub fn display_name<'a>(names: &'a HashMap<String, String>, sku: &str) -> &'a str {
    names.get(sku).map_or(UNKNOWN_PRODUCT_LABEL, String::as_str)
}
