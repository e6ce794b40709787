//! Customer returns - register, then either restock or dispose.
//!
//! Restocking goes through the same receive step as any other receipt, inside one
//! database transaction with the status change. Disposal only closes the return: the
//! goods never re-entered stock, so no lot or ledger row changes.

use crate::{
    core::{
        ledger::ReferenceType,
        stock::{self, StockMovement, StockPayload},
        today,
    },
    entities::{ReturnOrder, return_order},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Category used when a return is registered without one.
pub const DEFAULT_RETURN_CATEGORY: &str = "Other";

/// Lifecycle state of a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    /// Registered, not yet handled
    Pending,
    /// Put back into stock
    Restocked,
    /// Written off
    Disposed,
}

impl ReturnStatus {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Restocked => "restocked",
            Self::Disposed => "disposed",
        }
    }
}

/// Input for [`register_return`].
#[derive(Debug, Clone)]
pub struct NewReturn {
    /// Return document number
    pub code: String,
    /// Customer the goods came from
    pub customer: String,
    /// Category label; blank falls back to [`DEFAULT_RETURN_CATEGORY`]
    pub category: Option<String>,
    /// Returned SKU
    pub sku: String,
    /// Returned units
    pub quantity: i64,
    /// Date of the original sale
    pub transaction_date: NaiveDate,
    /// Date the goods came back; today when absent
    pub return_date: Option<NaiveDate>,
}

/// Registers a pending return.
///
/// # Errors
/// Returns an error if a required field is empty, the quantity is not positive, the
/// code is already used, or the insert fails.
pub async fn register_return(
    db: &DatabaseConnection,
    new_return: NewReturn,
) -> Result<return_order::Model> {
    if new_return.code.trim().is_empty() {
        return Err(Error::MissingField { field: "code" });
    }
    if new_return.customer.trim().is_empty() {
        return Err(Error::MissingField { field: "customer" });
    }
    if new_return.sku.trim().is_empty() {
        return Err(Error::MissingField { field: "sku" });
    }
    if new_return.quantity <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: new_return.quantity,
        });
    }

    let code = new_return.code.trim().to_string();
    if get_return_by_code(db, &code).await?.is_some() {
        return Err(Error::DuplicateId {
            entity: "return",
            code,
        });
    }

    let category = new_return
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_RETURN_CATEGORY)
        .to_string();

    let model = return_order::ActiveModel {
        code: Set(code),
        customer: Set(new_return.customer.trim().to_string()),
        category: Set(category),
        sku: Set(new_return.sku.trim().to_string()),
        quantity: Set(new_return.quantity),
        transaction_date: Set(new_return.transaction_date),
        return_date: Set(new_return.return_date.unwrap_or_else(today)),
        status: Set(ReturnStatus::Pending.as_str().to_string()),
        resolved_on: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(
        "Registered return {} from {}: {} x {}",
        created.code, created.customer, created.quantity, created.sku
    );
    Ok(created)
}

/// Finds a return by its document number.
pub async fn get_return_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<return_order::Model>> {
    ReturnOrder::find()
        .filter(return_order::Column::Code.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists returns, newest registration first, optionally only one status.
pub async fn list_returns(
    db: &DatabaseConnection,
    status: Option<ReturnStatus>,
) -> Result<Vec<return_order::Model>> {
    let mut query = ReturnOrder::find().order_by_desc(return_order::Column::Id);
    if let Some(status) = status {
        query = query.filter(return_order::Column::Status.eq(status.as_str()));
    }
    query.all(db).await.map_err(Into::into)
}

async fn find_pending<C>(db: &C, code: &str) -> Result<return_order::Model>
where
    C: ConnectionTrait,
{
    let found = ReturnOrder::find()
        .filter(return_order::Column::Code.eq(code.trim()))
        .one(db)
        .await?
        .ok_or_else(|| Error::ReturnNotFound {
            code: code.trim().to_string(),
        })?;

    if found.status != ReturnStatus::Pending.as_str() {
        return Err(Error::ReturnAlreadyResolved {
            code: found.code,
            status: found.status,
        });
    }
    Ok(found)
}

/// Puts a pending return back into stock and marks it restocked.
///
/// The goods are received into `lot_id` at `location` (the receiving area when `None`)
/// with a `return` ledger entry referencing the return code.
pub async fn restock_return(
    db: &DatabaseConnection,
    code: &str,
    lot_id: &str,
    location: Option<String>,
    expires_on: Option<NaiveDate>,
    date: Option<NaiveDate>,
) -> Result<(return_order::Model, StockMovement)> {
    if lot_id.trim().is_empty() {
        return Err(Error::MissingField { field: "lot_id" });
    }

    let date = date.unwrap_or_else(today);
    let txn = db.begin().await?;
    let pending = find_pending(&txn, code).await?;

    let payload = StockPayload {
        sku: pending.sku.clone(),
        lot_id: lot_id.trim().to_string(),
        quantity: pending.quantity,
        location,
        expires_on,
        reference_type: ReferenceType::ReturnOrder,
        reference_id: Some(pending.code.clone()),
        date: Some(date),
    };
    let movement = stock::receive_in(&txn, payload).await?;

    let mut active: return_order::ActiveModel = pending.into();
    active.status = Set(ReturnStatus::Restocked.as_str().to_string());
    active.resolved_on = Set(Some(date));
    let resolved = active.update(&txn).await?;

    txn.commit().await?;
    info!(
        "Return {} restocked into {} @ {}",
        resolved.code, movement.lot.lot_id, movement.lot.location
    );
    Ok((resolved, movement))
}

/// Marks a pending return as disposed. Stock is not touched.
pub async fn dispose_return(
    db: &DatabaseConnection,
    code: &str,
    date: Option<NaiveDate>,
) -> Result<return_order::Model> {
    let pending = find_pending(db, code).await?;

    let mut active: return_order::ActiveModel = pending.into();
    active.status = Set(ReturnStatus::Disposed.as_str().to_string());
    active.resolved_on = Set(Some(date.unwrap_or_else(today)));
    let resolved = active.update(db).await?;

    info!("Return {} disposed", resolved.code);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::get_ledger_for_sku;
    use crate::core::stock::total_quantity_for_sku;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_return(code: &str, category: Option<&str>) -> NewReturn {
        NewReturn {
            code: code.to_string(),
            customer: "C-2001 (Happy Pet Shop)".to_string(),
            category: category.map(str::to_string),
            sku: "SKU-D01".to_string(),
            quantity: 3,
            transaction_date: "2025-11-12".parse().unwrap(),
            return_date: Some("2025-11-18".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_register_return_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_return("", None);
        let result = register_return(&db, input.clone()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingField { field: "code" }
        ));

        input.code = "RT-001".to_string();
        input.quantity = 0;
        let result = register_return(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_return_defaults_category() -> Result<()> {
        let db = setup_test_db().await?;

        let blank = register_return(&db, new_return("RT-001", Some(""))).await?;
        assert_eq!(blank.category, DEFAULT_RETURN_CATEGORY);
        assert_eq!(blank.status, "pending");

        let given = register_return(&db, new_return("RT-002", Some("damaged"))).await?;
        assert_eq!(given.category, "damaged");

        let duplicate = register_return(&db, new_return("RT-001", None)).await;
        assert!(matches!(
            duplicate.unwrap_err(),
            Error::DuplicateId {
                entity: "return",
                ..
            }
        ));

        let listed = list_returns(&db, Some(ReturnStatus::Pending)).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "RT-002");

        Ok(())
    }

    #[tokio::test]
    async fn test_restock_return_receives_stock() -> Result<()> {
        let db = setup_test_db().await?;
        register_return(&db, new_return("RT-001", None)).await?;

        let (resolved, movement) = restock_return(
            &db,
            "RT-001",
            "D01-RT",
            Some("WH01-R-01".to_string()),
            None,
            Some("2025-11-19".parse().unwrap()),
        )
        .await?;

        assert_eq!(resolved.status, "restocked");
        assert_eq!(resolved.resolved_on, Some("2025-11-19".parse().unwrap()));
        assert_eq!(movement.lot.quantity, 3);
        assert_eq!(movement.entry.kind, "return");
        assert_eq!(movement.entry.reference_id.as_deref(), Some("RT-001"));
        assert_eq!(total_quantity_for_sku(&db, "SKU-D01").await?, 3);

        let again = restock_return(&db, "RT-001", "D01-RT", None, None, None).await;
        assert!(matches!(
            again.unwrap_err(),
            Error::ReturnAlreadyResolved { .. }
        ));
        assert_eq!(get_ledger_for_sku(&db, "SKU-D01").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_dispose_return_leaves_stock_alone() -> Result<()> {
        let db = setup_test_db().await?;
        register_return(&db, new_return("RT-001", None)).await?;

        let disposed = dispose_return(&db, "RT-001", None).await?;
        assert_eq!(disposed.status, "disposed");
        assert!(disposed.resolved_on.is_some());
        assert_eq!(total_quantity_for_sku(&db, "SKU-D01").await?, 0);
        assert!(get_ledger_for_sku(&db, "SKU-D01").await?.is_empty());

        let missing = dispose_return(&db, "RT-404", None).await;
        assert!(matches!(missing.unwrap_err(), Error::ReturnNotFound { .. }));

        let resolved = get_return_by_code(&db, "RT-001").await?.unwrap();
        assert_eq!(resolved.status, "disposed");

        Ok(())
    }
}
