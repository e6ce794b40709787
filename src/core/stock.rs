//! Stock business logic - lots and the receive/ship transaction.
//!
//! [`apply_stock_transaction`] is the single entry point that moves goods: it updates one
//! stock lot and appends the matching ledger entry inside one database transaction, so a
//! failure at any step leaves both stores as they were. Lots are chosen by the caller;
//! [`fefo_candidates`] only lists them in first-expiry-first-out order.

use crate::{
    core::{
        ledger::{self, MovementKind, NewEntry, ReferenceType},
        product::{display_name, product_names},
        today,
    },
    entities::{StockLot, ledger_entry, stock_lot},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Location used for receipts that do not name one.
pub const RECEIVING_LOCATION: &str = "RECEIVING";

/// Direction of a stock transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAction {
    /// Add goods to a lot, creating it if needed
    Receive,
    /// Remove goods from an existing lot
    Ship,
}

/// Input of a stock transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockPayload {
    /// SKU of the product
    pub sku: String,
    /// Lot identifier
    pub lot_id: String,
    /// Units to move, must be positive
    pub quantity: i64,
    /// Storage location; receipts default to [`RECEIVING_LOCATION`], shipments match any
    pub location: Option<String>,
    /// Expiry date given to a newly created lot
    pub expires_on: Option<NaiveDate>,
    /// Document type the movement comes from
    pub reference_type: ReferenceType,
    /// Document number, if any
    pub reference_id: Option<String>,
    /// Business date; today when absent
    pub date: Option<NaiveDate>,
}

impl StockPayload {
    /// Creates a payload with no location, expiry, reference number or date.
    #[must_use]
    pub fn new(
        sku: impl Into<String>,
        lot_id: impl Into<String>,
        quantity: i64,
        reference_type: ReferenceType,
    ) -> Self {
        Self {
            sku: sku.into(),
            lot_id: lot_id.into(),
            quantity,
            location: None,
            expires_on: None,
            reference_type,
            reference_id: None,
            date: None,
        }
    }

    /// Sets the storage location.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the expiry date for a new lot.
    #[must_use]
    pub const fn expiring(mut self, expires_on: NaiveDate) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    /// Sets the document number.
    #[must_use]
    pub fn reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Sets the business date.
    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Result of a successful stock transaction: the lot after the change and the new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    /// Lot state after the movement
    pub lot: stock_lot::Model,
    /// Ledger entry recording the movement
    pub entry: ledger_entry::Model,
}

fn validate_payload(payload: &StockPayload) -> Result<()> {
    if payload.sku.trim().is_empty() {
        return Err(Error::MissingField { field: "sku" });
    }

    if payload.lot_id.trim().is_empty() {
        return Err(Error::MissingField { field: "lot_id" });
    }

    if payload.quantity <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: payload.quantity,
        });
    }

    Ok(())
}

const fn movement_kind(action: StockAction, reference_type: ReferenceType) -> MovementKind {
    match (action, reference_type) {
        (StockAction::Receive, ReferenceType::ReturnOrder) => MovementKind::Return,
        (StockAction::Receive, ReferenceType::Opening) => MovementKind::Opening,
        (_, ReferenceType::Adjustment) => MovementKind::Adjustment,
        (StockAction::Receive, _) => MovementKind::Receipt,
        (StockAction::Ship, ReferenceType::Disposal) => MovementKind::Disposal,
        (StockAction::Ship, _) => MovementKind::Shipment,
    }
}

/// Applies a receive or ship to one lot and appends the ledger entry, atomically.
///
/// # Errors
/// Returns an error if:
/// - The SKU or lot id is empty, or the quantity is not positive
/// - Shipping from a lot that does not exist (`LotNotFound`)
/// - Shipping more than the lot holds (`InsufficientStock`)
/// - The database fails; nothing is written in that case
pub async fn apply_stock_transaction(
    db: &DatabaseConnection,
    action: StockAction,
    payload: StockPayload,
) -> Result<StockMovement> {
    validate_payload(&payload)?;

    let txn = db.begin().await?;
    let movement = match action {
        StockAction::Receive => receive_in(&txn, payload).await?,
        StockAction::Ship => ship_in(&txn, payload).await?,
    };
    txn.commit().await?;

    info!(
        "{} {} / {} @ {}: {:+} (lot now {})",
        movement.entry.kind,
        movement.lot.sku,
        movement.lot.lot_id,
        movement.lot.location,
        movement.entry.change,
        movement.lot.quantity
    );
    Ok(movement)
}

/// Receives goods. See [`apply_stock_transaction`].
pub async fn receive_stock(
    db: &DatabaseConnection,
    payload: StockPayload,
) -> Result<StockMovement> {
    apply_stock_transaction(db, StockAction::Receive, payload).await
}

/// Ships goods. See [`apply_stock_transaction`].
pub async fn ship_stock(db: &DatabaseConnection, payload: StockPayload) -> Result<StockMovement> {
    apply_stock_transaction(db, StockAction::Ship, payload).await
}

/// Ships every line of one order in a single transaction: either all lines go out or none do.
///
/// Lines are applied in order, so two lines drawing on the same lot see each other's effect.
///
/// # Errors
/// Returns the first validation or shipping error; nothing is written in that case.
pub async fn ship_order(
    db: &DatabaseConnection,
    lines: Vec<StockPayload>,
) -> Result<Vec<StockMovement>> {
    for line in &lines {
        validate_payload(line)?;
    }

    let txn = db.begin().await?;
    let mut movements = Vec::with_capacity(lines.len());
    for line in lines {
        movements.push(ship_in(&txn, line).await?);
    }
    txn.commit().await?;

    info!("Shipped order with {} lines", movements.len());
    Ok(movements)
}

/// Fails with `InvalidQuantity` when adding `delta` to the SKU's total over all lots
/// would not fit in an `i64`.
async fn ensure_total_fits<C>(db: &C, sku: &str, delta: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let lots = StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku))
        .all(db)
        .await?;
    lots.iter()
        .try_fold(delta, |total, lot| total.checked_add(lot.quantity))
        .map(|_| ())
        .ok_or(Error::InvalidQuantity { quantity: delta })
}

/// Receive step, run inside the caller's transaction. The payload must already be validated.
pub(crate) async fn receive_in<C>(db: &C, payload: StockPayload) -> Result<StockMovement>
where
    C: ConnectionTrait,
{
    let date = payload.date.unwrap_or_else(today);
    let sku = payload.sku.trim().to_string();
    let lot_id = payload.lot_id.trim().to_string();
    let location = payload
        .location()
        .unwrap_or(RECEIVING_LOCATION)
        .to_string();

    ensure_total_fits(db, &sku, payload.quantity).await?;

    let existing = StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku.as_str()))
        .filter(stock_lot::Column::LotId.eq(lot_id.as_str()))
        .filter(stock_lot::Column::Location.eq(location.as_str()))
        .order_by_asc(stock_lot::Column::Id)
        .one(db)
        .await?;

    let lot = match existing {
        Some(lot) => change_lot_quantity_atomic(db, lot.id, payload.quantity).await?,
        None => {
            debug!("Creating lot {} / {} at {}", sku, lot_id, location);
            stock_lot::ActiveModel {
                sku: Set(sku.clone()),
                lot_id: Set(lot_id),
                location: Set(location),
                quantity: Set(payload.quantity),
                received_on: Set(date),
                expires_on: Set(payload.expires_on),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    let entry = ledger::append_entry(
        db,
        NewEntry {
            date,
            kind: movement_kind(StockAction::Receive, payload.reference_type),
            sku,
            change: payload.quantity,
            reference_type: payload.reference_type,
            reference_id: payload.reference_id,
            note: None,
        },
    )
    .await?;

    Ok(StockMovement { lot, entry })
}

/// Ship step, run inside the caller's transaction. The payload must already be validated.
pub(crate) async fn ship_in<C>(db: &C, payload: StockPayload) -> Result<StockMovement>
where
    C: ConnectionTrait,
{
    let date = payload.date.unwrap_or_else(today);
    let sku = payload.sku.trim().to_string();
    let lot_id = payload.lot_id.trim().to_string();

    let mut query = StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku.as_str()))
        .filter(stock_lot::Column::LotId.eq(lot_id.as_str()));
    if let Some(location) = payload.location() {
        query = query.filter(stock_lot::Column::Location.eq(location));
    }

    let lot = query
        .order_by_asc(stock_lot::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            sku: sku.clone(),
            lot_id: lot_id.clone(),
        })?;

    if lot.quantity < payload.quantity {
        return Err(Error::InsufficientStock {
            sku,
            lot_id,
            available: lot.quantity,
            requested: payload.quantity,
        });
    }

    let lot = change_lot_quantity_atomic(db, lot.id, -payload.quantity).await?;

    let entry = ledger::append_entry(
        db,
        NewEntry {
            date,
            kind: movement_kind(StockAction::Ship, payload.reference_type),
            sku,
            change: -payload.quantity,
            reference_type: payload.reference_type,
            reference_id: payload.reference_id,
            note: None,
        },
    )
    .await?;

    Ok(StockMovement { lot, entry })
}

/// Adds `delta` to a lot's quantity with a single `UPDATE ... SET quantity = quantity + ?`.
async fn change_lot_quantity_atomic<C>(db: &C, lot_pk: i64, delta: i64) -> Result<stock_lot::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    StockLot::update_many()
        .col_expr(
            stock_lot::Column::Quantity,
            Expr::col(stock_lot::Column::Quantity).add(delta),
        )
        .filter(stock_lot::Column::Id.eq(lot_pk))
        .exec(db)
        .await?;

    StockLot::find_by_id(lot_pk)
        .one(db)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            sku: String::new(),
            lot_id: lot_pk.to_string(),
        })
}

/// Sets a lot to a counted quantity and records the difference as an adjustment.
///
/// Returns `None` when the count matches the current quantity; nothing is written then.
///
/// Inputs are trimmed like a receipt's, and a blank location means the receiving area.
///
/// # Errors
/// Returns an error if the SKU or lot id is empty, the count is negative, the lot
/// (matched on SKU, lot id and location) does not exist, the new SKU total would
/// overflow, or the database fails.
pub async fn adjust_lot(
    db: &DatabaseConnection,
    sku: &str,
    lot_id: &str,
    location: &str,
    counted_quantity: i64,
    note: Option<String>,
    date: Option<NaiveDate>,
) -> Result<Option<StockMovement>> {
    let sku = sku.trim();
    let lot_id = lot_id.trim();
    let location = match location.trim() {
        "" => RECEIVING_LOCATION,
        other => other,
    };
    if sku.is_empty() {
        return Err(Error::MissingField { field: "sku" });
    }
    if lot_id.is_empty() {
        return Err(Error::MissingField { field: "lot_id" });
    }
    if counted_quantity < 0 {
        return Err(Error::InvalidQuantity {
            quantity: counted_quantity,
        });
    }

    let txn = db.begin().await?;

    let lot = StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku))
        .filter(stock_lot::Column::LotId.eq(lot_id))
        .filter(stock_lot::Column::Location.eq(location))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::LotNotFound {
            sku: sku.to_string(),
            lot_id: lot_id.to_string(),
        })?;

    let delta = counted_quantity - lot.quantity;
    if delta == 0 {
        debug!("Count for {} / {} matches, no adjustment", sku, lot_id);
        return Ok(None);
    }
    if delta > 0 {
        ensure_total_fits(&txn, sku, delta).await?;
    }

    let lot = change_lot_quantity_atomic(&txn, lot.id, delta).await?;
    let entry = ledger::append_entry(
        &txn,
        NewEntry {
            date: date.unwrap_or_else(today),
            kind: MovementKind::Adjustment,
            sku: sku.to_string(),
            change: delta,
            reference_type: ReferenceType::Adjustment,
            reference_id: None,
            note,
        },
    )
    .await?;

    txn.commit().await?;
    info!(
        "Adjusted {} / {} @ {} by {:+} to {}",
        sku, lot_id, location, delta, lot.quantity
    );
    Ok(Some(StockMovement { lot, entry }))
}

/// All lots of a SKU, including empty ones, in creation order.
pub async fn get_lots_for_sku(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Vec<stock_lot::Model>> {
    StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku))
        .order_by_asc(stock_lot::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a lot by SKU and lot id, and by location when one is given.
pub async fn find_lot(
    db: &DatabaseConnection,
    sku: &str,
    lot_id: &str,
    location: Option<&str>,
) -> Result<Option<stock_lot::Model>> {
    let mut query = StockLot::find()
        .filter(stock_lot::Column::Sku.eq(sku))
        .filter(stock_lot::Column::LotId.eq(lot_id));
    if let Some(location) = location {
        query = query.filter(stock_lot::Column::Location.eq(location));
    }
    query
        .order_by_asc(stock_lot::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sum of quantities over every lot and location of a SKU; 0 when there are none.
///
/// # Errors
/// Returns `InvalidQuantity` if the stored lots sum past `i64::MAX`.
pub async fn total_quantity_for_sku(db: &DatabaseConnection, sku: &str) -> Result<i64> {
    let lots = get_lots_for_sku(db, sku).await?;
    lots.iter()
        .try_fold(0_i64, |total, lot| total.checked_add(lot.quantity))
        .ok_or(Error::InvalidQuantity { quantity: i64::MAX })
}

/// Orders lots by expiry date, earliest first; lots without expiry go last.
fn by_expiry(a: &stock_lot::Model, b: &stock_lot::Model) -> Ordering {
    match (a.expires_on, b.expires_on) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Non-empty lots of a SKU in first-expiry-first-out order (then by receipt date).
///
/// This only orders the candidates; the caller still picks the lot to ship from.
pub async fn fefo_candidates(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Vec<stock_lot::Model>> {
    let mut lots: Vec<stock_lot::Model> = get_lots_for_sku(db, sku)
        .await?
        .into_iter()
        .filter(|l| l.quantity > 0)
        .collect();
    lots.sort_by(|a, b| {
        by_expiry(a, b)
            .then(a.received_on.cmp(&b.received_on))
            .then(a.id.cmp(&b.id))
    });
    Ok(lots)
}

/// A row of the current stock table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRow {
    /// The lot
    pub lot: stock_lot::Model,
    /// Product name, or the unknown-product label
    pub product_name: String,
}

/// Lots with stock on hand, joined with product names and optionally searched.
///
/// `search` matches SKU or product name, case-insensitively. Rows are ordered by SKU,
/// then expiry (earliest first, none last), then lot id.
pub async fn current_stock(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<StockRow>> {
    let names = product_names(db).await?;
    let lots = StockLot::find()
        .filter(stock_lot::Column::Quantity.gt(0))
        .all(db)
        .await?;

    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase);

    let mut rows: Vec<StockRow> = lots
        .into_iter()
        .map(|lot| StockRow {
            product_name: display_name(&names, &lot.sku).to_string(),
            lot,
        })
        .filter(|row| {
            needle.as_deref().is_none_or(|needle| {
                row.lot.sku.to_uppercase().contains(needle)
                    || row.product_name.to_uppercase().contains(needle)
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.lot
            .sku
            .cmp(&b.lot.sku)
            .then_with(|| by_expiry(&a.lot, &b.lot))
            .then_with(|| a.lot.lot_id.cmp(&b.lot.lot_id))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::{balance_for_sku, get_ledger_for_sku};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_apply_stock_transaction_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = receive_stock(
            &db,
            StockPayload::new("", "L1", 10, ReferenceType::PurchaseOrder),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingField { field: "sku" }
        ));

        let result = receive_stock(
            &db,
            StockPayload::new("SKU-A", " ", 10, ReferenceType::PurchaseOrder),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingField { field: "lot_id" }
        ));

        let result = ship_stock(
            &db,
            StockPayload::new("SKU-A", "L1", 0, ReferenceType::SalesOrder),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let result = ship_stock(
            &db,
            StockPayload::new("SKU-A", "L1", -5, ReferenceType::SalesOrder),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -5 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_creates_lot_and_ledger_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let expiry: NaiveDate = "2026-02-15".parse().unwrap();
        let date: NaiveDate = "2025-11-10".parse().unwrap();

        let movement = receive_stock(
            &db,
            StockPayload::new("SKU-D01", "D01-A251110", 20, ReferenceType::PurchaseOrder)
                .at("WH01-A-01")
                .expiring(expiry)
                .reference("PO-001")
                .on(date),
        )
        .await?;

        assert_eq!(movement.lot.quantity, 20);
        assert_eq!(movement.lot.location, "WH01-A-01");
        assert_eq!(movement.lot.expires_on, Some(expiry));
        assert_eq!(movement.lot.received_on, date);
        assert_eq!(movement.entry.change, 20);
        assert_eq!(movement.entry.kind, "receipt");
        assert_eq!(movement.entry.reference_type, "purchase_order");
        assert_eq!(movement.entry.reference_id.as_deref(), Some("PO-001"));
        assert_eq!(movement.entry.entry_date, date);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_without_location_uses_receiving_area() -> Result<()> {
        let db = setup_test_db().await?;

        let movement = receive_stock(
            &db,
            StockPayload::new("SKU-A", "L1", 5, ReferenceType::PurchaseOrder).at("  "),
        )
        .await?;
        assert_eq!(movement.lot.location, RECEIVING_LOCATION);

        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_receipts_accumulate_in_same_lot() -> Result<()> {
        let db = setup_test_db().await?;

        for quantity in [10, 25, 5] {
            receive_test_lot(&db, "SKU-A", "L1", "WH-A", quantity, None).await?;
        }

        let lots = get_lots_for_sku(&db, "SKU-A").await?;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 40);
        assert_eq!(get_ledger_for_sku(&db, "SKU-A").await?.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_same_lot_other_location_creates_new_lot() -> Result<()> {
        let db = setup_test_db().await?;

        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-B", 10, None).await?;

        let lots = get_lots_for_sku(&db, "SKU-A").await?;
        assert_eq!(lots.len(), 2);
        assert_eq!(total_quantity_for_sku(&db, "SKU-A").await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn test_worked_example_receive_receive_ship() -> Result<()> {
        let db = setup_test_db().await?;

        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 100, None).await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 50, None).await?;
        let lot = find_lot(&db, "SKU-A", "L1", Some("WH-A")).await?.unwrap();
        assert_eq!(lot.quantity, 150);

        let movement = ship_stock(&db, ship_payload("SKU-A", "L1", 30)).await?;
        assert_eq!(movement.lot.quantity, 120);
        assert_eq!(movement.entry.change, -30);
        assert_eq!(movement.entry.kind, "shipment");

        assert_eq!(balance_for_sku(&db, "SKU-A").await?, 120);
        assert_eq!(total_quantity_for_sku(&db, "SKU-A").await?, 120);

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_insufficient_stock_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let result = ship_stock(&db, ship_payload("SKU-A", "L1", 11)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                available: 10,
                requested: 11,
                ..
            }
        ));

        assert_eq!(total_quantity_for_sku(&db, "SKU-A").await?, 10);
        assert_eq!(get_ledger_for_sku(&db, "SKU-A").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_missing_lot() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let result = ship_stock(&db, ship_payload("SKU-A", "L2", 1)).await;
        assert!(matches!(result.unwrap_err(), Error::LotNotFound { .. }));

        let result = ship_stock(&db, ship_payload("SKU-A", "L1", 1).at("WH-B")).await;
        assert!(matches!(result.unwrap_err(), Error::LotNotFound { .. }));

        assert_eq!(get_ledger_for_sku(&db, "SKU-A").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_to_zero_keeps_lot_but_hides_it() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let movement = ship_stock(&db, ship_payload("SKU-A", "L1", 10)).await?;
        assert_eq!(movement.lot.quantity, 0);

        assert_eq!(get_lots_for_sku(&db, "SKU-A").await?.len(), 1);
        assert!(current_stock(&db, None).await?.is_empty());
        assert!(fefo_candidates(&db, "SKU-A").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_disposal_and_return_kinds() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let disposal = ship_stock(
            &db,
            StockPayload::new("SKU-A", "L1", 2, ReferenceType::Disposal),
        )
        .await?;
        assert_eq!(disposal.entry.kind, "disposal");

        let returned = receive_stock(
            &db,
            StockPayload::new("SKU-A", "L1", 1, ReferenceType::ReturnOrder)
                .at("WH-A")
                .reference("RT-001"),
        )
        .await?;
        assert_eq!(returned.entry.kind, "return");
        assert_eq!(returned.lot.quantity, 9);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_lot() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let adjusted = adjust_lot(
            &db,
            "SKU-A",
            "L1",
            "WH-A",
            7,
            Some("damaged bags".to_string()),
            None,
        )
        .await?
        .unwrap();
        assert_eq!(adjusted.lot.quantity, 7);
        assert_eq!(adjusted.entry.change, -3);
        assert_eq!(adjusted.entry.kind, "adjustment");
        assert_eq!(adjusted.entry.note.as_deref(), Some("damaged bags"));

        let unchanged = adjust_lot(&db, "SKU-A", "L1", "WH-A", 7, None, None).await?;
        assert!(unchanged.is_none());

        let negative = adjust_lot(&db, "SKU-A", "L1", "WH-A", -1, None, None).await;
        assert!(matches!(
            negative.unwrap_err(),
            Error::InvalidQuantity { quantity: -1 }
        ));

        let missing = adjust_lot(&db, "SKU-A", "L1", "WH-B", 3, None, None).await;
        assert!(matches!(missing.unwrap_err(), Error::LotNotFound { .. }));

        assert_eq!(balance_for_sku(&db, "SKU-A").await?, 7);
        assert_eq!(get_ledger_for_sku(&db, "SKU-A").await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_receive_rejects_sku_total_overflow() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", i64::MAX, None).await?;

        let result = receive_test_lot(&db, "SKU-A", "L2", "WH-A", 1, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 1 }
        ));

        assert_eq!(get_lots_for_sku(&db, "SKU-A").await?.len(), 1);
        assert_eq!(total_quantity_for_sku(&db, "SKU-A").await?, i64::MAX);
        assert_eq!(get_ledger_for_sku(&db, "SKU-A").await?.len(), 1);

        // Other SKUs are unaffected
        receive_test_lot(&db, "SKU-B", "L1", "WH-A", 1, None).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_rejects_sku_total_overflow() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", i64::MAX, None).await?;
        receive_test_lot(&db, "SKU-B", "L2", "WH-A", 1, None).await?;
        ship_stock(&db, ship_payload("SKU-A", "L1", 1)).await?;
        receive_test_lot(&db, "SKU-A", "L2", "WH-A", 1, None).await?;

        let result = adjust_lot(&db, "SKU-A", "L2", "WH-A", 2, None, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 1 }
        ));
        assert_eq!(total_quantity_for_sku(&db, "SKU-A").await?, i64::MAX);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_lot_trims_and_validates_keys() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 10, None).await?;

        let adjusted = adjust_lot(&db, " SKU-A ", " L1", "WH-A ", 7, None, None)
            .await?
            .unwrap();
        assert_eq!(adjusted.lot.quantity, 7);
        assert_eq!(adjusted.entry.sku, "SKU-A");

        let result = adjust_lot(&db, "  ", "L1", "WH-A", 7, None, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingField { field: "sku" }
        ));
        let result = adjust_lot(&db, "SKU-A", "", "WH-A", 7, None, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingField { field: "lot_id" }
        ));

        receive_stock(
            &db,
            StockPayload::new("SKU-A", "L9", 4, ReferenceType::PurchaseOrder),
        )
        .await?;
        let adjusted = adjust_lot(&db, "SKU-A", "L9", " ", 3, None, None)
            .await?
            .unwrap();
        assert_eq!(adjusted.lot.location, RECEIVING_LOCATION);

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_without_location_uses_first_lot_even_if_empty() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-A", 5, None).await?;
        ship_stock(&db, ship_payload("SKU-A", "L1", 5).at("WH-A")).await?;
        receive_test_lot(&db, "SKU-A", "L1", "WH-B", 10, None).await?;

        let result = ship_stock(&db, ship_payload("SKU-A", "L1", 3)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                available: 0,
                requested: 3,
                ..
            }
        ));

        let movement = ship_stock(&db, ship_payload("SKU-A", "L1", 3).at("WH-B")).await?;
        assert_eq!(movement.lot.location, "WH-B");
        assert_eq!(movement.lot.quantity, 7);

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_order_is_all_or_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-D01", "D01-A", "WH-A", 20, None).await?;
        receive_test_lot(&db, "SKU-C01", "C01-A", "WH-C", 100, None).await?;

        let result = ship_order(
            &db,
            vec![
                ship_payload("SKU-D01", "D01-A", 20).reference("SO-002"),
                ship_payload("SKU-C01", "C01-A", 101).reference("SO-002"),
            ],
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock { .. }
        ));
        assert_eq!(total_quantity_for_sku(&db, "SKU-D01").await?, 20);
        assert_eq!(get_ledger_for_sku(&db, "SKU-D01").await?.len(), 1);

        let invalid = ship_order(
            &db,
            vec![
                ship_payload("SKU-D01", "D01-A", 1),
                ship_payload("SKU-C01", "C01-A", 0),
            ],
        )
        .await;
        assert!(matches!(
            invalid.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let movements = ship_order(
            &db,
            vec![
                ship_payload("SKU-D01", "D01-A", 20).reference("SO-002"),
                ship_payload("SKU-C01", "C01-A", 100).reference("SO-002"),
            ],
        )
        .await?;
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.lot.quantity == 0));
        assert!(
            movements
                .iter()
                .all(|m| m.entry.reference_id.as_deref() == Some("SO-002"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_fefo_candidates_order() -> Result<()> {
        let db = setup_test_db().await?;
        receive_test_lot(&db, "SKU-A", "NOEXP", "WH-A", 5, None).await?;
        receive_test_lot(&db, "SKU-A", "LATE", "WH-A", 5, Some("2026-06-01")).await?;
        receive_test_lot(&db, "SKU-A", "EARLY", "WH-B", 5, Some("2026-01-10")).await?;

        let lots = fefo_candidates(&db, "SKU-A").await?;
        let order: Vec<&str> = lots.iter().map(|l| l.lot_id.as_str()).collect();
        assert_eq!(order, vec!["EARLY", "LATE", "NOEXP"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_current_stock_search_and_join() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_product(&db, "SKU-D01", "Grain-free dog food", 10).await?;
        create_custom_product(&db, "SKU-C01", "Wellness cat can", 10).await?;
        receive_test_lot(&db, "SKU-D01", "D1", "WH-A", 20, Some("2025-11-29")).await?;
        receive_test_lot(&db, "SKU-C01", "C1", "WH-C", 100, Some("2026-01-10")).await?;
        receive_test_lot(&db, "SKU-GONE", "G1", "WH-C", 1, None).await?;

        let all = current_stock(&db, None).await?;
        let skus: Vec<&str> = all.iter().map(|r| r.lot.sku.as_str()).collect();
        assert_eq!(skus, vec!["SKU-C01", "SKU-D01", "SKU-GONE"]);
        assert_eq!(all[2].product_name, "(unknown)");

        let dogs = current_stock(&db, Some("DOG")).await?;
        assert_eq!(dogs.len(), 1);
        assert_eq!(dogs[0].lot.sku, "SKU-D01");

        let by_sku = current_stock(&db, Some("c01")).await?;
        assert_eq!(by_sku.len(), 1);
        assert_eq!(by_sku[0].product_name, "Wellness cat can");

        Ok(())
    }
}
