//! One-time import of a legacy key-value snapshot.
//!
//! The old data set is a JSON object holding arrays under `products`, `stock` and
//! `ledger` (plus optional `partners`, `warehouses`, `locations`). Ledger rows come in
//! two shapes: a signed `change`, or split `inQty`/`outQty` columns. Both are converted to
//! the single signed change used by the ledger table. Stored `balance` snapshots are
//! dropped; balances are always recomputed by replay.
//!
//! The whole import runs in one database transaction.

use crate::{
    core::{
        ledger::{self, MovementKind, NewEntry, ReferenceType},
        master::PartnerKind,
        stock::RECEIVING_LOCATION,
    },
    entities::{Location, Partner, Product, Warehouse, location, partner, product, stock_lot, warehouse},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// A number stored either as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LegacyNumber {
    /// Integer value
    Int(i64),
    /// Fractional value; truncated toward zero like the old integer parsing did
    Float(f64),
    /// Numeric text such as `"20"`
    Text(String),
}

impl LegacyNumber {
    /// Integer value. Blank text counts as zero.
    ///
    /// # Errors
    /// Returns a `Config` error when the text is not an integer or the float is not finite.
    pub fn value(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Self::Float(f) => Err(Error::Config {
                message: format!("Legacy number is not finite: {f}"),
            }),
            Self::Text(s) if s.trim().is_empty() => Ok(0),
            Self::Text(s) => s.trim().parse::<i64>().map_err(|_| Error::Config {
                message: format!("Legacy number is not an integer: '{s}'"),
            }),
        }
    }
}

fn value_or_zero(number: Option<&LegacyNumber>) -> Result<i64> {
    number.map_or(Ok(0), LegacyNumber::value)
}

/// Product row of a legacy snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyProduct {
    /// SKU
    pub sku: String,
    /// Display name
    pub name: String,
    /// Category label
    #[serde(default)]
    pub category: String,
    /// Reorder threshold, stored under several names over time
    #[serde(default, alias = "safetyStock", alias = "reorderPoint", alias = "reorder_threshold")]
    pub threshold: Option<LegacyNumber>,
}

/// Stock lot row of a legacy snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyStockLot {
    /// SKU
    pub sku: String,
    /// Product name copied onto the row
    #[serde(default)]
    pub name: Option<String>,
    /// Lot identifier
    #[serde(rename = "lotId")]
    pub lot_id: String,
    /// Location; blank means the receiving area
    #[serde(default)]
    pub location: String,
    /// Quantity
    pub qty: LegacyNumber,
    /// Expiry date; blank means none
    #[serde(default)]
    pub expiry: Option<String>,
    /// Receipt date, when recorded
    #[serde(default, alias = "receivedDate", alias = "inDate")]
    pub received: Option<String>,
}

/// Ledger row of a legacy snapshot, in either the split or the signed shape.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyLedgerRow {
    /// Business date
    pub date: String,
    /// Free-text type label
    #[serde(rename = "type", default)]
    pub label: String,
    /// SKU
    pub sku: String,
    /// Product name copied onto the row
    #[serde(default)]
    pub name: Option<String>,
    /// Order or document number
    #[serde(rename = "refId", default)]
    pub reference_id: Option<String>,
    /// Signed change (newer rows)
    #[serde(default)]
    pub change: Option<LegacyNumber>,
    /// Units in (older rows)
    #[serde(rename = "inQty", default)]
    pub in_qty: Option<LegacyNumber>,
    /// Units out (older rows)
    #[serde(rename = "outQty", default)]
    pub out_qty: Option<LegacyNumber>,
}

impl LegacyLedgerRow {
    /// The signed change: `change` when present, otherwise `inQty - outQty`.
    ///
    /// Only positive split values count, matching how the split rows were summed.
    pub fn signed_change(&self) -> Result<i64> {
        if let Some(change) = &self.change {
            return change.value();
        }
        let inbound = value_or_zero(self.in_qty.as_ref())?.max(0);
        let outbound = value_or_zero(self.out_qty.as_ref())?.max(0);
        Ok(inbound - outbound)
    }

    /// Canonical kind for the label; unknown labels fall back on the sign of the change.
    #[must_use]
    pub fn kind(&self, change: i64) -> MovementKind {
        MovementKind::from_legacy_label(&self.label).unwrap_or(if change >= 0 {
            MovementKind::Receipt
        } else {
            MovementKind::Shipment
        })
    }
}

/// Partner row of a legacy snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPartner {
    /// Partner code
    pub code: String,
    /// Business name
    pub name: String,
    /// `"customer"` or `"supplier"`
    #[serde(default)]
    pub kind: String,
}

/// Warehouse row of a legacy snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyWarehouse {
    /// Warehouse code
    pub code: String,
    /// Human-readable name
    pub name: String,
}

/// Location row of a legacy snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyLocation {
    /// Location code
    pub code: String,
    /// Owning warehouse code
    #[serde(alias = "warehouseCode", alias = "warehouse_code")]
    pub warehouse: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// A whole legacy snapshot. Every collection is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacySnapshot {
    /// `products` collection
    #[serde(default)]
    pub products: Vec<LegacyProduct>,
    /// `stock` collection
    #[serde(default)]
    pub stock: Vec<LegacyStockLot>,
    /// `ledger` collection
    #[serde(default)]
    pub ledger: Vec<LegacyLedgerRow>,
    /// `partners` collection
    #[serde(default)]
    pub partners: Vec<LegacyPartner>,
    /// `warehouses` collection
    #[serde(default)]
    pub warehouses: Vec<LegacyWarehouse>,
    /// `locations` collection
    #[serde(default)]
    pub locations: Vec<LegacyLocation>,
}

/// Parses a snapshot from JSON text.
pub fn parse_snapshot(json: &str) -> Result<LegacySnapshot> {
    serde_json::from_str(json).map_err(Into::into)
}

/// Reads and parses a snapshot file.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<LegacySnapshot> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_snapshot(&contents)
}

/// Parses a `YYYY-MM-DD` date, also accepting a full ISO timestamp.
pub fn parse_legacy_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: value.to_string(),
    })
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_legacy_date(v).map(Some),
        None => Ok(None),
    }
}

/// Counts of what [`import_snapshot`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Products inserted (including ones recovered from row names)
    pub products: usize,
    /// Partners inserted
    pub partners: usize,
    /// Warehouses inserted
    pub warehouses: usize,
    /// Locations inserted
    pub locations: usize,
    /// Stock lots inserted
    pub lots: usize,
    /// Ledger entries inserted
    pub ledger_entries: usize,
    /// Ledger rows skipped because their change was zero
    pub skipped_entries: usize,
}

/// Writes a legacy snapshot into the database.
///
/// Master records whose key already exists are skipped. A SKU that appears only on stock
/// or ledger rows gets a product built from the name copied onto those rows, with an
/// empty category and a zero threshold. Lots without a receipt date use `import_date`.
/// Ledger rows are appended in array order, which becomes their same-day tie-break.
///
/// # Errors
/// Returns an error on unparseable dates or numbers, a negative lot quantity, or a
/// database failure; nothing is written in that case.
pub async fn import_snapshot(
    db: &DatabaseConnection,
    snapshot: LegacySnapshot,
    import_date: NaiveDate,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let txn = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();

    let mut known_skus: HashSet<String> = Product::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.sku)
        .collect();

    for p in snapshot.products {
        let sku = p.sku.trim().to_string();
        if sku.is_empty() || known_skus.contains(&sku) {
            continue;
        }
        let threshold = value_or_zero(p.threshold.as_ref())?.max(0);
        product::ActiveModel {
            sku: Set(sku.clone()),
            name: Set(p.name.trim().to_string()),
            category: Set(p.category.trim().to_string()),
            reorder_threshold: Set(threshold),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        known_skus.insert(sku);
        summary.products += 1;
    }

    // Names copied onto stock and ledger rows recover products missing from the master list
    let named_rows = snapshot
        .stock
        .iter()
        .map(|l| (&l.sku, &l.name))
        .chain(snapshot.ledger.iter().map(|r| (&r.sku, &r.name)));
    for (sku, name) in named_rows {
        let sku = sku.trim();
        let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        if sku.is_empty() || known_skus.contains(sku) {
            continue;
        }
        product::ActiveModel {
            sku: Set(sku.to_string()),
            name: Set(name.to_string()),
            category: Set(String::new()),
            reorder_threshold: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        known_skus.insert(sku.to_string());
        summary.products += 1;
    }

    for p in snapshot.partners {
        if Partner::find_by_id(p.code.trim()).one(&txn).await?.is_some() {
            continue;
        }
        let kind = PartnerKind::parse(&p.kind).unwrap_or(PartnerKind::Customer);
        partner::ActiveModel {
            code: Set(p.code.trim().to_string()),
            name: Set(p.name.trim().to_string()),
            kind: Set(kind.as_str().to_string()),
        }
        .insert(&txn)
        .await?;
        summary.partners += 1;
    }

    for w in snapshot.warehouses {
        if Warehouse::find_by_id(w.code.trim()).one(&txn).await?.is_some() {
            continue;
        }
        warehouse::ActiveModel {
            code: Set(w.code.trim().to_string()),
            name: Set(w.name.trim().to_string()),
        }
        .insert(&txn)
        .await?;
        summary.warehouses += 1;
    }

    for l in snapshot.locations {
        if Location::find_by_id(l.code.trim()).one(&txn).await?.is_some() {
            continue;
        }
        if Warehouse::find_by_id(l.warehouse.trim())
            .one(&txn)
            .await?
            .is_none()
        {
            warn!(
                "Skipping location {}: warehouse {} unknown",
                l.code, l.warehouse
            );
            continue;
        }
        location::ActiveModel {
            code: Set(l.code.trim().to_string()),
            warehouse_code: Set(l.warehouse.trim().to_string()),
            description: Set(l.description.filter(|d| !d.trim().is_empty())),
        }
        .insert(&txn)
        .await?;
        summary.locations += 1;
    }

    let mut lot_totals: HashMap<String, i64> = HashMap::new();
    for l in snapshot.stock {
        let quantity = l.qty.value()?;
        if quantity < 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
        let total = lot_totals.entry(l.sku.trim().to_string()).or_insert(0);
        *total = total
            .checked_add(quantity)
            .ok_or(Error::InvalidQuantity { quantity })?;
        let location = match l.location.trim() {
            "" => RECEIVING_LOCATION.to_string(),
            other => other.to_string(),
        };
        stock_lot::ActiveModel {
            sku: Set(l.sku.trim().to_string()),
            lot_id: Set(l.lot_id.trim().to_string()),
            location: Set(location),
            quantity: Set(quantity),
            received_on: Set(parse_optional_date(l.received.as_deref())?.unwrap_or(import_date)),
            expires_on: Set(parse_optional_date(l.expiry.as_deref())?),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        summary.lots += 1;
    }

    for row in snapshot.ledger {
        let change = row.signed_change()?;
        if change == 0 {
            summary.skipped_entries += 1;
            continue;
        }
        let kind = row.kind(change);
        let note = (MovementKind::from_legacy_label(&row.label).is_none()
            && !row.label.trim().is_empty())
        .then(|| row.label.trim().to_string());

        ledger::append_entry(
            &txn,
            NewEntry {
                date: parse_legacy_date(&row.date)?,
                kind,
                sku: row.sku.trim().to_string(),
                change,
                reference_type: ReferenceType::for_kind(kind),
                reference_id: row.reference_id.filter(|r| !r.trim().is_empty()),
                note,
            },
        )
        .await?;
        summary.ledger_entries += 1;
    }

    txn.commit().await?;
    info!(
        "Imported legacy snapshot: {} products, {} lots, {} ledger entries ({} skipped)",
        summary.products, summary.lots, summary.ledger_entries, summary.skipped_entries
    );
    Ok(summary)
}
