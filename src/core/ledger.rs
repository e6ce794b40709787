//! Ledger business logic - vocabulary, append, replay and reconciliation.
//!
//! The ledger is append-only and stores one signed `change` per entry. Running balances
//! are never persisted: every view replays the full history in (`entry_date`, `id`) order,
//! accumulating per SKU, and only then filters and reverses for display.

use crate::{
    core::product::{display_name, product_names},
    entities::{LedgerEntry, StockLot, ledger_entry},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

/// Canonical kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    /// Opening balance brought into the system
    Opening,
    /// Goods received from a supplier
    Receipt,
    /// Goods shipped to a customer
    Shipment,
    /// Customer return put back into stock
    Return,
    /// Stock-take correction
    Adjustment,
    /// Goods written off (damaged, expired)
    Disposal,
}

impl MovementKind {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Receipt => "receipt",
            Self::Shipment => "shipment",
            Self::Return => "return",
            Self::Adjustment => "adjustment",
            Self::Disposal => "disposal",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "opening" => Some(Self::Opening),
            "receipt" => Some(Self::Receipt),
            "shipment" => Some(Self::Shipment),
            "return" => Some(Self::Return),
            "adjustment" => Some(Self::Adjustment),
            "disposal" => Some(Self::Disposal),
            _ => None,
        }
    }

    /// Maps the free-text labels used by older data sets onto the canonical vocabulary.
    #[must_use]
    pub fn from_legacy_label(label: &str) -> Option<Self> {
        match label.trim() {
            "기초재고" => Some(Self::Opening),
            "입고" | "입고(PO)" | "구매입고" => Some(Self::Receipt),
            "출고" | "출고(SO)" | "판매출고" => Some(Self::Shipment),
            "반품" | "반품입고" => Some(Self::Return),
            "재고조정" => Some(Self::Adjustment),
            "폐기" => Some(Self::Disposal),
            other => Self::parse(other),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document type a movement originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    /// Purchase order receipt
    PurchaseOrder,
    /// Sales order shipment
    SalesOrder,
    /// Customer return
    ReturnOrder,
    /// Stock-take adjustment
    Adjustment,
    /// Opening balance
    Opening,
    /// Write-off
    Disposal,
    /// Manual entry with no backing document
    Manual,
}

impl ReferenceType {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PurchaseOrder => "purchase_order",
            Self::SalesOrder => "sales_order",
            Self::ReturnOrder => "return_order",
            Self::Adjustment => "adjustment",
            Self::Opening => "opening",
            Self::Disposal => "disposal",
            Self::Manual => "manual",
        }
    }

    /// The reference type implied by a movement kind when no document type is known.
    #[must_use]
    pub const fn for_kind(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Opening => Self::Opening,
            MovementKind::Receipt => Self::PurchaseOrder,
            MovementKind::Shipment => Self::SalesOrder,
            MovementKind::Return => Self::ReturnOrder,
            MovementKind::Adjustment => Self::Adjustment,
            MovementKind::Disposal => Self::Disposal,
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a ledger entry about to be appended.
#[derive(Debug, Clone)]
pub(crate) struct NewEntry {
    pub(crate) date: NaiveDate,
    pub(crate) kind: MovementKind,
    pub(crate) sku: String,
    pub(crate) change: i64,
    pub(crate) reference_type: ReferenceType,
    pub(crate) reference_id: Option<String>,
    pub(crate) note: Option<String>,
}

/// Appends one entry. Callers run this inside the same transaction as the lot update.
pub(crate) async fn append_entry<C>(db: &C, entry: NewEntry) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    let model = ledger_entry::ActiveModel {
        entry_date: Set(entry.date),
        kind: Set(entry.kind.as_str().to_string()),
        sku: Set(entry.sku),
        change: Set(entry.change),
        reference_type: Set(entry.reference_type.as_str().to_string()),
        reference_id: Set(entry.reference_id),
        note: Set(entry.note),
        recorded_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let inserted = model.insert(db).await?;
    debug!(
        "Ledger entry {} appended: {} {} {:+}",
        inserted.id, inserted.kind, inserted.sku, inserted.change
    );
    Ok(inserted)
}

/// Retrieves the ledger for one SKU, oldest first (same-day entries in insertion order).
pub async fn get_ledger_for_sku(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .filter(ledger_entry::Column::Sku.eq(sku))
        .order_by_asc(ledger_entry::Column::EntryDate)
        .order_by_asc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the whole ledger, oldest first.
pub async fn get_all_entries(db: &DatabaseConnection) -> Result<Vec<ledger_entry::Model>> {
    LedgerEntry::find()
        .order_by_asc(ledger_entry::Column::EntryDate)
        .order_by_asc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of all ledger changes for a SKU.
///
/// # Errors
/// Returns `InvalidQuantity` if the running sum leaves the `i64` range.
pub async fn balance_for_sku(db: &DatabaseConnection, sku: &str) -> Result<i64> {
    let entries = get_ledger_for_sku(db, sku).await?;
    entries
        .iter()
        .try_fold(0_i64, |total, e| total.checked_add(e.change))
        .ok_or(Error::InvalidQuantity { quantity: i64::MAX })
}

/// A ledger entry paired with the SKU balance right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    /// The replayed entry
    pub entry: ledger_entry::Model,
    /// Running balance of the entry's SKU after applying it
    pub balance: i64,
}

/// Replays entries in (`entry_date`, `id`) order and attaches the running balance per SKU.
///
/// The result is in forward (chronological) order. Balances saturate at the `i64` bounds.
#[must_use]
pub fn running_balances(mut entries: Vec<ledger_entry::Model>) -> Vec<BalanceRow> {
    entries.sort_by_key(|e| (e.entry_date, e.id));

    let mut balances: HashMap<String, i64> = HashMap::new();
    entries
        .into_iter()
        .map(|entry| {
            let balance = balances.entry(entry.sku.clone()).or_insert(0);
            *balance = balance.saturating_add(entry.change);
            BalanceRow {
                balance: *balance,
                entry,
            }
        })
        .collect()
}

/// Filter for [`ledger_view`]. All bounds are inclusive; `None` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    /// Earliest entry date to show
    pub start: Option<NaiveDate>,
    /// Latest entry date to show
    pub end: Option<NaiveDate>,
    /// Case-insensitive substring matched against SKU or product name
    pub sku_filter: Option<String>,
}

/// A row of the ledger table as shown to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerViewRow {
    /// The entry
    pub entry: ledger_entry::Model,
    /// Product name, or the unknown-product label
    pub product_name: String,
    /// SKU balance right after this entry
    pub balance: i64,
}

/// Builds the ledger table: full replay first, then filter, then newest first.
///
/// Balances are computed over the entire history so that a window starting after the
/// first movement still shows the true running balance.
pub async fn ledger_view(
    db: &DatabaseConnection,
    query: &LedgerQuery,
) -> Result<Vec<LedgerViewRow>> {
    let entries = get_all_entries(db).await?;
    let names = product_names(db).await?;
    Ok(filter_for_display(running_balances(entries), &names, query))
}

fn filter_for_display(
    rows: Vec<BalanceRow>,
    names: &HashMap<String, String>,
    query: &LedgerQuery,
) -> Vec<LedgerViewRow> {
    let needle = query
        .sku_filter
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase);

    let mut visible: Vec<LedgerViewRow> = rows
        .into_iter()
        .filter(|row| query.start.is_none_or(|start| row.entry.entry_date >= start))
        .filter(|row| query.end.is_none_or(|end| row.entry.entry_date <= end))
        .filter_map(|row| {
            let product_name = display_name(names, &row.entry.sku).to_string();
            let matches = needle.as_deref().is_none_or(|needle| {
                row.entry.sku.to_uppercase().contains(needle)
                    || product_name.to_uppercase().contains(needle)
            });
            matches.then(|| LedgerViewRow {
                product_name,
                balance: row.balance,
                entry: row.entry,
            })
        })
        .collect();

    visible.reverse();
    visible
}

/// A SKU whose ledger total disagrees with its stock lots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// The SKU
    pub sku: String,
    /// Sum of ledger changes
    pub ledger_total: i64,
    /// Sum of lot quantities
    pub stock_total: i64,
}

impl Drift {
    /// Ledger total minus stock total.
    #[must_use]
    pub const fn difference(&self) -> i64 {
        self.ledger_total - self.stock_total
    }
}

/// Compares, for every SKU seen in either store, the ledger sum with the lot sum.
///
/// Returns only the SKUs that disagree, ordered by SKU.
pub async fn reconcile(db: &DatabaseConnection) -> Result<Vec<Drift>> {
    let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    let overflow = || Error::InvalidQuantity { quantity: i64::MAX };
    for entry in LedgerEntry::find().all(db).await? {
        let total = &mut totals.entry(entry.sku).or_default().0;
        *total = total.checked_add(entry.change).ok_or_else(overflow)?;
    }
    for lot in StockLot::find().all(db).await? {
        let total = &mut totals.entry(lot.sku).or_default().1;
        *total = total.checked_add(lot.quantity).ok_or_else(overflow)?;
    }

    let drift: Vec<Drift> = totals
        .into_iter()
        .filter(|(_, (ledger_total, stock_total))| ledger_total != stock_total)
        .map(|(sku, (ledger_total, stock_total))| Drift {
            sku,
            ledger_total,
            stock_total,
        })
        .collect();

    for d in &drift {
        warn!(
            "Ledger/stock drift for {}: ledger {} vs stock {}",
            d.sku, d.ledger_total, d.stock_total
        );
    }
    Ok(drift)
}

/// Formats a signed change like `"+20"` or `"-30"`.
#[must_use]
pub fn format_change(change: i64) -> String {
    format!("{change:+}")
}

/// One-line summary of a ledger table row.
#[must_use]
pub fn format_ledger_row(row: &LedgerViewRow) -> String {
    let reference = row.entry.reference_id.as_deref().unwrap_or("-");
    format!(
        "{} | {} | {} {} | {} | {} | bal {}",
        row.entry.entry_date,
        row.entry.kind,
        row.entry.sku,
        row.product_name,
        reference,
        format_change(row.entry.change),
        row.balance
    )
}
