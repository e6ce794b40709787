//! Alert generation - low stock and approaching expiry.
//!
//! Both alert lists are derived on demand from the current stock lots and product
//! master data; nothing is cached. The pure `compute_*` functions hold the rules and are
//! what the database-backed entry points call after loading rows.

use crate::{
    core::product::{display_name, product_names},
    entities::{Product, StockLot, product, stock_lot},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;
use std::fmt;

/// Lots with this many days left or fewer are [`Severity::Critical`].
pub const CRITICAL_WINDOW_DAYS: i64 = 7;

/// Which lots the expiry alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Report lots with at most this many days left
    pub window_days: i64,
    /// Also report lots whose expiry date has already passed
    pub include_expired: bool,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            window_days: 30,
            include_expired: true,
        }
    }
}

/// Visual severity of an expiry alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Already past the expiry date
    Expired,
    /// Expires within [`CRITICAL_WINDOW_DAYS`]
    Critical,
    /// Expires within the policy window
    Warning,
}

impl Severity {
    /// Severity for a lot with `days_left` days until expiry.
    #[must_use]
    pub const fn for_days_left(days_left: i64) -> Self {
        if days_left < 0 {
            Self::Expired
        } else if days_left <= CRITICAL_WINDOW_DAYS {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Expired => "EXPIRED",
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
        })
    }
}

/// A product whose stock on hand is below its reorder threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    /// Product SKU
    pub sku: String,
    /// Product name
    pub name: String,
    /// Sum of all lot quantities
    pub on_hand: i64,
    /// Reorder threshold
    pub threshold: i64,
}

impl LowStockAlert {
    /// Units needed to get back to the threshold.
    #[must_use]
    pub const fn shortfall(&self) -> i64 {
        self.threshold - self.on_hand
    }
}

/// A lot that expires within the policy window (or already has).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryAlert {
    /// Product SKU
    pub sku: String,
    /// Product name, or the unknown-product label
    pub name: String,
    /// Lot identifier
    pub lot_id: String,
    /// Storage location
    pub location: String,
    /// Units in the lot
    pub quantity: i64,
    /// Expiry date
    pub expires_on: NaiveDate,
    /// Whole days from today until expiry; negative once expired
    pub days_left: i64,
    /// Display severity
    pub severity: Severity,
}

/// Whole days from `today` until `expires_on`. Zero on the expiry day itself, negative after.
#[must_use]
pub fn days_until_expiry(expires_on: NaiveDate, today: NaiveDate) -> i64 {
    (expires_on - today).num_days()
}

/// Low-stock rule: every product whose summed lot quantity is strictly below its threshold.
///
/// Products without any lots count as zero on hand; a total past `i64::MAX` saturates and
/// so never counts as low. Output follows the product order.
#[must_use]
pub fn compute_low_stock(
    products: &[product::Model],
    lots: &[stock_lot::Model],
) -> Vec<LowStockAlert> {
    let mut on_hand: HashMap<&str, i64> = HashMap::new();
    for lot in lots {
        let total = on_hand.entry(lot.sku.as_str()).or_insert(0);
        *total = total.saturating_add(lot.quantity);
    }

    products
        .iter()
        .filter_map(|p| {
            let quantity = on_hand.get(p.sku.as_str()).copied().unwrap_or(0);
            (quantity < p.reorder_threshold).then(|| LowStockAlert {
                sku: p.sku.clone(),
                name: p.name.clone(),
                on_hand: quantity,
                threshold: p.reorder_threshold,
            })
        })
        .collect()
}

/// Expiry rule: lots with stock and an expiry date, at most `window_days` away.
///
/// Already-expired lots are kept only when the policy includes them. Output is ordered
/// by days left, then SKU and lot id.
#[must_use]
pub fn compute_expiry_alerts(
    lots: &[stock_lot::Model],
    names: &HashMap<String, String>,
    today: NaiveDate,
    policy: ExpiryPolicy,
) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = lots
        .iter()
        .filter(|lot| lot.quantity > 0)
        .filter_map(|lot| {
            let expires_on = lot.expires_on?;
            let days_left = days_until_expiry(expires_on, today);
            if days_left > policy.window_days || (days_left < 0 && !policy.include_expired) {
                return None;
            }
            Some(ExpiryAlert {
                sku: lot.sku.clone(),
                name: display_name(names, &lot.sku).to_string(),
                lot_id: lot.lot_id.clone(),
                location: lot.location.clone(),
                quantity: lot.quantity,
                expires_on,
                days_left,
                severity: Severity::for_days_left(days_left),
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.days_left
            .cmp(&b.days_left)
            .then_with(|| a.sku.cmp(&b.sku))
            .then_with(|| a.lot_id.cmp(&b.lot_id))
    });
    alerts
}

/// Products currently below their reorder threshold.
pub async fn low_stock_alerts(db: &DatabaseConnection) -> Result<Vec<LowStockAlert>> {
    let products = Product::find()
        .order_by_asc(product::Column::Sku)
        .all(db)
        .await?;
    let lots = StockLot::find().all(db).await?;
    Ok(compute_low_stock(&products, &lots))
}

/// Lots expiring within the policy window as of `today`.
pub async fn expiry_alerts(
    db: &DatabaseConnection,
    today: NaiveDate,
    policy: ExpiryPolicy,
) -> Result<Vec<ExpiryAlert>> {
    let names = product_names(db).await?;
    let lots = StockLot::find()
        .filter(stock_lot::Column::Quantity.gt(0))
        .filter(stock_lot::Column::ExpiresOn.is_not_null())
        .all(db)
        .await?;
    Ok(compute_expiry_alerts(&lots, &names, today, policy))
}

/// One-line text for a low-stock alert.
#[must_use]
pub fn format_low_stock_alert(alert: &LowStockAlert) -> String {
    format!(
        "[LOW] {} {}: {} on hand, threshold {} (short {})",
        alert.sku,
        alert.name,
        alert.on_hand,
        alert.threshold,
        alert.shortfall()
    )
}

/// One-line text for an expiry alert.
#[must_use]
pub fn format_expiry_alert(alert: &ExpiryAlert) -> String {
    let when = if alert.days_left < 0 {
        format!("expired {} days ago", -alert.days_left)
    } else {
        format!("D-{}", alert.days_left)
    };
    format!(
        "[{}] {} {} lot {} @ {}: {} units, expires {} ({when})",
        alert.severity,
        alert.sku,
        alert.name,
        alert.lot_id,
        alert.location,
        alert.quantity,
        alert.expires_on
    )
}
