//! `Inventory` - one handle over the connection and alert policy.
//!
//! Front ends hold an [`Inventory`] instead of threading a connection through every call.
//! Each method delegates to the module-level function of the same concern.

use crate::{
    core::{
        alerts::{self, ExpiryAlert, ExpiryPolicy, LowStockAlert},
        ledger::{self, Drift, LedgerQuery, LedgerViewRow},
        stock::{self, StockAction, StockMovement, StockPayload, StockRow},
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Everything the main screen shows, computed in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    /// Lots with stock on hand
    pub stock: Vec<StockRow>,
    /// Products below their reorder threshold
    pub low_stock: Vec<LowStockAlert>,
    /// Lots inside the expiry window
    pub expiring: Vec<ExpiryAlert>,
    /// SKUs whose ledger and lots disagree
    pub drift: Vec<Drift>,
}

/// Stock service bound to one database.
#[derive(Debug)]
pub struct Inventory {
    db: DatabaseConnection,
    expiry_policy: ExpiryPolicy,
}

impl Inventory {
    /// Wraps a connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection, expiry_policy: ExpiryPolicy) -> Self {
        Self { db, expiry_policy }
    }

    /// The underlying connection, for master-data and returns operations.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The configured expiry policy.
    #[must_use]
    pub const fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    /// See [`stock::apply_stock_transaction`].
    pub async fn apply(&self, action: StockAction, payload: StockPayload) -> Result<StockMovement> {
        stock::apply_stock_transaction(&self.db, action, payload).await
    }

    /// Receives goods into a lot.
    pub async fn receive(&self, payload: StockPayload) -> Result<StockMovement> {
        self.apply(StockAction::Receive, payload).await
    }

    /// Ships goods out of a lot.
    pub async fn ship(&self, payload: StockPayload) -> Result<StockMovement> {
        self.apply(StockAction::Ship, payload).await
    }

    /// Ships all lines of one order together. See [`stock::ship_order`].
    pub async fn ship_order(&self, lines: Vec<StockPayload>) -> Result<Vec<StockMovement>> {
        stock::ship_order(&self.db, lines).await
    }

    /// See [`stock::adjust_lot`].
    pub async fn adjust(
        &self,
        sku: &str,
        lot_id: &str,
        location: &str,
        counted_quantity: i64,
        note: Option<String>,
    ) -> Result<Option<StockMovement>> {
        stock::adjust_lot(&self.db, sku, lot_id, location, counted_quantity, note, None).await
    }

    /// Current stock table, optionally searched by SKU or name.
    pub async fn stock(&self, search: Option<&str>) -> Result<Vec<StockRow>> {
        stock::current_stock(&self.db, search).await
    }

    /// Ledger table with running balances, newest first.
    pub async fn ledger(&self, query: &LedgerQuery) -> Result<Vec<LedgerViewRow>> {
        ledger::ledger_view(&self.db, query).await
    }

    /// Products below their reorder threshold.
    pub async fn low_stock_alerts(&self) -> Result<Vec<LowStockAlert>> {
        alerts::low_stock_alerts(&self.db).await
    }

    /// Lots inside the configured expiry window as of `today`.
    pub async fn expiry_alerts(&self, today: NaiveDate) -> Result<Vec<ExpiryAlert>> {
        alerts::expiry_alerts(&self.db, today, self.expiry_policy).await
    }

    /// See [`ledger::reconcile`].
    pub async fn reconcile(&self) -> Result<Vec<Drift>> {
        ledger::reconcile(&self.db).await
    }

    /// Stock table, both alert lists and the drift check.
    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let dashboard = Dashboard {
            stock: self.stock(None).await?,
            low_stock: self.low_stock_alerts().await?,
            expiring: self.expiry_alerts(today).await?,
            drift: self.reconcile().await?,
        };
        debug!(
            "Dashboard: {} lots, {} low stock, {} expiring, {} drifting",
            dashboard.stock.len(),
            dashboard.low_stock.len(),
            dashboard.expiring.len(),
            dashboard.drift.len()
        );
        Ok(dashboard)
    }
}
