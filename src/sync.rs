//! Order-to-ledger synchronization engine.
//!
//! Completed orders carry their revenue into the financial ledger exactly
//! once. Each order row has a `disinkronkan` flag; the engine selects
//! `status == Selesai && !disinkronkan`, appends one income entry per order
//! to the ledger, then flips the flags. Repeated invocations are no-ops
//! until new orders complete.
//!
//! Write ordering is deliberate: the ledger is persisted before the flag
//! commit. A crash between the two writes can only produce a duplicate on
//! the next run, never silently lost income.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ledger::{self, EntryKind, LedgerEntry, SALES_CATEGORY};
use crate::orders::{Order, OrderStatus};
use crate::store::{self, DataDir, StoreError};

/// Outcome of one [`SyncEngine::synchronize_pending`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Orders moved into the ledger by this call.
    pub synced: usize,
    /// Completed-but-unsynced orders remaining afterwards.
    pub pending: usize,
}

/// The sync engine. Holds the store handle explicitly so callers (and
/// tests) decide where the data lives.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    dir: DataDir,
}

impl SyncEngine {
    pub fn new(dir: DataDir) -> Self {
        Self { dir }
    }

    /// Load the order store, backfilling the `disinkronkan` column when an
    /// older file predates it. The heal is persisted immediately so it
    /// happens at most once per store.
    fn load_orders_healed(&self) -> Result<Vec<Order>, StoreError> {
        let path = self.dir.orders_file();
        let orders: Vec<Order> = store::load_rows(&path)?;

        if path.exists() && !store::has_column(&path, "disinkronkan")? {
            info!(
                path = %path.display(),
                rows = orders.len(),
                "order store predates the sync flag, backfilling column"
            );
            store::save_rows(&orders, &path)?;
        }
        Ok(orders)
    }

    fn is_pending(order: &Order) -> bool {
        order.status == OrderStatus::Completed && !order.synced
    }

    /// Move every completed, not-yet-synced order into the ledger.
    ///
    /// With nothing to sync this performs no writes (beyond a one-time
    /// column backfill) and reports zero. When the order store cannot be
    /// parsed the call fails and neither store is touched. A damaged ledger
    /// does not block the sync: it restarts from an empty table so completed
    /// orders are never stranded.
    pub fn synchronize_pending(&self) -> Result<SyncReport, StoreError> {
        let mut orders = self.load_orders_healed()?;

        let selected: Vec<usize> = orders
            .iter()
            .enumerate()
            .filter(|(_, o)| Self::is_pending(o))
            .map(|(i, _)| i)
            .collect();

        if selected.is_empty() {
            debug!("no completed orders awaiting sync");
            return Ok(SyncReport {
                synced: 0,
                pending: 0,
            });
        }

        let mut entries = ledger::load_or_empty(&self.dir);
        for &i in &selected {
            let order = &mut orders[i];
            entries.push(LedgerEntry {
                date: order.date,
                kind: EntryKind::Income,
                category: SALES_CATEGORY.to_string(),
                description: ledger::sale_description(&order.product, order.quantity),
                amount: order.total_price,
            });
            order.synced = true;
        }

        // Ledger first, flag commit second
        store::save_rows(&entries, &self.dir.ledger_file())?;
        store::save_rows(&orders, &self.dir.orders_file())?;

        let pending = orders.iter().filter(|o| Self::is_pending(o)).count();
        info!(synced = selected.len(), pending, "order sync complete");
        Ok(SyncReport {
            synced: selected.len(),
            pending,
        })
    }

    /// Number of completed orders still waiting to be synced, without
    /// touching the ledger. Shown as a badge by the dashboard to prompt a
    /// manual sync. An absent or unreadable order store counts as zero.
    pub fn count_pending(&self) -> usize {
        match self.load_orders_healed() {
            Ok(orders) => orders.iter().filter(|o| Self::is_pending(o)).count(),
            Err(e) => {
                warn!(error = %e, "cannot count pending orders");
                0
            }
        }
    }

    /// Startup helper: sync only when something is pending. Returns whether
    /// a sync ran.
    pub fn auto_sync(&self) -> Result<bool, StoreError> {
        let pending = self.count_pending();
        if pending == 0 {
            return Ok(false);
        }
        info!(pending, "unsynced completed orders found at startup");
        self.synchronize_pending()?;
        Ok(true)
    }
}
