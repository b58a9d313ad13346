//! Warung POS - bookkeeping and order tracking for a seblak street-food
//! stall.
//!
//! All state lives in flat CSV tables under a single data directory (see
//! [`store::DataDir`]): the order queue, the financial ledger, the product
//! catalog, and ingredient stock. The dashboard layer renders forms and
//! charts over these tables; this crate owns the records, the lifecycle
//! rules, and the order-to-ledger sync engine that moves completed orders
//! into the ledger exactly once.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod inventory;
pub mod ledger;
pub mod orders;
pub mod reports;
pub mod store;
pub mod sync;

pub use store::{DataDir, StoreError};
pub use sync::{SyncEngine, SyncReport};

/// Binary entry point: set up logging, then reconcile any orders that
/// completed since the last run into the ledger.
pub fn run() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,warung_pos=debug"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();

    info!("Starting Warung POS v{}", env!("CARGO_PKG_VERSION"));

    let engine = SyncEngine::new(DataDir::default());
    if engine.auto_sync()? {
        info!("startup sync complete");
    } else {
        info!("no completed orders waiting for sync");
    }
    Ok(())
}
