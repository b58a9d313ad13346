//! Financial ledger for Warung POS.
//!
//! `keuangan.csv` is a single append-only table of income and expense
//! entries. Order-derived income is written exclusively by the sync engine
//! (`crate::sync`); manual sales and expenses are recorded here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::{self, DataDir, Record, StoreError};

/// Category used for all sales income, whether synced from orders or
/// recorded manually.
pub const SALES_CATEGORY: &str = "Penjualan";

/// Fixed expense categories offered by the bookkeeping UI.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Bahan Baku",
    "Operasional",
    "Gaji",
    "Sewa",
    "Peralatan",
    "Lainnya",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "Pendapatan")]
    Income,
    #[serde(rename = "Pengeluaran")]
    Expense,
}

/// One ledger row. `amount` is always a non-negative magnitude; the sign is
/// carried by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(rename = "jenis")]
    pub kind: EntryKind,
    #[serde(rename = "kategori")]
    pub category: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "jumlah", deserialize_with = "store::de_amount", default)]
    pub amount: f64,
}

impl Record for LedgerEntry {
    const HEADER: &'static [&'static str] =
        &["tanggal", "jenis", "kategori", "deskripsi", "jumlah"];
}

/// Description template shared by manual sales and the sync engine:
/// `"<product> (<portions> porsi)"`.
pub fn sale_description(product: &str, portions: u32) -> String {
    format!("{product} ({portions} porsi)")
}

/// Load the ledger, falling back to an empty table when the file exists but
/// cannot be parsed. Used on append paths that must never be blocked by a
/// damaged ledger; the damaged content is overwritten on the next save.
pub(crate) fn load_or_empty(dir: &DataDir) -> Vec<LedgerEntry> {
    let path = dir.ledger_file();
    match store::load_rows(&path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "ledger unreadable, starting from an empty table");
            Vec::new()
        }
    }
}

fn append(dir: &DataDir, entry: LedgerEntry) -> Result<(), StoreError> {
    let path = dir.ledger_file();
    let mut entries: Vec<LedgerEntry> = store::load_rows(&path)?;
    entries.push(entry);
    store::save_rows(&entries, &path)
}

/// Record a manual sale (e.g. walk-up buffet sales that never enter the
/// order queue) as income under the sales category.
pub fn record_sale(
    dir: &DataDir,
    date: NaiveDate,
    product: &str,
    portions: u32,
    unit_price: f64,
) -> Result<(), StoreError> {
    if portions == 0 {
        return Err(StoreError::Invalid("sale portions must be positive".into()));
    }
    if unit_price < 0.0 {
        return Err(StoreError::Invalid("unit price must not be negative".into()));
    }

    let amount = unit_price * f64::from(portions);
    info!(product, portions, amount, "recording manual sale");
    append(
        dir,
        LedgerEntry {
            date,
            kind: EntryKind::Income,
            category: SALES_CATEGORY.to_string(),
            description: sale_description(product, portions),
            amount,
        },
    )
}

/// Record an expense entry.
pub fn record_expense(
    dir: &DataDir,
    date: NaiveDate,
    category: &str,
    description: &str,
    amount: f64,
) -> Result<(), StoreError> {
    if description.trim().is_empty() {
        return Err(StoreError::Invalid("expense description is required".into()));
    }
    if amount <= 0.0 {
        return Err(StoreError::Invalid("expense amount must be positive".into()));
    }

    info!(category, amount, "recording expense");
    append(
        dir,
        LedgerEntry {
            date,
            kind: EntryKind::Expense,
            category: category.to_string(),
            description: description.trim().to_string(),
            amount,
        },
    )
}
