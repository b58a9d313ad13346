//! Product catalog and ingredient stock for Warung POS.
//!
//! `produk.csv` holds the sellable menu (name, unit price); `bahan.csv`
//! tracks raw ingredient stock. Restocking with a purchase price also books
//! a "Bahan Baku" expense into the ledger, written before the stock change
//! so a crash never leaves a purchase unaccounted for.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ledger;
use crate::store::{self, DataDir, Record, StoreError};

/// Stock level at or below which an ingredient shows up as running out.
pub const LOW_STOCK_THRESHOLD: f64 = 3.0;

/// A sellable menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "harga", deserialize_with = "store::de_amount", default)]
    pub price: f64,
}

impl Record for Product {
    const HEADER: &'static [&'static str] = &["nama", "harga"];
}

/// A raw ingredient with its current stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "stok")]
    pub stock: f64,
    #[serde(rename = "satuan")]
    pub unit: String,
}

impl Record for Ingredient {
    const HEADER: &'static [&'static str] = &["nama", "stok", "satuan"];
}

pub fn products(dir: &DataDir) -> Result<Vec<Product>, StoreError> {
    store::load_rows(&dir.products_file())
}

/// Add a menu item, or update its price when the name already exists.
pub fn register_product(dir: &DataDir, name: &str, price: f64) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Invalid("product name is required".into()));
    }
    if price < 0.0 {
        return Err(StoreError::Invalid("product price must not be negative".into()));
    }

    let path = dir.products_file();
    let mut items: Vec<Product> = store::load_rows(&path)?;
    match items.iter_mut().find(|p| p.name == name.trim()) {
        Some(existing) => {
            info!(name, old = existing.price, new = price, "updating product price");
            existing.price = price;
        }
        None => {
            info!(name, price, "registering product");
            items.push(Product {
                name: name.trim().to_string(),
                price,
            });
        }
    }
    store::save_rows(&items, &path)
}

pub fn ingredients(dir: &DataDir) -> Result<Vec<Ingredient>, StoreError> {
    store::load_rows(&dir.ingredients_file())
}

/// Register a new ingredient with zero stock. Fails when the name exists.
pub fn register_ingredient(dir: &DataDir, name: &str, unit: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Invalid("ingredient name is required".into()));
    }

    let path = dir.ingredients_file();
    let mut items: Vec<Ingredient> = store::load_rows(&path)?;
    if items.iter().any(|i| i.name == name.trim()) {
        return Err(StoreError::Invalid(format!(
            "ingredient already registered: {name}"
        )));
    }

    items.push(Ingredient {
        name: name.trim().to_string(),
        stock: 0.0,
        unit: unit.trim().to_string(),
    });
    store::save_rows(&items, &path)
}

/// Increase an ingredient's stock. When a purchase price is given, the
/// purchase is booked as a "Bahan Baku" expense first, then the stock level
/// is saved. Returns the new stock level.
pub fn restock(
    dir: &DataDir,
    name: &str,
    amount: f64,
    purchase_price: Option<f64>,
    date: NaiveDate,
) -> Result<f64, StoreError> {
    if amount <= 0.0 {
        return Err(StoreError::Invalid("restock amount must be positive".into()));
    }

    let path = dir.ingredients_file();
    let mut items: Vec<Ingredient> = store::load_rows(&path)?;
    let Some(item) = items.iter_mut().find(|i| i.name == name) else {
        return Err(StoreError::Invalid(format!("unknown ingredient: {name}")));
    };

    if let Some(price) = purchase_price {
        let description = format!("Pembelian {name} ({amount} {unit})", unit = item.unit);
        ledger::record_expense(dir, date, "Bahan Baku", &description, price)?;
    }

    item.stock += amount;
    let level = item.stock;
    info!(name, amount, level, "ingredient restocked");
    store::save_rows(&items, &path)?;
    Ok(level)
}

/// Decrease an ingredient's stock. Refused when it would go below zero.
/// Returns the new stock level.
pub fn consume(dir: &DataDir, name: &str, amount: f64) -> Result<f64, StoreError> {
    if amount <= 0.0 {
        return Err(StoreError::Invalid("consume amount must be positive".into()));
    }

    let path = dir.ingredients_file();
    let mut items: Vec<Ingredient> = store::load_rows(&path)?;
    let Some(item) = items.iter_mut().find(|i| i.name == name) else {
        return Err(StoreError::Invalid(format!("unknown ingredient: {name}")));
    };
    if amount > item.stock {
        return Err(StoreError::Invalid(format!(
            "cannot take {amount} {unit} of {name}, only {stock} in stock",
            unit = item.unit,
            stock = item.stock
        )));
    }

    item.stock -= amount;
    let level = item.stock;
    store::save_rows(&items, &path)?;
    Ok(level)
}

/// Ingredients at or below the low-stock threshold.
pub fn low_stock(dir: &DataDir) -> Result<Vec<Ingredient>, StoreError> {
    let mut items = ingredients(dir)?;
    items.retain(|i| i.stock <= LOW_STOCK_THRESHOLD);
    Ok(items)
}
