//! Order management for Warung POS.
//!
//! Orders live in `pesanan.csv` and move through a small lifecycle:
//! "Dalam Proses" -> "Siap" -> "Selesai" (a kitchen may also complete an
//! order straight from "Dalam Proses"). Completed orders are later picked up
//! by the sync engine and turned into ledger income, tracked through the
//! `disinkronkan` flag, so status transitions here are forward-only.

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::{self, DataDir, Record, StoreError};

/// Lifecycle status of an order. Serialized with the Indonesian labels the
/// store files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Dalam Proses")]
    InProgress,
    #[serde(rename = "Siap")]
    Ready,
    #[serde(rename = "Selesai")]
    Completed,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::InProgress => "Dalam Proses",
            OrderStatus::Ready => "Siap",
            OrderStatus::Completed => "Selesai",
        }
    }

    // Position in the lifecycle; transitions may only move forward.
    fn rank(self) -> u8 {
        match self {
            OrderStatus::InProgress => 0,
            OrderStatus::Ready => 1,
            OrderStatus::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "Dine In")]
    DineIn,
    #[serde(rename = "Take Away")]
    TakeAway,
}

/// One row of the order store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "tanggal")]
    pub date: NaiveDate,
    #[serde(rename = "nama_pembeli")]
    pub buyer_name: String,
    #[serde(rename = "produk")]
    pub product: String,
    #[serde(rename = "jumlah")]
    pub quantity: u32,
    #[serde(rename = "harga_total", deserialize_with = "store::de_amount", default)]
    pub total_price: f64,
    #[serde(rename = "tingkat_kepedasan")]
    pub spice_level: String,
    #[serde(rename = "catatan")]
    pub notes: String,
    #[serde(rename = "metode_pembayaran")]
    pub payment_method: String,
    #[serde(rename = "status_pesanan")]
    pub status: OrderStatus,
    #[serde(rename = "tipe_pesanan")]
    pub order_type: OrderType,
    #[serde(rename = "waktu_pemesanan")]
    pub ordered_at: NaiveTime,
    #[serde(rename = "waktu_selesai")]
    pub completed_at: Option<NaiveTime>,
    // Legacy files predate this column; it backfills as false on load.
    #[serde(rename = "disinkronkan", deserialize_with = "store::de_flag", default)]
    pub synced: bool,
}

impl Record for Order {
    const HEADER: &'static [&'static str] = &[
        "id",
        "tanggal",
        "nama_pembeli",
        "produk",
        "jumlah",
        "harga_total",
        "tingkat_kepedasan",
        "catatan",
        "metode_pembayaran",
        "status_pesanan",
        "tipe_pesanan",
        "waktu_pemesanan",
        "waktu_selesai",
        "disinkronkan",
    ];
}

/// Input for a new order. Id, date, placement time, status, and the synced
/// flag are filled in by [`add_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_name: String,
    pub product: String,
    pub quantity: u32,
    pub total_price: f64,
    pub spice_level: String,
    pub notes: String,
    pub payment_method: String,
    pub order_type: OrderType,
}

/// Custom off-menu orders are stored as "Custom: <detail>"; aggregation
/// reports group them by the detail text.
pub fn base_product_name(product: &str) -> &str {
    product.split("Custom: ").last().unwrap_or(product)
}

fn wall_clock_time() -> NaiveTime {
    let now = Local::now().time();
    // Store files keep HH:MM:SS, no sub-second part
    now.with_nanosecond(0).unwrap_or(now)
}

// ---------------------------------------------------------------------------
// Order entry and lifecycle
// ---------------------------------------------------------------------------

/// Append a new order to the store and return its id (8 hex chars of a v4
/// UUID, same shape as the historical data).
pub fn add_order(dir: &DataDir, new_order: NewOrder) -> Result<String, StoreError> {
    if new_order.quantity == 0 {
        return Err(StoreError::Invalid("order quantity must be positive".into()));
    }
    if new_order.total_price < 0.0 {
        return Err(StoreError::Invalid("order total must not be negative".into()));
    }

    let path = dir.orders_file();
    let mut orders: Vec<Order> = store::load_rows(&path)?;

    let id: String = Uuid::new_v4().to_string().chars().take(8).collect();
    let order = Order {
        id: id.clone(),
        date: Local::now().date_naive(),
        buyer_name: new_order.buyer_name,
        product: new_order.product,
        quantity: new_order.quantity,
        total_price: new_order.total_price,
        spice_level: new_order.spice_level,
        notes: new_order.notes,
        payment_method: new_order.payment_method,
        status: OrderStatus::InProgress,
        order_type: new_order.order_type,
        ordered_at: wall_clock_time(),
        completed_at: None,
        synced: false,
    };

    info!(id = %order.id, product = %order.product, total = order.total_price, "new order");
    orders.push(order);
    store::save_rows(&orders, &path)?;
    Ok(id)
}

/// Look up a single order by id.
pub fn order(dir: &DataDir, id: &str) -> Result<Option<Order>, StoreError> {
    let orders: Vec<Order> = store::load_rows(&dir.orders_file())?;
    Ok(orders.into_iter().find(|o| o.id == id))
}

/// Move an order to a new status. Returns `Ok(true)` when the order was
/// found and updated.
///
/// Transitions only move forward ("Selesai" is terminal); a backward request
/// is refused without touching the store. Completing an order stamps
/// `waktu_selesai` with the current time unless one is supplied.
pub fn update_status(
    dir: &DataDir,
    id: &str,
    new_status: OrderStatus,
    completed_at: Option<NaiveTime>,
) -> Result<bool, StoreError> {
    let path = dir.orders_file();
    let mut orders: Vec<Order> = store::load_rows(&path)?;

    let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
        warn!(id, "status update for unknown order");
        return Ok(false);
    };
    if new_status.rank() < order.status.rank() {
        warn!(
            id,
            from = order.status.label(),
            to = new_status.label(),
            "refusing backward status transition"
        );
        return Ok(false);
    }

    order.status = new_status;
    if new_status == OrderStatus::Completed {
        order.completed_at = completed_at.or_else(|| Some(wall_clock_time()));
    } else if let Some(at) = completed_at {
        order.completed_at = Some(at);
    }
    info!(id, status = new_status.label(), "order status updated");

    store::save_rows(&orders, &path)?;
    Ok(true)
}

/// Orders not yet completed, sorted by placement time (kitchen queue view).
pub fn active_orders(dir: &DataDir) -> Result<Vec<Order>, StoreError> {
    let mut orders: Vec<Order> = store::load_rows(&dir.orders_file())?;
    orders.retain(|o| o.status != OrderStatus::Completed);
    orders.sort_by_key(|o| o.ordered_at);
    Ok(orders)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub average_price: f64,
    pub highest_price: f64,
    /// Product with the most orders, `None` when there are no orders.
    pub best_seller: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyOrderReport {
    pub date: NaiveDate,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub dine_in: usize,
    pub take_away: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product: String,
    pub portions: u64,
    pub revenue: f64,
}

fn in_range(date: NaiveDate, range: Option<(NaiveDate, NaiveDate)>) -> bool {
    match range {
        Some((start, end)) => date >= start && date <= end,
        None => true,
    }
}

/// Aggregate statistics over all orders, optionally limited to an inclusive
/// date range.
pub fn stats(
    dir: &DataDir,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<OrderStats, StoreError> {
    let orders: Vec<Order> = store::load_rows(&dir.orders_file())?;
    let selected: Vec<&Order> = orders.iter().filter(|o| in_range(o.date, range)).collect();

    if selected.is_empty() {
        return Ok(OrderStats {
            total_orders: 0,
            total_revenue: 0.0,
            average_price: 0.0,
            highest_price: 0.0,
            best_seller: None,
        });
    }

    let total_revenue: f64 = selected.iter().map(|o| o.total_price).sum();
    let highest_price = selected
        .iter()
        .map(|o| o.total_price)
        .fold(0.0_f64, f64::max);

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for o in &selected {
        *counts.entry(o.product.as_str()).or_default() += 1;
    }
    let best_seller = counts
        .iter()
        .max_by_key(|(_, n)| *n)
        .map(|(name, _)| (*name).to_string());

    Ok(OrderStats {
        total_orders: selected.len(),
        total_revenue,
        average_price: total_revenue / selected.len() as f64,
        highest_price,
        best_seller,
    })
}

/// Per-day order report with the dine-in / take-away split.
pub fn daily_report(dir: &DataDir, date: NaiveDate) -> Result<DailyOrderReport, StoreError> {
    let orders: Vec<Order> = store::load_rows(&dir.orders_file())?;
    let day: Vec<&Order> = orders.iter().filter(|o| o.date == date).collect();

    Ok(DailyOrderReport {
        date,
        total_orders: day.len(),
        total_revenue: day.iter().map(|o| o.total_price).sum(),
        dine_in: day
            .iter()
            .filter(|o| o.order_type == OrderType::DineIn)
            .count(),
        take_away: day
            .iter()
            .filter(|o| o.order_type == OrderType::TakeAway)
            .count(),
    })
}

/// Top products by portions sold, custom orders grouped under their detail
/// text. Ties keep alphabetical order.
pub fn best_sellers(
    dir: &DataDir,
    range: Option<(NaiveDate, NaiveDate)>,
    limit: usize,
) -> Result<Vec<ProductSales>, StoreError> {
    let orders: Vec<Order> = store::load_rows(&dir.orders_file())?;

    let mut totals: BTreeMap<String, (u64, f64)> = BTreeMap::new();
    for o in orders.iter().filter(|o| in_range(o.date, range)) {
        let entry = totals
            .entry(base_product_name(&o.product).to_string())
            .or_default();
        entry.0 += u64::from(o.quantity);
        entry.1 += o.total_price;
    }

    let mut ranking: Vec<ProductSales> = totals
        .into_iter()
        .map(|(product, (portions, revenue))| ProductSales {
            product,
            portions,
            revenue,
        })
        .collect();
    // BTreeMap iteration is alphabetical, stable sort keeps that for ties
    ranking.sort_by(|a, b| b.portions.cmp(&a.portions));
    ranking.truncate(limit);
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_dir() -> (tempfile::TempDir, DataDir) {
        let tmp = tempdir().expect("tempdir");
        let dir = DataDir::new(tmp.path());
        (tmp, dir)
    }

    fn new_order(product: &str, quantity: u32, total: f64) -> NewOrder {
        NewOrder {
            buyer_name: "Budi".into(),
            product: product.into(),
            quantity,
            total_price: total,
            spice_level: "Level 3".into(),
            notes: String::new(),
            payment_method: "Tunai".into(),
            order_type: OrderType::DineIn,
        }
    }

    #[test]
    fn test_add_order_defaults() {
        let (_tmp, dir) = test_dir();
        let id = add_order(&dir, new_order("Seblak Original", 2, 24000.0)).expect("add");
        assert_eq!(id.len(), 8);

        let stored = order(&dir, &id).expect("load").expect("present");
        assert_eq!(stored.status, OrderStatus::InProgress);
        assert_eq!(stored.quantity, 2);
        assert!(!stored.synced);
        assert!(stored.completed_at.is_none());
    }

    #[test]
    fn test_add_order_rejects_zero_quantity() {
        let (_tmp, dir) = test_dir();
        let err = add_order(&dir, new_order("Seblak Original", 0, 12000.0)).expect_err("invalid");
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn test_status_moves_forward_only() {
        let (_tmp, dir) = test_dir();
        let id = add_order(&dir, new_order("Seblak Tulang", 1, 18000.0)).expect("add");

        assert!(update_status(&dir, &id, OrderStatus::Ready, None).expect("to ready"));
        assert!(update_status(&dir, &id, OrderStatus::Completed, None).expect("to completed"));

        let completed = order(&dir, &id).expect("load").expect("present");
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.completed_at.is_some());

        // Selesai is terminal
        assert!(!update_status(&dir, &id, OrderStatus::InProgress, None).expect("refused"));
        let still = order(&dir, &id).expect("load").expect("present");
        assert_eq!(still.status, OrderStatus::Completed);
    }

    #[test]
    fn test_update_status_unknown_order() {
        let (_tmp, dir) = test_dir();
        assert!(!update_status(&dir, "deadbeef", OrderStatus::Ready, None).expect("no crash"));
    }

    #[test]
    fn test_active_orders_excludes_completed() {
        let (_tmp, dir) = test_dir();
        let a = add_order(&dir, new_order("Seblak Original", 1, 12000.0)).expect("add");
        let b = add_order(&dir, new_order("Seblak Ceker", 1, 15000.0)).expect("add");
        update_status(&dir, &a, OrderStatus::Completed, None).expect("complete");

        let active = active_orders(&dir).expect("active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
    }

    #[test]
    fn test_base_product_name_strips_custom_prefix() {
        assert_eq!(base_product_name("Custom: Seblak Mie Pedas"), "Seblak Mie Pedas");
        assert_eq!(base_product_name("Seblak Original"), "Seblak Original");
    }

    #[test]
    fn test_stats_and_best_sellers() {
        let (_tmp, dir) = test_dir();
        add_order(&dir, new_order("Seblak Original", 2, 24000.0)).expect("add");
        add_order(&dir, new_order("Seblak Original", 1, 12000.0)).expect("add");
        add_order(&dir, new_order("Custom: Seblak Ceker", 3, 45000.0)).expect("add");

        let s = stats(&dir, None).expect("stats");
        assert_eq!(s.total_orders, 3);
        assert!((s.total_revenue - 81000.0).abs() < f64::EPSILON);
        assert!((s.average_price - 27000.0).abs() < f64::EPSILON);
        assert!((s.highest_price - 45000.0).abs() < f64::EPSILON);
        assert_eq!(s.best_seller.as_deref(), Some("Seblak Original"));

        let top = best_sellers(&dir, None, 5).expect("best sellers");
        assert_eq!(top[0].product, "Seblak Ceker");
        assert_eq!(top[0].portions, 3);
        assert_eq!(top[1].product, "Seblak Original");
        assert_eq!(top[1].portions, 3);
    }

    #[test]
    fn test_daily_report_splits_order_types() {
        let (_tmp, dir) = test_dir();
        add_order(&dir, new_order("Seblak Original", 1, 12000.0)).expect("add");
        let mut takeaway = new_order("Seblak Ceker", 1, 15000.0);
        takeaway.order_type = OrderType::TakeAway;
        add_order(&dir, takeaway).expect("add");

        let today = Local::now().date_naive();
        let report = daily_report(&dir, today).expect("report");
        assert_eq!(report.total_orders, 2);
        assert_eq!(report.dine_in, 1);
        assert_eq!(report.take_away, 1);
        assert!((report.total_revenue - 27000.0).abs() < f64::EPSILON);
    }
}
