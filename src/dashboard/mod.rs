//! # Dashboard
//!
//! Summary counts and chart-ready series derived from unfiltered snapshots of
//! all five collections. Rendering is someone else's job: a
//! [`ChartRenderer`] receives [`ChartData`] and draws it.

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::ChangeEvent;
use crate::framework::{StoreClient, StoreError};
use crate::model::{InventoryDocument, Order, RecordId};

pub const DEFAULT_PERIOD_DAYS: u32 = 180;

const STOCK_VALUE_LABEL: &str = "Valeur Stock (DH)";
const ORDER_COUNT_LABEL: &str = "Nombre de Commandes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    Line,
    Doughnut,
    HorizontalBar,
    PolarArea,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// One chart: category labels and one or more series over them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    fn single(kind: ChartKind, label: &str, points: Vec<(String, f64)>) -> Self {
        let (labels, data) = points.into_iter().unzip();
        Self {
            kind,
            labels,
            datasets: vec![Dataset {
                label: label.to_string(),
                data,
            }],
        }
    }

    /// The first series, which is the only one every chart here has.
    pub fn series(&self) -> &[f64] {
        self.datasets.first().map_or(&[][..], |dataset| dataset.data.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub products: usize,
    pub suppliers: usize,
    pub warehouses: usize,
    pub orders: usize,
    pub categories: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub stock_value: ChartData,
    pub products_per_category: ChartData,
    pub orders_per_supplier: ChartData,
    pub warehouse_capacity: ChartData,
    pub monthly_orders: ChartData,
}

impl Dashboard {
    pub fn build(document: &InventoryDocument, period_days: u32, today: NaiveDate) -> Self {
        Self {
            summary: Summary {
                products: document.products.len(),
                suppliers: document.suppliers.len(),
                warehouses: document.warehouses.len(),
                orders: document.orders.len(),
                categories: document.categories.len(),
            },
            stock_value: stock_value_by_category(document),
            products_per_category: products_per_category(document),
            orders_per_supplier: orders_per_supplier(document),
            warehouse_capacity: warehouse_capacity(document),
            monthly_orders: monthly_orders(&document.orders, period_days, today),
        }
    }

    pub fn charts(&self) -> [&ChartData; 5] {
        [
            &self.stock_value,
            &self.monthly_orders,
            &self.products_per_category,
            &self.orders_per_supplier,
            &self.warehouse_capacity,
        ]
    }
}

/// Σ(quantity × price) of each category's products. Bar chart.
pub fn stock_value_by_category(document: &InventoryDocument) -> ChartData {
    let points = document
        .categories
        .iter()
        .map(|category| {
            let value: f64 = document
                .products
                .iter()
                .filter(|product| product.category == category.id)
                .map(|product| product.stock_value())
                .sum();
            (category.name.clone(), value)
        })
        .collect();
    ChartData::single(ChartKind::Bar, STOCK_VALUE_LABEL, points)
}

/// Number of products in each category. Doughnut chart.
pub fn products_per_category(document: &InventoryDocument) -> ChartData {
    let points = document
        .categories
        .iter()
        .map(|category| {
            let count = document.products.iter().filter(|p| p.category == category.id).count();
            (category.name.clone(), count as f64)
        })
        .collect();
    ChartData::single(ChartKind::Doughnut, "", points)
}

/// Number of orders placed with each supplier. Horizontal bar chart.
pub fn orders_per_supplier(document: &InventoryDocument) -> ChartData {
    let points = document
        .suppliers
        .iter()
        .map(|supplier| (supplier.name.clone(), count_orders(&document.orders, supplier.id) as f64))
        .collect();
    ChartData::single(ChartKind::HorizontalBar, ORDER_COUNT_LABEL, points)
}

fn count_orders(orders: &[Order], supplier: RecordId) -> usize {
    orders.iter().filter(|order| order.supplier == supplier).count()
}

/// Capacity of each warehouse. Polar-area chart.
pub fn warehouse_capacity(document: &InventoryDocument) -> ChartData {
    let points = document
        .warehouses
        .iter()
        .map(|warehouse| (warehouse.name.clone(), f64::from(warehouse.capacity)))
        .collect();
    ChartData::single(ChartKind::PolarArea, "", points)
}

/// Orders per calendar month over the trailing `period_days`. Line chart.
///
/// Only orders with `today - period_days <= date <= today` count. They are
/// bucketed into the `ceil(period_days / 30)` months ending with the current
/// one, labelled like `Dec 24`.
pub fn monthly_orders(orders: &[Order], period_days: u32, today: NaiveDate) -> ChartData {
    let start = today
        .checked_sub_days(Days::new(period_days.into()))
        .unwrap_or(NaiveDate::MIN);
    let recent: Vec<NaiveDate> = orders
        .iter()
        .map(|order| order.date)
        .filter(|date| (start..=today).contains(date))
        .collect();

    let months = period_days.div_ceil(30);
    let points = (0..months)
        .rev()
        .filter_map(|back| month_start(today, back))
        .map(|month| {
            let count = recent
                .iter()
                .filter(|date| date.year() == month.year() && date.month() == month.month())
                .count();
            (month.format("%b %y").to_string(), count as f64)
        })
        .collect();
    ChartData::single(ChartKind::Line, ORDER_COUNT_LABEL, points)
}

/// First day of the month `back` months before `today`'s.
fn month_start(today: NaiveDate, back: u32) -> Option<NaiveDate> {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

// =============================================================================
// RENDERING
// =============================================================================

/// Draws charts. Fire-and-forget: failures are logged, never propagated.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, name: &str, chart: &ChartData) -> io::Result<()>;
}

/// Logs each chart as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChartRenderer;

#[async_trait]
impl ChartRenderer for LogChartRenderer {
    async fn render(&self, name: &str, chart: &ChartData) -> io::Result<()> {
        let json = serde_json::to_string(chart).map_err(io::Error::other)?;
        info!(chart = name, kind = ?chart.kind, %json, "Chart");
        Ok(())
    }
}

const CHART_NAMES: [&str; 5] = [
    "stock_value",
    "monthly_orders",
    "products_per_category",
    "orders_per_supplier",
    "warehouse_capacity",
];

/// Rebuilds the dashboard from the store and pushes every chart to a renderer.
#[derive(Clone)]
pub struct DashboardRefresher {
    store: StoreClient,
    renderer: Arc<dyn ChartRenderer>,
    period_days: u32,
}

impl DashboardRefresher {
    pub fn new(store: StoreClient, renderer: Arc<dyn ChartRenderer>, period_days: u32) -> Self {
        Self {
            store,
            renderer,
            period_days,
        }
    }

    pub async fn refresh(&self, today: NaiveDate) -> Result<Dashboard, StoreError> {
        let document = self.store.snapshot().await?;
        let dashboard = Dashboard::build(&document, self.period_days, today);
        for (name, chart) in CHART_NAMES.into_iter().zip(dashboard.charts()) {
            if let Err(e) = self.renderer.render(name, chart).await {
                warn!(chart = name, error = %e, "Chart rendering failed");
            }
        }
        debug!(summary = ?dashboard.summary, "Dashboard refreshed");
        Ok(dashboard)
    }

    /// Refreshes after every change event until the channel closes.
    ///
    /// A lagging receiver skips the missed events and refreshes once.
    pub fn spawn(self, mut events: broadcast::Receiver<ChangeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_days = self.period_days, "Dashboard refresher started");
            loop {
                match events.recv().await {
                    Ok(event) => debug!(?event, "Change received"),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dashboard lagged behind changes"),
                    Err(RecvError::Closed) => break,
                }
                if let Err(e) = self.refresh(Local::now().date_naive()).await {
                    warn!(error = %e, "Dashboard refresh failed");
                }
            }
            info!("Dashboard refresher stopped");
        })
    }
}
