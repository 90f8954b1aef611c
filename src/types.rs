use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// One row of the consolidated forecast table as it appears on disk.
///
/// Everything is read as text so the loader can decide what counts as a
/// parse error instead of failing the whole file.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "tienda", alias = "store")]
    pub store: Option<String>,
    #[serde(rename = "sku")]
    pub sku: Option<String>,
    #[serde(rename = "semana", alias = "week")]
    pub week: Option<String>,
    #[serde(rename = "prediccion_ARIMA", alias = "forecast_demand")]
    pub forecast_demand: Option<String>,
    #[serde(rename = "pedido", alias = "order_quantity")]
    pub order_quantity: Option<String>,
    #[serde(rename = "stock", alias = "stock_level")]
    pub stock_level: Option<String>,
    #[serde(rename = "costo_transferencia_total", alias = "transfer_cost")]
    pub transfer_cost: Option<String>,
}

/// A validated store x SKU x week observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub store: String,
    pub sku: String,
    /// "SKU - Category", or the bare SKU when the catalogue has no entry.
    pub sku_label: String,
    pub week: u32,
    pub forecast_demand: f64,
    pub order_quantity: f64,
    pub stock_level: f64,
    pub transfer_cost: f64,
}

/// Store and product selectors. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub store: Option<String>,
    pub sku_label: Option<String>,
}

impl Selection {
    pub fn matches(&self, obs: &Observation) -> bool {
        self.store.as_deref().map_or(true, |s| obs.store == s)
            && self.sku_label.as_deref().map_or(true, |s| obs.sku_label == s)
    }

    pub fn store_caption(&self) -> &str {
        self.store.as_deref().unwrap_or("All stores")
    }

    pub fn sku_caption(&self) -> &str {
        self.sku_label.as_deref().unwrap_or("All SKUs")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSet {
    pub demand_total: f64,
    pub order_total: f64,
    pub stock_avg: f64,
    pub transfer_cost_total: f64,
    pub order_efficiency_pct: f64,
}

/// Colour band used when displaying order efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyBand {
    Green,
    Orange,
    Red,
}

impl fmt::Display for EfficiencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EfficiencyBand::Green => "green",
            EfficiencyBand::Orange => "orange",
            EfficiencyBand::Red => "red",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StockRisk,
    OverOrdering,
    UnderOrdering,
    CostImbalance,
}

impl AlertKind {
    pub fn tag(&self) -> &'static str {
        match self {
            AlertKind::StockRisk => "STOCK",
            AlertKind::OverOrdering => "HIGH",
            AlertKind::UnderOrdering => "LOW",
            AlertKind::CostImbalance => "COST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: Severity,
    pub kind: AlertKind,
    pub message: String,
}

/// Result of running the alert rules.
///
/// `AllClear` is returned instead of an empty list so callers can tell a
/// clean check apart from one that never ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "alerts", rename_all = "snake_case")]
pub enum AlertOutcome {
    AllClear,
    Raised(Vec<Alert>),
}

impl AlertOutcome {
    pub fn alerts(&self) -> &[Alert] {
        match self {
            AlertOutcome::AllClear => &[],
            AlertOutcome::Raised(alerts) => alerts,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct KpiPanelRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WeeklySeriesRow {
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: u32,
    #[serde(rename = "ForecastDemand")]
    #[tabled(rename = "ForecastDemand")]
    pub forecast_demand: String,
    #[serde(rename = "OrderQuantity")]
    #[tabled(rename = "OrderQuantity")]
    pub order_quantity: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StoreCostRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Store")]
    #[tabled(rename = "Store")]
    pub store: String,
    #[serde(rename = "TransferCost")]
    #[tabled(rename = "TransferCost")]
    pub transfer_cost: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TopSkuRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Sku")]
    #[tabled(rename = "Sku")]
    pub sku_label: String,
    #[serde(rename = "ForecastDemand")]
    #[tabled(rename = "ForecastDemand")]
    pub forecast_demand: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DetailRow {
    #[serde(rename = "Sku")]
    #[tabled(rename = "Sku")]
    pub sku_label: String,
    #[serde(rename = "Store")]
    #[tabled(rename = "Store")]
    pub store: String,
    #[serde(rename = "Week")]
    #[tabled(rename = "Week")]
    pub week: u32,
    #[serde(rename = "ForecastDemand")]
    #[tabled(rename = "ForecastDemand")]
    pub forecast_demand: String,
    #[serde(rename = "Order")]
    #[tabled(rename = "Order")]
    pub order_quantity: String,
    #[serde(rename = "Stock")]
    #[tabled(rename = "Stock")]
    pub stock_level: String,
    #[serde(rename = "TransferCost")]
    #[tabled(rename = "TransferCost")]
    pub transfer_cost: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub generated_at: DateTime<Local>,
    pub selection: Selection,
    pub rows_in_view: usize,
    pub kpis: KpiSet,
    pub efficiency_band: EfficiencyBand,
    pub alerts: AlertOutcome,
}
