//! Threshold rules evaluated after every filter change.
//!
//! Thresholds are derived from the full dataset (so they do not move with the
//! filter), while the stock and efficiency rules look only at the filtered
//! view. Rules run in a fixed order: stock risk, order efficiency, cost
//! imbalance.

use crate::config::AlertConfig;
use crate::kpi::store_transfer_totals;
use crate::types::{Alert, AlertKind, AlertOutcome, KpiSet, Observation, Severity};
use crate::util::{format_count, mean};
use tracing::debug;

pub fn evaluate_alerts(
    full: &[Observation],
    filtered: &[&Observation],
    kpis: &KpiSet,
    cfg: &AlertConfig,
) -> AlertOutcome {
    let mut alerts = Vec::new();

    let threshold = stock_threshold_low(full, cfg);
    let at_risk = count_stock_risk(filtered.iter().copied(), threshold);
    debug!(threshold, at_risk, "stock risk rule");
    if at_risk > 0 {
        alerts.push(Alert {
            severity: Severity::Warning,
            kind: AlertKind::StockRisk,
            message: format!(
                "{} store-SKU combinations have low stock and high expected demand.",
                format_count(at_risk)
            ),
        });
    }

    // An empty view has nothing to judge. Zero demand with rows in view still
    // counts, with efficiency guarded to 0.
    if !filtered.is_empty() {
        if let Some(alert) = efficiency_alert(kpis.order_efficiency_pct, cfg) {
            alerts.push(alert);
        }
    }

    let costly = high_cost_stores(full, cfg);
    if !costly.is_empty() {
        alerts.push(Alert {
            severity: Severity::Info,
            kind: AlertKind::CostImbalance,
            message: format!(
                "Stores with the highest logistics cost: {}.",
                costly.join(", ")
            ),
        });
    }

    if alerts.is_empty() {
        AlertOutcome::AllClear
    } else {
        AlertOutcome::Raised(alerts)
    }
}

/// Mean stock over the full dataset scaled by `stock_low_factor`; 0 when empty.
pub fn stock_threshold_low(full: &[Observation], cfg: &AlertConfig) -> f64 {
    mean(full.iter().map(|r| r.stock_level)) * cfg.stock_low_factor
}

/// Rows whose stock is below `threshold` and also below forecast demand.
pub fn count_stock_risk<'a, I>(rows: I, threshold: f64) -> usize
where
    I: IntoIterator<Item = &'a Observation>,
{
    rows.into_iter()
        .filter(|r| r.stock_level < threshold && r.forecast_demand > r.stock_level)
        .count()
}

/// Over-ordering is checked first, so at most one alert comes back.
///
/// `evaluate_alerts` skips this for an empty view.
pub fn efficiency_alert(pct: f64, cfg: &AlertConfig) -> Option<Alert> {
    if pct > cfg.efficiency_high_pct {
        Some(Alert {
            severity: Severity::Critical,
            kind: AlertKind::OverOrdering,
            message: format!(
                "Order efficiency exceeds {:.0}% ({:.1}%); review the (s,Q) replenishment policy.",
                cfg.efficiency_high_pct, pct
            ),
        })
    } else if pct < cfg.efficiency_low_pct {
        Some(Alert {
            severity: Severity::Critical,
            kind: AlertKind::UnderOrdering,
            message: format!(
                "Order efficiency is below {:.0}% ({:.1}%); stockouts or overselling are likely.",
                cfg.efficiency_low_pct, pct
            ),
        })
    } else {
        None
    }
}

/// Stores whose total transfer cost strictly exceeds the mean per-store total
/// times `cost_high_factor`, in ascending store order.
pub fn high_cost_stores<'a>(full: &'a [Observation], cfg: &AlertConfig) -> Vec<&'a str> {
    let totals = store_transfer_totals(full);
    let threshold = mean(totals.values().copied()) * cfg.cost_high_factor;
    debug!(threshold, stores = totals.len(), "cost imbalance rule");
    totals
        .into_iter()
        .filter(|(_, total)| *total > threshold)
        .map(|(store, _)| store)
        .collect()
}
