use crate::config::AlertConfig;
use crate::types::{EfficiencyBand, KpiSet, Observation};
use std::collections::BTreeMap;

/// Aggregate the five headline KPIs over `rows`.
///
/// An empty input is valid and yields all zeros. Efficiency is 0 whenever
/// total demand is 0.
pub fn compute_kpis<'a, I>(rows: I) -> KpiSet
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut count = 0usize;
    let mut kpis = KpiSet::default();
    let mut stock_sum = 0.0;
    for r in rows {
        count += 1;
        kpis.demand_total += r.forecast_demand;
        kpis.order_total += r.order_quantity;
        kpis.transfer_cost_total += r.transfer_cost;
        stock_sum += r.stock_level;
    }
    kpis.stock_avg = if count == 0 { 0.0 } else { stock_sum / count as f64 };
    kpis.order_efficiency_pct = order_efficiency_pct(kpis.order_total, kpis.demand_total);
    kpis
}

pub fn order_efficiency_pct(order_total: f64, demand_total: f64) -> f64 {
    if demand_total > 0.0 {
        let pct = order_total / demand_total * 100.0;
        if pct.is_finite() {
            pct
        } else {
            0.0
        }
    } else {
        0.0
    }
}

pub fn efficiency_band(pct: f64, cfg: &AlertConfig) -> EfficiencyBand {
    if pct >= cfg.efficiency_good_pct {
        EfficiencyBand::Green
    } else if pct >= cfg.efficiency_low_pct {
        EfficiencyBand::Orange
    } else {
        EfficiencyBand::Red
    }
}

/// Transfer cost summed per store, keyed (and therefore ordered) by store id.
pub fn store_transfer_totals<'a, I>(rows: I) -> BTreeMap<&'a str, f64>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut totals: BTreeMap<&'a str, f64> = BTreeMap::new();
    for r in rows {
        *totals.entry(r.store.as_str()).or_insert(0.0) += r.transfer_cost;
    }
    totals
}
