use crate::alerts::evaluate_alerts;
use crate::config::AlertConfig;
use crate::dataset::Dataset;
use crate::kpi::{compute_kpis, efficiency_band, store_transfer_totals};
use crate::types::{
    AlertOutcome, DetailRow, EfficiencyBand, KpiPanelRow, KpiSet, Observation, Selection,
    StoreCostRow, TopSkuRow, WeeklySeriesRow,
};
use crate::util::format_number;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

pub const TOP_SKU_LIMIT: usize = 10;

/// Everything one render of the dashboard needs, computed in a single pass
/// from the dataset and the current selection.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub selection: Selection,
    pub rows_in_view: usize,
    pub kpis: KpiSet,
    pub band: EfficiencyBand,
    pub kpi_panel: Vec<KpiPanelRow>,
    /// `None` until a SKU is selected.
    pub weekly_series: Option<Vec<WeeklySeriesRow>>,
    pub cost_by_store: Vec<StoreCostRow>,
    pub top_skus: Vec<TopSkuRow>,
    pub detail: Vec<DetailRow>,
    pub alerts: AlertOutcome,
}

pub fn build_dashboard(dataset: &Dataset, selection: &Selection, cfg: &AlertConfig) -> DashboardView {
    let filtered = dataset.filter(selection);
    let kpis = compute_kpis(filtered.iter().copied());
    let band = efficiency_band(kpis.order_efficiency_pct, cfg);
    let alerts = evaluate_alerts(dataset.rows(), &filtered, &kpis, cfg);
    info!(
        store = selection.store_caption(),
        sku = selection.sku_caption(),
        rows = filtered.len(),
        alerts = alerts.alerts().len(),
        "dashboard computed"
    );

    let weekly_series = selection
        .sku_label
        .as_ref()
        .map(|_| generate_weekly_series(&filtered));

    DashboardView {
        selection: selection.clone(),
        rows_in_view: filtered.len(),
        kpis,
        band,
        kpi_panel: generate_kpi_panel(&kpis, band),
        weekly_series,
        cost_by_store: generate_cost_by_store(dataset.rows()),
        top_skus: generate_top_skus(dataset.rows(), TOP_SKU_LIMIT),
        detail: generate_detail(&filtered),
        alerts,
    }
}

pub fn generate_kpi_panel(kpis: &KpiSet, band: EfficiencyBand) -> Vec<KpiPanelRow> {
    let row = |metric: &str, value: String| KpiPanelRow {
        metric: metric.to_string(),
        value,
    };
    vec![
        row("Total demand", format_number(kpis.demand_total, 0)),
        row("Total order", format_number(kpis.order_total, 0)),
        row("Average stock", format_number(kpis.stock_avg, 2)),
        row("Transfer cost", format_number(kpis.transfer_cost_total, 2)),
        row(
            "Order efficiency",
            format!("{}% ({})", format_number(kpis.order_efficiency_pct, 1), band),
        ),
    ]
}

/// Demand and order summed per week, ascending by week.
pub fn generate_weekly_series(rows: &[&Observation]) -> Vec<WeeklySeriesRow> {
    let mut by_week: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for r in rows {
        let e = by_week.entry(r.week).or_insert((0.0, 0.0));
        e.0 += r.forecast_demand;
        e.1 += r.order_quantity;
    }
    by_week
        .into_iter()
        .map(|(week, (demand, order))| WeeklySeriesRow {
            week,
            forecast_demand: format_number(demand, 0),
            order_quantity: format_number(order, 0),
        })
        .collect()
}

/// Per-store transfer cost over the full dataset, most expensive first.
pub fn generate_cost_by_store(rows: &[Observation]) -> Vec<StoreCostRow> {
    let mut totals: Vec<(&str, f64)> = store_transfer_totals(rows).into_iter().collect();
    // BTreeMap order already breaks ties by store id; the sort is stable.
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    totals
        .into_iter()
        .enumerate()
        .map(|(idx, (store, cost))| StoreCostRow {
            rank: idx + 1,
            store: store.to_string(),
            transfer_cost: format_number(cost, 2),
        })
        .collect()
}

/// The `limit` SKUs with the highest forecast demand over the full dataset.
pub fn generate_top_skus(rows: &[Observation], limit: usize) -> Vec<TopSkuRow> {
    let mut map: HashMap<&str, f64> = HashMap::new();
    for r in rows {
        *map.entry(r.sku_label.as_str()).or_insert(0.0) += r.forecast_demand;
    }
    let mut tmp: Vec<(&str, f64)> = map.into_iter().collect();
    tmp.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    tmp.into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (label, demand))| TopSkuRow {
            rank: idx + 1,
            sku_label: label.to_string(),
            forecast_demand: format_number(demand, 0),
        })
        .collect()
}

/// Filtered rows ordered by SKU label, then week.
pub fn generate_detail(rows: &[&Observation]) -> Vec<DetailRow> {
    let mut sorted: Vec<&Observation> = rows.to_vec();
    sorted.sort_by(|a, b| a.sku_label.cmp(&b.sku_label).then(a.week.cmp(&b.week)));
    sorted
        .into_iter()
        .map(|r| DetailRow {
            sku_label: r.sku_label.clone(),
            store: r.store.clone(),
            week: r.week,
            forecast_demand: format_number(r.forecast_demand, 0),
            order_quantity: format_number(r.order_quantity, 0),
            stock_level: format_number(r.stock_level, 2),
            transfer_cost: format_number(r.transfer_cost, 2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::obs;
    use crate::types::AlertKind;

    fn sample() -> Dataset {
        Dataset::new(vec![
            obs("A", "X", 2, 120.0, 100.0, 40.0, 500.0),
            obs("A", "X", 1, 100.0, 90.0, 40.0, 500.0),
            obs("B", "X", 1, 80.0, 70.0, 40.0, 1000.0),
            obs("B", "Y", 1, 300.0, 280.0, 40.0, 0.0),
            obs("C", "Y", 2, 20.0, 20.0, 40.0, 4000.0),
        ])
    }

    #[test]
    fn series_only_when_sku_selected() {
        let ds = sample();
        let cfg = AlertConfig::default();
        let view = build_dashboard(&ds, &Selection::default(), &cfg);
        assert!(view.weekly_series.is_none());

        let sel = Selection {
            store: None,
            sku_label: Some("X - Cat".into()),
        };
        let view = build_dashboard(&ds, &sel, &cfg);
        let series = view.weekly_series.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].week, 1);
        assert_eq!(series[0].forecast_demand, "180");
        assert_eq!(series[0].order_quantity, "160");
        assert_eq!(series[1].forecast_demand, "120");
    }

    #[test]
    fn cost_by_store_descending() {
        let rows = generate_cost_by_store(sample().rows());
        let stores: Vec<&str> = rows.iter().map(|r| r.store.as_str()).collect();
        assert_eq!(stores, vec!["C", "A", "B"]);
        assert_eq!(rows[0].transfer_cost, "4,000.00");
        assert_eq!(rows[0].rank, 1);
    }

    #[test]
    fn top_skus_ranked_by_demand_and_limited() {
        let ds = sample();
        let rows = generate_top_skus(ds.rows(), 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku_label, "Y - Cat");
        assert_eq!(rows[0].forecast_demand, "320");
        assert_eq!(generate_top_skus(ds.rows(), 1).len(), 1);
    }

    #[test]
    fn detail_sorted_by_label_then_week() {
        let ds = sample();
        let all = ds.filter(&Selection::default());
        let rows = generate_detail(&all);
        let keys: Vec<(&str, u32)> = rows.iter().map(|r| (r.sku_label.as_str(), r.week)).collect();
        assert_eq!(
            keys,
            vec![("X - Cat", 1), ("X - Cat", 1), ("X - Cat", 2), ("Y - Cat", 1), ("Y - Cat", 2)]
        );
    }

    #[test]
    fn kpi_panel_formats_values() {
        let kpis = KpiSet {
            demand_total: 12345.6,
            order_total: 10000.0,
            stock_avg: 40.0,
            transfer_cost_total: 6000.0,
            order_efficiency_pct: 81.0,
        };
        let panel = generate_kpi_panel(&kpis, EfficiencyBand::Orange);
        assert_eq!(panel[0].value, "12,346");
        assert_eq!(panel[3].value, "6,000.00");
        assert_eq!(panel[4].value, "81.0% (orange)");
    }

    #[test]
    fn dashboard_for_store_view() {
        let ds = sample();
        let sel = Selection {
            store: Some("A".into()),
            sku_label: None,
        };
        let view = build_dashboard(&ds, &sel, &AlertConfig::default());
        assert_eq!(view.rows_in_view, 2);
        assert_eq!(view.kpis.demand_total, 220.0);
        assert_eq!(view.band, EfficiencyBand::Orange);
        // Totals A 1000, B 1000, C 4000: C is above 1.5x the mean.
        let kinds: Vec<AlertKind> = view.alerts.alerts().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::CostImbalance]);
    }

    #[test]
    fn bundled_sample_data_end_to_end() {
        use crate::loader::load_and_join;
        use std::path::Path;

        let (rows, report) = load_and_join(
            Path::new("data/consolidado_prescriptivo.csv"),
            Path::new("data/productos.csv"),
        )
        .unwrap();
        assert_eq!(report.loaded_rows, 120);
        assert_eq!(report.parse_errors, 0);
        assert_eq!(report.unmatched_skus, 1);

        let ds = Dataset::new(rows);
        let view = build_dashboard(&ds, &Selection::default(), &AlertConfig::default());
        assert_eq!(view.kpis.demand_total, 11921.0);
        assert_eq!(view.kpis.order_total, 11643.0);
        assert_eq!(view.band, EfficiencyBand::Green);
        assert_eq!(view.cost_by_store[0].store, "T04");

        let kinds: Vec<AlertKind> = view.alerts.alerts().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::StockRisk, AlertKind::CostImbalance]);
        assert!(view.alerts.alerts()[0].message.starts_with("38 "));
        assert!(view.alerts.alerts()[1].message.ends_with(": T04."));
    }
}
