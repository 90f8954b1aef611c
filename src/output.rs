use crate::error::{DashboardError, Result};
use crate::reports::DashboardView;
use crate::types::{AlertOutcome, DashboardSummary};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|source| DashboardError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|source| DashboardError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: Option<usize>) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows
        .iter()
        .cloned()
        .take(max_rows.unwrap_or(usize::MAX))
        .collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn render_alerts(outcome: &AlertOutcome) -> Vec<String> {
    match outcome {
        AlertOutcome::AllClear => {
            vec!["[OK] No critical alerts detected for this selection.".to_string()]
        }
        AlertOutcome::Raised(alerts) => alerts
            .iter()
            .map(|a| format!("[{}] {}: {}", a.severity, a.kind.tag(), a.message))
            .collect(),
    }
}

/// Print every section of the dashboard to stdout.
///
/// `detail_rows` caps the detail table; the full table goes to the export.
pub fn print_dashboard(view: &DashboardView, detail_rows: Option<usize>) {
    println!("\nPrescriptive Dashboard");
    println!(
        "(Store: {} | SKU: {} | {} rows)\n",
        view.selection.store_caption(),
        view.selection.sku_caption(),
        view.rows_in_view
    );

    println!("Key performance indicators\n");
    println!("{}\n", render_table(&view.kpi_panel, None));

    println!("Forecast demand vs (s,Q) order by week\n");
    match &view.weekly_series {
        Some(series) => println!("{}\n", render_table(series, None)),
        None => println!("Select a SKU to see the weekly series.\n"),
    }

    println!("Logistics cost by store\n");
    println!("{}\n", render_table(&view.cost_by_store, None));

    println!("Top {} SKUs by forecast demand\n", crate::reports::TOP_SKU_LIMIT);
    println!("{}\n", render_table(&view.top_skus, None));

    println!("Filtered detail\n");
    println!("{}", render_table(&view.detail, detail_rows));
    if let Some(n) = detail_rows {
        if view.detail.len() > n {
            println!("({} of {} rows shown)", n, view.detail.len());
        }
    }
    println!();

    println!("Alerts\n");
    for line in render_alerts(&view.alerts) {
        println!("{}", line);
    }
    println!();
}

pub fn summarize(view: &DashboardView) -> DashboardSummary {
    DashboardSummary {
        generated_at: Local::now(),
        selection: view.selection.clone(),
        rows_in_view: view.rows_in_view,
        kpis: view.kpis,
        efficiency_band: view.band,
        alerts: view.alerts.clone(),
    }
}

/// Write the tables and a JSON summary into `dir`, creating it if needed.
pub fn export_dashboard(view: &DashboardView, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| DashboardError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    write_csv(&dir.join("detail.csv"), &view.detail)?;
    write_csv(&dir.join("cost_by_store.csv"), &view.cost_by_store)?;
    write_csv(&dir.join("top_skus.csv"), &view.top_skus)?;
    write_json(&dir.join("summary.json"), &summarize(view))?;
    info!(dir = %dir.display(), "dashboard exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertConfig;
    use crate::dataset::tests::obs;
    use crate::dataset::Dataset;
    use crate::reports::build_dashboard;
    use crate::types::{Alert, AlertKind, Selection, Severity};

    #[test]
    fn all_clear_renders_ok_line() {
        let lines = render_alerts(&AlertOutcome::AllClear);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[OK]"));
    }

    #[test]
    fn alerts_render_with_severity_and_tag() {
        let outcome = AlertOutcome::Raised(vec![Alert {
            severity: Severity::Warning,
            kind: AlertKind::StockRisk,
            message: "3 store-SKU combinations have low stock and high expected demand.".into(),
        }]);
        let lines = render_alerts(&outcome);
        assert_eq!(
            lines[0],
            "[WARNING] STOCK: 3 store-SKU combinations have low stock and high expected demand."
        );
    }

    #[test]
    fn empty_table_placeholder() {
        let rows: Vec<crate::types::KpiPanelRow> = Vec::new();
        assert_eq!(render_table(&rows, None), "(no rows)");
    }

    #[test]
    fn summary_serializes_all_clear_status() {
        let ds = Dataset::new(vec![
            obs("A", "X", 1, 100.0, 100.0, 40.0, 10.0),
            obs("B", "X", 1, 100.0, 100.0, 40.0, 10.0),
        ]);
        let view = build_dashboard(&ds, &Selection::default(), &AlertConfig::default());
        let json = serde_json::to_value(summarize(&view)).unwrap();
        assert_eq!(json["alerts"]["status"], "all_clear");
        assert_eq!(json["kpis"]["demand_total"], 200.0);
        assert_eq!(json["efficiency_band"], "green");
        let stamp = json["generated_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
