use crate::error::Result;
use crate::loader::{self, LoadReport};
use crate::types::{Observation, Selection};
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

/// The loaded base table. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Observation>,
}

impl Dataset {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct store identifiers, ascending.
    pub fn stores(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.store.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct "SKU - Category" labels, ascending.
    pub fn sku_labels(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.sku_label.as_str()).collect();
        set.into_iter().collect()
    }

    /// Rows matching the selection, in load order.
    pub fn filter(&self, selection: &Selection) -> Vec<&Observation> {
        self.rows.iter().filter(|r| selection.matches(r)).collect()
    }
}

/// Load-once handle over the two input files.
///
/// The first call to [`DatasetHandle::get`] reads and joins the files; every
/// later call returns the same immutable [`Dataset`]. A failed load is not
/// cached, so the caller may retry.
#[derive(Debug)]
pub struct DatasetHandle {
    data_path: PathBuf,
    products_path: PathBuf,
    cell: OnceCell<(Dataset, LoadReport)>,
}

impl DatasetHandle {
    pub fn new(data_path: impl Into<PathBuf>, products_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            products_path: products_path.into(),
            cell: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn preloaded(dataset: Dataset, report: LoadReport) -> Self {
        Self {
            data_path: PathBuf::new(),
            products_path: PathBuf::new(),
            cell: OnceCell::with_value((dataset, report)),
        }
    }

    pub fn get(&self) -> Result<&Dataset> {
        let (dataset, _) = self.cell.get_or_try_init(|| {
            info!(
                data = %self.data_path.display(),
                products = %self.products_path.display(),
                "loading dataset"
            );
            let (rows, report) = loader::load_and_join(&self.data_path, &self.products_path)?;
            Ok::<_, crate::error::DashboardError>((Dataset::new(rows), report))
        })?;
        Ok(dataset)
    }

    /// Load statistics, once the dataset has been loaded.
    pub fn report(&self) -> Option<&LoadReport> {
        self.cell.get().map(|(_, report)| report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn obs(store: &str, sku: &str, week: u32, demand: f64, order: f64, stock: f64, cost: f64) -> Observation {
        Observation {
            store: store.to_string(),
            sku: sku.to_string(),
            sku_label: format!("{} - Cat", sku),
            week,
            forecast_demand: demand,
            order_quantity: order,
            stock_level: stock,
            transfer_cost: cost,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            obs("B", "X", 1, 80.0, 85.0, 60.0, 300.0),
            obs("A", "X", 1, 100.0, 90.0, 40.0, 250.0),
            obs("A", "Y", 1, 10.0, 10.0, 5.0, 10.0),
            obs("A", "X", 2, 120.0, 100.0, 35.0, 260.0),
        ])
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let ds = sample();
        assert_eq!(ds.stores(), vec!["A", "B"]);
        assert_eq!(ds.sku_labels(), vec!["X - Cat", "Y - Cat"]);
    }

    #[test]
    fn filter_by_store_and_sku() {
        let ds = sample();
        let sel = Selection {
            store: Some("A".into()),
            sku_label: Some("X - Cat".into()),
        };
        let rows = ds.filter(&sel);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.store == "A" && r.sku == "X"));
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let ds = sample();
        assert_eq!(ds.filter(&Selection::default()).len(), ds.len());
    }

    #[test]
    fn unknown_selector_yields_empty_subset() {
        let ds = sample();
        let sel = Selection {
            store: Some("Z".into()),
            sku_label: None,
        };
        assert!(ds.filter(&sel).is_empty());
    }

    #[test]
    fn preloaded_handle_returns_same_dataset() {
        let handle = DatasetHandle::preloaded(sample(), LoadReport::default());
        assert!(handle.report().is_some());
        let first = handle.get().unwrap() as *const Dataset;
        let second = handle.get().unwrap() as *const Dataset;
        assert_eq!(first, second);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let handle = DatasetHandle::new("missing/data.csv", "missing/products.csv");
        assert!(handle.get().is_err());
        assert!(handle.report().is_none());
    }
}
