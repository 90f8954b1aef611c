use crate::error::{DashboardError, Result};
use crate::types::{Observation, RawRow};
use crate::util::{clean_text, parse_quantity, parse_week};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// (header, accepted alias) pairs for the consolidated forecast table.
const DATA_COLUMNS: [(&str, &str); 7] = [
    ("tienda", "store"),
    ("sku", "sku"),
    ("semana", "week"),
    ("prediccion_ARIMA", "forecast_demand"),
    ("pedido", "order_quantity"),
    ("stock", "stock_level"),
    ("costo_transferencia_total", "transfer_cost"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Distinct SKUs with no catalogue entry.
    pub unmatched_skus: usize,
}

/// SKU -> category, read from the product catalogue.
///
/// Header names are trimmed and lower-cased before matching, so `" SKU "` and
/// `"Categoria"` are both accepted. The first entry wins for duplicate SKUs.
pub fn load_products<R: Read>(reader: R) -> Result<HashMap<String, String>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let sku_idx = headers
        .iter()
        .position(|h| h == "sku")
        .ok_or(DashboardError::MissingColumn { file: "products", column: "sku" })?;
    let cat_idx = headers
        .iter()
        .position(|h| h == "categoria" || h == "category")
        .ok_or(DashboardError::MissingColumn { file: "products", column: "categoria" })?;

    let mut products = HashMap::new();
    for result in rdr.records() {
        let record = result?;
        let Some(sku) = clean_text(record.get(sku_idx)) else { continue };
        let Some(category) = clean_text(record.get(cat_idx)) else { continue };
        if products.contains_key(&sku) {
            debug!(%sku, "duplicate catalogue entry ignored");
            continue;
        }
        products.insert(sku, category);
    }
    Ok(products)
}

/// Parse and validate the consolidated table, attaching catalogue labels.
///
/// Rows with a missing identifier, an unreadable week, or a negative or
/// non-numeric quantity are skipped and counted in the report.
pub fn load_observations<R: Read>(
    reader: R,
    products: &HashMap<String, String>,
) -> Result<(Vec<Observation>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    check_columns(rdr.headers()?)?;

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut unmatched: BTreeSet<String> = BTreeSet::new();
    let mut rows = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = total_rows, error = %e, "unreadable row");
                parse_errors += 1;
                continue;
            }
        };
        let Some(obs) = validate_row(raw, products, &mut unmatched) else {
            parse_errors += 1;
            continue;
        };
        rows.push(obs);
    }

    if !unmatched.is_empty() {
        warn!(count = unmatched.len(), "SKUs missing from the product catalogue");
    }
    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
        unmatched_skus: unmatched.len(),
    };
    Ok((rows, report))
}

pub fn load_and_join(data_path: &Path, products_path: &Path) -> Result<(Vec<Observation>, LoadReport)> {
    let products = load_products(open(products_path)?)?;
    debug!(entries = products.len(), "product catalogue loaded");
    load_observations(open(data_path)?, &products)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DashboardError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn check_columns(headers: &StringRecord) -> Result<()> {
    for (name, alias) in DATA_COLUMNS {
        if !headers.iter().any(|h| h == name || h == alias) {
            return Err(DashboardError::MissingColumn { file: "forecast data", column: name });
        }
    }
    Ok(())
}

fn validate_row(
    raw: RawRow,
    products: &HashMap<String, String>,
    unmatched: &mut BTreeSet<String>,
) -> Option<Observation> {
    let store = clean_text(raw.store.as_deref())?;
    let sku = clean_text(raw.sku.as_deref())?;
    let week = parse_week(raw.week.as_deref())?;
    let forecast_demand = parse_quantity(raw.forecast_demand.as_deref())?;
    let order_quantity = parse_quantity(raw.order_quantity.as_deref())?;
    let stock_level = parse_quantity(raw.stock_level.as_deref())?;
    let transfer_cost = parse_quantity(raw.transfer_cost.as_deref())?;

    let sku_label = match products.get(&sku) {
        Some(category) => format!("{} - {}", sku, category),
        None => {
            unmatched.insert(sku.clone());
            sku.clone()
        }
    };

    Some(Observation {
        store,
        sku,
        sku_label,
        week,
        forecast_demand,
        order_quantity,
        stock_level,
        transfer_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTS_CSV: &str = "\
 SKU ,Categoria,precio
X,Bebidas,3.5
Y,Snacks,1.2
";

    const DATA_CSV: &str = "\
tienda,sku,semana,prediccion_ARIMA,pedido,stock,costo_transferencia_total
A,X,1,100,90,40,250.5
A,X,2,120,100,35,260
B,X,1,80,85,60,300
B,Z,1,10,10,5,12
";

    fn products() -> HashMap<String, String> {
        load_products(PRODUCTS_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn product_headers_are_normalised() {
        let p = products();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("X").map(String::as_str), Some("Bebidas"));
    }

    #[test]
    fn joins_category_into_label() {
        let (rows, report) = load_observations(DATA_CSV.as_bytes(), &products()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].sku_label, "X - Bebidas");
        assert_eq!(rows[0].week, 1);
        assert_eq!(rows[0].transfer_cost, 250.5);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.loaded_rows, 4);
        assert_eq!(report.parse_errors, 0);
    }

    #[test]
    fn unmatched_sku_falls_back_to_bare_code() {
        let (rows, report) = load_observations(DATA_CSV.as_bytes(), &products()).unwrap();
        let z = rows.iter().find(|r| r.sku == "Z").unwrap();
        assert_eq!(z.sku_label, "Z");
        assert_eq!(report.unmatched_skus, 1);
    }

    #[test]
    fn english_headers_are_accepted() {
        let csv = "\
store,sku,week,forecast_demand,order_quantity,stock_level,transfer_cost
A,Y,3,5,5,5,5
";
        let (rows, _) = load_observations(csv.as_bytes(), &products()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].store, "A");
        assert_eq!(rows[0].sku_label, "Y - Snacks");
    }

    #[test]
    fn invalid_rows_are_skipped_and_counted() {
        let csv = "\
tienda,sku,semana,prediccion_ARIMA,pedido,stock,costo_transferencia_total
A,X,1,100,90,40,10
A,X,2,-5,90,40,10
,X,3,100,90,40,10
A,X,four,100,90,40,10
A,X,5,abc,90,40,10
";
        let (rows, report) = load_observations(csv.as_bytes(), &products()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.parse_errors, 4);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "tienda,sku,semana,pedido,stock,costo_transferencia_total\nA,X,1,1,1,1\n";
        let err = load_observations(csv.as_bytes(), &products()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingColumn { column: "prediccion_ARIMA", .. }
        ));
    }

    #[test]
    fn catalogue_without_category_is_an_error() {
        let err = load_products("sku,precio\nX,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { column: "categoria", .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_and_join(Path::new("no/such/data.csv"), Path::new("no/such/products.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("no/such/products.csv"));
    }
}
