// Entry point and CLI flow.
//
// One-shot mode renders the dashboard for the selection given on the command
// line. Interactive mode (`--interactive`) keeps the dataset loaded and lets
// the user change the store and SKU filters before each render.
mod alerts;
mod config;
mod dataset;
mod error;
mod kpi;
mod loader;
mod logging;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use config::AlertConfig;
use dataset::{Dataset, DatasetHandle};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use types::Selection;

/// Terminal dashboard over forecast demand, (s,Q) orders, stock and transfer cost.
#[derive(Parser, Debug)]
#[command(name = "prescriptive_dashboard")]
#[command(about = "KPIs and rule-based alerts for a retail demand-planning dataset")]
struct Args {
    /// Consolidated forecast table (CSV)
    #[arg(long, default_value = "data/consolidado_prescriptivo.csv")]
    data: PathBuf,

    /// Product catalogue with sku and category columns (CSV)
    #[arg(long, default_value = "data/productos.csv")]
    products: PathBuf,

    /// Restrict the view to one store
    #[arg(long)]
    store: Option<String>,

    /// Restrict the view to one product, by its "SKU - Category" label
    #[arg(long)]
    sku: Option<String>,

    /// JSON file overriding alert thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write detail/cost/top-SKU CSVs and summary.json here
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Maximum detail rows printed to the console
    #[arg(long, default_value = "20")]
    detail_rows: usize,

    /// Choose filters from a menu instead of the command line
    #[arg(long)]
    interactive: bool,
}

/// Read a single trimmed line after printing the common prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// List `options` with an "all" entry at [0] and return the pick.
///
/// Returns `None` for "all". Re-prompts on anything out of range.
fn prompt_option(all_label: &str, options: &[&str]) -> Option<String> {
    println!("[0] {}", all_label);
    for (idx, opt) in options.iter().enumerate() {
        println!("[{}] {}", idx + 1, opt);
    }
    loop {
        let choice = read_choice()?;
        match choice.parse::<usize>() {
            Ok(0) => return None,
            Ok(n) if n <= options.len() => return Some(options[n - 1].to_string()),
            _ => println!("Invalid choice. Please enter a number between 0 and {}.", options.len()),
        }
    }
}

fn render(dataset: &Dataset, selection: &Selection, cfg: &AlertConfig, args: &Args) -> Result<()> {
    let view = reports::build_dashboard(dataset, selection, cfg);
    output::print_dashboard(&view, Some(args.detail_rows));
    if let Some(dir) = &args.export_dir {
        output::export_dashboard(&view, dir)
            .with_context(|| format!("exporting to {}", dir.display()))?;
        println!("(Tables and summary exported to {})\n", dir.display());
    }
    Ok(())
}

fn warn_unknown(selection: &Selection, dataset: &Dataset) {
    if let Some(store) = &selection.store {
        if !dataset.stores().contains(&store.as_str()) {
            warn!(%store, "store not present in dataset; view will be empty");
        }
    }
    if let Some(sku) = &selection.sku_label {
        if !dataset.sku_labels().contains(&sku.as_str()) {
            warn!(%sku, "SKU label not present in dataset; view will be empty");
        }
    }
}

fn run_interactive(handle: &DatasetHandle, cfg: &AlertConfig, args: &Args) -> Result<()> {
    let dataset = handle.get()?;
    let mut selection = Selection {
        store: args.store.clone(),
        sku_label: args.sku.clone(),
    };
    loop {
        println!(
            "Current filters: store = {}, SKU = {}",
            selection.store_caption(),
            selection.sku_caption()
        );
        println!("[1] Select store");
        println!("[2] Select SKU");
        println!("[3] Show dashboard");
        println!("[4] Exit\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            return Ok(());
        };
        match choice.as_str() {
            "1" => {
                selection.store = prompt_option("All stores", &dataset.stores());
                info!(store = selection.store_caption(), "store filter changed");
            }
            "2" => {
                selection.sku_label = prompt_option("All SKUs", &dataset.sku_labels());
                info!(sku = selection.sku_caption(), "SKU filter changed");
            }
            "3" => render(dataset, &selection, cfg, args)?,
            "4" => {
                println!("Exiting the program.");
                return Ok(());
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => AlertConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AlertConfig::default(),
    };

    let handle = DatasetHandle::new(&args.data, &args.products);
    let dataset = handle.get().context("loading dataset")?;
    if dataset.is_empty() {
        warn!("dataset has no valid rows; every view will be empty");
    }
    if let Some(report) = handle.report() {
        info!(
            total = report.total_rows,
            loaded = dataset.len(),
            skipped = report.parse_errors,
            unmatched_skus = report.unmatched_skus,
            "dataset ready"
        );
        println!(
            "Processing dataset... ({} rows loaded, {} skipped)",
            util::format_count(report.loaded_rows),
            util::format_count(report.parse_errors)
        );
    }

    if args.interactive {
        return run_interactive(&handle, &cfg, &args);
    }

    let selection = Selection {
        store: args.store.clone(),
        sku_label: args.sku.clone(),
    };
    warn_unknown(&selection, dataset);
    render(dataset, &selection, &cfg, &args)
}
