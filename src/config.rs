//! Alert thresholds and display bands.
//!
//! Defaults are compiled in. A JSON file may override any subset of fields:
//!
//! ```json
//! { "efficiency_high_pct": 120.0, "stock_low_factor": 0.5 }
//! ```

use crate::error::{DashboardError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertConfig {
    /// Fraction of the dataset-wide mean stock below which a row is "low".
    pub stock_low_factor: f64,
    /// Multiple of the mean per-store transfer cost above which a store is flagged.
    pub cost_high_factor: f64,
    /// Order efficiency (%) above which over-ordering is reported.
    pub efficiency_high_pct: f64,
    /// Order efficiency (%) below which stockout risk is reported.
    pub efficiency_low_pct: f64,
    /// Efficiency (%) at or above which the KPI is shown green.
    pub efficiency_good_pct: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            stock_low_factor: 0.6,
            cost_high_factor: 1.5,
            efficiency_high_pct: 130.0,
            efficiency_low_pct: 70.0,
            efficiency_good_pct: 90.0,
        }
    }
}

impl AlertConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: AlertConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DashboardError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("stock_low_factor", self.stock_low_factor),
            ("cost_high_factor", self.cost_high_factor),
            ("efficiency_high_pct", self.efficiency_high_pct),
            ("efficiency_low_pct", self.efficiency_low_pct),
            ("efficiency_good_pct", self.efficiency_good_pct),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(DashboardError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.efficiency_low_pct >= self.efficiency_high_pct {
            return Err(DashboardError::InvalidConfig(format!(
                "efficiency_low_pct ({}) must be below efficiency_high_pct ({})",
                self.efficiency_low_pct, self.efficiency_high_pct
            )));
        }
        Ok(())
    }
}
