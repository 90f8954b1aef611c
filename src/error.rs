use thiserror::Error;

/// Failures surfaced before the KPI engine ever runs.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("{file} is missing required column '{column}'")]
    MissingColumn { file: &'static str, column: &'static str },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
