use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Hinge Insights.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// An export file could not be opened or read from disk.
    #[error("Cannot read export {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export text is not JSON.
    #[error("Export is not valid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The export parsed as JSON but its top level is not an array of profiles.
    #[error("Invalid export: {0}")]
    InvalidExport(String),

    /// A CLI or environment value cannot be honoured.
    #[error("Invalid setting: {0}")]
    Config(String),
}

/// Convenience alias used throughout the insights crates.
pub type Result<T> = std::result::Result<T, InsightsError>;
