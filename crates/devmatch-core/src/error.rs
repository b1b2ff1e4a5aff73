//! Error types for devmatch-core

use thiserror::Error;

/// Result type alias for devmatch operations
pub type Result<T> = std::result::Result<T, DevmatchError>;

/// Main error type for devmatch operations
///
/// Normalization, blocking and feature encoding never fail; everything that
/// touches files, configuration or models reports through this type.
#[derive(Error, Debug)]
pub enum DevmatchError {
    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet could not be opened or read
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config could not be serialized to TOML
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Config values are out of range or inconsistent
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Key schema names a component that does not exist (strict policy)
    #[error("Unknown key component: {0}")]
    UnknownKeyComponent(String),

    /// Required column is absent from a table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Training data has neither a `y` nor a `label` column
    #[error("Training data is missing the label (TP/FP) or y (0/1) column")]
    MissingLabel,

    /// A label sheet row could not be parsed
    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// The same candidate pair carries more than one label
    #[error("Duplicate label for pair ({0})")]
    DuplicateLabel(String),

    /// Model artifact does not match the feature layout
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Training needs at least one sample of each class
    #[error("Cannot train: {0}")]
    Training(String),
}
