//! FILENAME: core/pivot-heatmap/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("record {record}: field '{field}' not found")]
    FieldNotFound { record: usize, field: String },

    #[error("record {record}: field '{field}' holds non-numeric value '{value}'")]
    InvalidValue {
        record: usize,
        field: String,
        value: String,
    },

    #[error("unsupported aggregation mode: {0}")]
    UnsupportedAggregationMode(String),

    #[error("legend needs at least one step, got {0}")]
    InvalidLegendSteps(usize),

    #[error("pivot too large: {rows} row groups x {cols} column groups")]
    TooManyGroups { rows: usize, cols: usize },

    #[error("value field name is empty")]
    EmptyValueField,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PivotError>;
