//! FILENAME: core/pivot-heatmap/src/view.rs
//! Pivot View - the structured result a renderer consumes.
//!
//! The view carries everything needed to draw the table without redoing
//! any aggregation or normalization:
//! - Sorted row headers and column groups, with per-level header spans
//! - The data matrix (absent cells are `None`, shown as 0)
//! - Optional per-cell heatmap colors and an optional legend

use serde::Serialize;

use crate::aggregate::{ColumnGroup, DataMatrix};
use crate::definition::AggregationType;
use crate::error::Result;
use crate::heatmap::{Color, LegendEntry};
use crate::key::CompositeKey;
use crate::merge::HeaderSpan;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotView {
    /// Row axis field names, outer to inner.
    pub row_fields: Vec<String>,

    /// Column axis field names, outer to inner.
    pub column_fields: Vec<String>,

    pub value_field: String,

    pub aggregation: AggregationType,

    /// Distinct row keys, ascending.
    pub row_headers: Vec<CompositeKey>,

    /// One list of spans per row field (rowspan).
    pub row_spans: Vec<Vec<HeaderSpan>>,

    /// Distinct column keys with their member records, ascending.
    pub column_groups: Vec<ColumnGroup>,

    /// One list of spans per column field (colspan).
    pub column_spans: Vec<Vec<HeaderSpan>>,

    pub matrix: DataMatrix,

    /// Per-cell colors, `[row][col]`, present when a heatmap is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Vec<Color>>>,

    /// Present when the heatmap asks for a legend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Vec<LegendEntry>>,
}

impl PivotView {
    pub fn row_count(&self) -> usize {
        self.row_headers.len()
    }

    pub fn col_count(&self) -> usize {
        self.column_groups.len()
    }

    /// True when no record contributed to the view.
    pub fn is_empty(&self) -> bool {
        self.row_headers.is_empty() && self.column_groups.is_empty()
    }

    pub fn value_or_zero(&self, row: usize, col: usize) -> f64 {
        self.matrix.value_or_zero(row, col)
    }

    pub fn color(&self, row: usize, col: usize) -> Option<Color> {
        self.colors
            .as_ref()
            .and_then(|rows| rows.get(row))
            .and_then(|cells| cells.get(col))
            .copied()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
