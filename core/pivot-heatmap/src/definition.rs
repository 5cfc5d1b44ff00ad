//! FILENAME: core/pivot-heatmap/src/definition.rs
//! Pivot Table Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot table:
//! which fields go on each axis, which field is aggregated and how, and
//! whether the result is shaded as a heatmap. Definitions are immutable
//! snapshots of intent and can be loaded from JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};
use crate::heatmap::ColorScale;

/// Number of legend buckets when none is configured.
pub const DEFAULT_LEGEND_STEPS: usize = 10;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported reductions for a cell's value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    Sum,
    Count,
    CountUnique,
    Average,
    Median,
}

impl AggregationType {
    /// Whether every contributing value must be a number.
    pub fn requires_numbers(self) -> bool {
        matches!(
            self,
            AggregationType::Sum | AggregationType::Average | AggregationType::Median
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::CountUnique => "countUnique",
            AggregationType::Average => "average",
            AggregationType::Median => "median",
        }
    }
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown names are an error; there is no fallback to `sum`.
impl FromStr for AggregationType {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(AggregationType::Sum),
            "count" => Ok(AggregationType::Count),
            "countUnique" => Ok(AggregationType::CountUnique),
            "average" => Ok(AggregationType::Average),
            "median" => Ok(AggregationType::Median),
            other => Err(PivotError::UnsupportedAggregationMode(other.to_string())),
        }
    }
}

// ============================================================================
// HEATMAP OPTIONS
// ============================================================================

/// Which cells define the min/max range a value is normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatmapScope {
    /// Whole data matrix.
    Global,
    /// Only the cells in the value's row.
    Row,
    /// Only the cells in the value's column.
    Column,
    /// Same as `Global`.
    None,
}

impl Default for HeatmapScope {
    fn default() -> Self {
        HeatmapScope::Global
    }
}

/// Heatmap shading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapOptions {
    #[serde(default)]
    pub scope: HeatmapScope,

    /// Emit a discretized legend alongside the colors.
    #[serde(default)]
    pub show_legend: bool,

    /// Number of legend buckets (must be >= 1).
    #[serde(default = "default_legend_steps")]
    pub legend_steps: usize,

    /// Endpoint colors (low -> high intensity).
    #[serde(default)]
    pub scale: ColorScale,
}

fn default_legend_steps() -> usize {
    DEFAULT_LEGEND_STEPS
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        HeatmapOptions {
            scope: HeatmapScope::Global,
            show_legend: false,
            legend_steps: DEFAULT_LEGEND_STEPS,
            scale: ColorScale::default(),
        }
    }
}

impl HeatmapOptions {
    pub fn with_scope(scope: HeatmapScope) -> Self {
        HeatmapOptions {
            scope,
            ..HeatmapOptions::default()
        }
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of a pivot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotDefinition {
    /// Fields placed on the row axis (ordered from outer to inner).
    #[serde(default)]
    pub row_fields: Vec<String>,

    /// Fields placed on the column axis (ordered from outer to inner).
    #[serde(default)]
    pub column_fields: Vec<String>,

    /// The field whose values are aggregated into the cells.
    pub value_field: String,

    #[serde(default)]
    pub aggregation: AggregationType,

    /// Heatmap shading; None disables colors and legend.
    #[serde(default)]
    pub heatmap: Option<HeatmapOptions>,
}

impl PivotDefinition {
    /// Creates a definition that sums `value_field` with no heatmap.
    pub fn new<R, C>(row_fields: R, column_fields: C, value_field: impl Into<String>) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        PivotDefinition {
            row_fields: row_fields.into_iter().map(Into::into).collect(),
            column_fields: column_fields.into_iter().map(Into::into).collect(),
            value_field: value_field.into(),
            aggregation: AggregationType::Sum,
            heatmap: None,
        }
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_heatmap(mut self, heatmap: HeatmapOptions) -> Self {
        self.heatmap = Some(heatmap);
        self
    }

    /// Parses a definition from JSON. An unknown aggregation name fails with
    /// `UnsupportedAggregationMode`, not a generic JSON error.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDefinition = serde_json::from_str(json)?;
        let definition = raw.into_definition()?;
        definition.validate()?;
        Ok(definition)
    }

    /// Checks the parts of the definition serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.value_field.is_empty() {
            return Err(PivotError::EmptyValueField);
        }
        if let Some(heatmap) = &self.heatmap {
            if heatmap.legend_steps == 0 {
                return Err(PivotError::InvalidLegendSteps(0));
            }
        }
        Ok(())
    }
}

/// Wire form of a definition with the aggregation still a plain name, so it
/// can go through `AggregationType::from_str`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
    #[serde(default)]
    row_fields: Vec<String>,

    #[serde(default)]
    column_fields: Vec<String>,

    value_field: String,

    #[serde(default)]
    aggregation: Option<String>,

    #[serde(default)]
    heatmap: Option<HeatmapOptions>,
}

impl RawDefinition {
    fn into_definition(self) -> Result<PivotDefinition> {
        let aggregation = match self.aggregation.as_deref() {
            Some(name) => name.parse::<AggregationType>()?,
            None => AggregationType::default(),
        };
        Ok(PivotDefinition {
            row_fields: self.row_fields,
            column_fields: self.column_fields,
            value_field: self.value_field,
            aggregation,
            heatmap: self.heatmap,
        })
    }
}
