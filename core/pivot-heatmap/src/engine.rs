//! FILENAME: core/pivot-heatmap/src/engine.rs
//! Pivot Engine - turns a definition and a record set into a PivotView.
//!
//! Algorithm:
//! 1. Validate the definition
//! 2. Group records by row/column composite keys and reduce each cell
//! 3. Merge the sorted row and column keys into per-level header spans
//! 4. If a heatmap is configured, color every cell under its scope
//! 5. If a legend is requested, bucket the global value range

use log::{debug, trace, warn};

use crate::aggregate::{aggregate, DataMatrix};
use crate::definition::{HeatmapOptions, PivotDefinition};
use crate::error::Result;
use crate::heatmap::{legend, Color, HeatmapNormalizer, LegendEntry};
use crate::merge::merge_headers;
use crate::record::Record;
use crate::view::PivotView;

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// One pivot computation over a borrowed record set.
pub struct PivotCalculator<'a> {
    definition: &'a PivotDefinition,
    records: &'a [Record],
}

impl<'a> PivotCalculator<'a> {
    pub fn new(definition: &'a PivotDefinition, records: &'a [Record]) -> Self {
        PivotCalculator {
            definition,
            records,
        }
    }

    /// Executes the full calculation and returns the view.
    pub fn calculate(&self) -> Result<PivotView> {
        let def = self.definition;
        def.validate()?;

        debug!(
            "calculating pivot: {} records, rows={:?} cols={:?} value={} aggregation={}",
            self.records.len(),
            def.row_fields,
            def.column_fields,
            def.value_field,
            def.aggregation
        );

        // Step 1: Group and reduce
        let data = aggregate(
            self.records,
            &def.row_fields,
            &def.column_fields,
            &def.value_field,
            def.aggregation,
        )?;

        // Step 2: Header spans for both axes
        let row_spans = merge_headers(&data.row_headers, def.row_fields.len());
        let column_keys = data.column_keys();
        let column_spans = merge_headers(&column_keys, def.column_fields.len());
        trace!(
            "merged headers: {} row levels, {} column levels",
            row_spans.len(),
            column_spans.len()
        );

        // Step 3: Heatmap colors and legend
        let (colors, legend) = match &def.heatmap {
            Some(options) => {
                let (colors, legend) = self.shade(&data.matrix, options)?;
                (Some(colors), legend)
            }
            None => (None, None),
        };

        debug!(
            "pivot ready: {} rows x {} columns",
            data.row_headers.len(),
            data.column_groups.len()
        );

        Ok(PivotView {
            row_fields: def.row_fields.clone(),
            column_fields: def.column_fields.clone(),
            value_field: def.value_field.clone(),
            aggregation: def.aggregation,
            row_headers: data.row_headers,
            row_spans,
            column_groups: data.column_groups,
            column_spans,
            matrix: data.matrix,
            colors,
            legend,
        })
    }

    /// Computes cell colors and, when requested, the legend.
    fn shade(
        &self,
        matrix: &DataMatrix,
        options: &HeatmapOptions,
    ) -> Result<(Vec<Vec<Color>>, Option<Vec<LegendEntry>>)> {
        let normalizer = HeatmapNormalizer::new(matrix, options.scale);
        let colors = normalizer.cell_colors(matrix, options.scope);

        if !options.show_legend {
            return Ok((colors, None));
        }

        let entries = match normalizer.global_range() {
            Some(range) => legend(normalizer.scale(), range.min, range.max, options.legend_steps)?,
            None => {
                warn!("legend requested for an empty data matrix");
                Vec::new()
            }
        };

        Ok((colors, Some(entries)))
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a pivot view from a definition and records.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(definition: &PivotDefinition, records: &[Record]) -> Result<PivotView> {
    PivotCalculator::new(definition, records).calculate()
}
