//! FILENAME: core/pivot-heatmap/src/lib.rs
//! Pivot table engine with heatmap shading.
//!
//! This crate cross-tabulates in-memory records into a row x column matrix
//! of aggregated values, merges nested headers into spans, and optionally
//! maps every cell to a heatmap color.
//!
//! Layers:
//! - `record`: Typed input rows (what we compute FROM)
//! - `definition`: Serializable configuration (what the pivot table IS)
//! - `key` / `aggregate`: Grouping and reduction (HOW we compute)
//! - `merge` / `heatmap`: Header spans and colors (HOW we present)
//! - `view`: Structured output for renderers (WHAT we display)
//! - `engine`: The single entry point tying the layers together
//! - `render`: HTML rendering of a view

pub mod aggregate;
pub mod definition;
pub mod engine;
pub mod error;
pub mod heatmap;
pub mod key;
pub mod merge;
pub mod record;
pub mod render;
pub mod view;

pub use aggregate::{aggregate, ColumnGroup, DataMatrix, PivotAccumulator, PivotData};
pub use definition::{AggregationType, HeatmapOptions, HeatmapScope, PivotDefinition};
pub use engine::{calculate_pivot, PivotCalculator};
pub use error::{PivotError, Result};
pub use heatmap::{legend, Color, ColorScale, HeatmapNormalizer, LegendEntry, ValueRange};
pub use key::{CompositeKey, KEY_SEPARATOR};
pub use merge::{merge_headers, HeaderSpan};
pub use record::{records_from_json, Record, Value};
pub use render::render_html;
pub use view::PivotView;
