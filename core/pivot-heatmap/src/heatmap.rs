//! FILENAME: core/pivot-heatmap/src/heatmap.rs
//! Heatmap normalization - maps aggregated values to colors.
//!
//! A value is first normalized to an intensity in [0, 1] against the min/max
//! of a scope (the whole matrix, its row, or its column), then interpolated
//! between the two endpoint colors of a `ColorScale`. Ranges are taken over
//! the cells that hold a value; absent cells read as 0 and are clamped into
//! the scale like any other out-of-range value.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::aggregate::DataMatrix;
use crate::definition::HeatmapScope;
use crate::error::{PivotError, Result};

// ============================================================================
// COLORS
// ============================================================================

/// An opaque RGB color. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const fn white() -> Self {
        Color::new(255, 255, 255)
    }

    pub const fn red() -> Self {
        Color::new(255, 0, 0)
    }

    /// Hex form, e.g. `#ff8080`.
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Functional form, e.g. `rgb(255,128,128)`.
    pub fn to_rgb_css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{}' must start with '#'", s))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{}' must have six hex digits", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("color '{}' has an invalid hex digit", s))
        };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Linear interpolation between a low-intensity and a high-intensity color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScale {
    pub low: Color,
    pub high: Color,
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale {
            low: Color::white(),
            high: Color::red(),
        }
    }
}

impl ColorScale {
    pub fn new(low: Color, high: Color) -> Self {
        ColorScale { low, high }
    }

    /// Color at `intensity`; each channel is rounded and clamped to [0, 255].
    pub fn interpolate(&self, intensity: f64) -> Color {
        let t = if intensity.is_finite() { intensity } else { 0.0 };
        let channel = |low: u8, high: u8| {
            let low = low as f64;
            let high = high as f64;
            (low + t * (high - low)).round().clamp(0.0, 255.0) as u8
        };
        Color::new(
            channel(self.low.r, self.high.r),
            channel(self.low.g, self.high.g),
            channel(self.low.b, self.high.b),
        )
    }
}

// ============================================================================
// RANGES & NORMALIZER
// ============================================================================

/// Closed min/max range of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range of `values`, or None when there are none.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| match range {
            None => Some(ValueRange { min: v, max: v }),
            Some(r) => Some(ValueRange {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    /// `(value - min) / (max - min)` clamped to [0, 1]. A degenerate range
    /// (`max == min`) yields 0, the base color.
    pub fn intensity(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width == 0.0 || !width.is_finite() {
            return 0.0;
        }
        let t = (value - self.min) / width;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }
}

/// Pre-computed value ranges for every scope of one data matrix.
#[derive(Debug, Clone)]
pub struct HeatmapNormalizer {
    scale: ColorScale,
    global: Option<ValueRange>,
    rows: Vec<Option<ValueRange>>,
    columns: Vec<Option<ValueRange>>,
}

impl HeatmapNormalizer {
    pub fn new(matrix: &DataMatrix, scale: ColorScale) -> Self {
        HeatmapNormalizer {
            scale,
            global: ValueRange::of(matrix.values()),
            rows: (0..matrix.row_count())
                .map(|r| ValueRange::of(matrix.row_values(r)))
                .collect(),
            columns: (0..matrix.col_count())
                .map(|c| ValueRange::of(matrix.column_values(c)))
                .collect(),
        }
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Min/max over every present cell.
    pub fn global_range(&self) -> Option<ValueRange> {
        self.global
    }

    /// The range `scope` normalizes the cell at (`row`, `col`) against.
    pub fn range_for(&self, scope: HeatmapScope, row: usize, col: usize) -> Option<ValueRange> {
        match scope {
            HeatmapScope::Global | HeatmapScope::None => self.global,
            HeatmapScope::Row => self.rows.get(row).copied().flatten(),
            HeatmapScope::Column => self.columns.get(col).copied().flatten(),
        }
    }

    /// Intensity in [0, 1]; 0 when the scope has no range or a degenerate one.
    pub fn intensity(&self, value: f64, scope: HeatmapScope, row: usize, col: usize) -> f64 {
        self.range_for(scope, row, col)
            .map_or(0.0, |range| range.intensity(value))
    }

    pub fn color_for(&self, value: f64, scope: HeatmapScope, row: usize, col: usize) -> Color {
        self.scale.interpolate(self.intensity(value, scope, row, col))
    }

    /// Colors for every cell of `matrix`, absent cells read as 0.
    pub fn cell_colors(&self, matrix: &DataMatrix, scope: HeatmapScope) -> Vec<Vec<Color>> {
        (0..matrix.row_count())
            .map(|row| {
                (0..matrix.col_count())
                    .map(|col| self.color_for(matrix.value_or_zero(row, col), scope, row, col))
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// LEGEND
// ============================================================================

/// One legend bucket: color sampled at `start`, covering `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: Color,
    pub start: f64,
    pub end: f64,
    pub label: String,
}

/// Splits `[min, max]` into `steps` equal-width buckets.
pub fn legend(scale: &ColorScale, min: f64, max: f64, steps: usize) -> Result<Vec<LegendEntry>> {
    if steps == 0 {
        return Err(PivotError::InvalidLegendSteps(steps));
    }

    let range = ValueRange { min, max };
    let width = (max - min) / steps as f64;

    Ok((0..steps)
        .map(|i| {
            let start = min + width * i as f64;
            let end = min + width * (i + 1) as f64;
            LegendEntry {
                color: scale.interpolate(range.intensity(start)),
                start,
                end,
                label: format!("{:.2} - {:.2}", start, end),
            }
        })
        .collect())
}
