//! FILENAME: core/pivot-heatmap/src/merge.rs
//! Hierarchical header merging - run-length encodes sorted keys into the
//! spans a renderer turns into colspan/rowspan.
//!
//! The same algorithm serves both axes. Each level is scanned once: a span
//! keeps growing while the current key matches the previous one on this
//! level and on every level above it, so a span never crosses a parent
//! boundary. The input must be sorted (as `aggregate` returns it); unsorted
//! keys split runs and the merger does not re-sort them.

use serde::{Deserialize, Serialize};

use crate::key::CompositeKey;

/// A merged run of identical adjacent header labels at one depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSpan {
    pub label: String,

    /// Index of the first key covered by the span.
    pub start: usize,

    /// Number of keys covered (always >= 1).
    pub span: usize,
}

impl HeaderSpan {
    /// One past the last covered key.
    pub fn end(&self) -> usize {
        self.start + self.span
    }
}

/// Produces one list of spans per level, `depth` levels in total.
pub fn merge_headers(keys: &[CompositeKey], depth: usize) -> Vec<Vec<HeaderSpan>> {
    (0..depth).map(|level| merge_level(keys, level)).collect()
}

/// Spans for a single level.
pub fn merge_level(keys: &[CompositeKey], level: usize) -> Vec<HeaderSpan> {
    let mut spans = Vec::new();
    let mut pending: Option<HeaderSpan> = None;

    for (index, key) in keys.iter().enumerate() {
        let label = key.level(level).unwrap_or("");

        if index > 0 && key.shares_prefix(&keys[index - 1], level) {
            if let Some(span) = pending.as_mut() {
                span.span += 1;
                continue;
            }
        }

        if let Some(done) = pending.take() {
            spans.push(done);
        }
        pending = Some(HeaderSpan {
            label: label.to_string(),
            start: index,
            span: 1,
        });
    }

    if let Some(done) = pending {
        spans.push(done);
    }

    spans
}

/// Returns the span at `level_spans` that starts exactly at `index`, which
/// is where a renderer emits the merged cell.
pub fn span_starting_at(level_spans: &[HeaderSpan], index: usize) -> Option<&HeaderSpan> {
    level_spans
        .binary_search_by(|span| span.start.cmp(&index))
        .ok()
        .map(|i| &level_spans[i])
}
