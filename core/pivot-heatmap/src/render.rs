//! FILENAME: core/pivot-heatmap/src/render.rs
//! HTML rendering of a PivotView.
//!
//! The renderer only reads the view: spans become colspan/rowspan, colors
//! become inline backgrounds, and the legend becomes a trailing block. It
//! never groups, aggregates or normalizes anything itself.

use crate::heatmap::LegendEntry;
use crate::merge::span_starting_at;
use crate::view::PivotView;

/// Renders the view as an HTML table, followed by the legend when present.
pub fn render_html(view: &PivotView) -> String {
    let mut html = String::from(r#"<table border="1"><thead>"#);

    render_column_headers(view, &mut html);
    render_row_label_header(view, &mut html);

    html.push_str("</thead><tbody>");
    render_data_rows(view, &mut html);
    html.push_str("</tbody></table>");

    if let Some(entries) = &view.legend {
        if !entries.is_empty() {
            html.push_str(&render_legend(entries));
        }
    }

    html
}

/// Width of the row-label block. Without row fields one label column is
/// still kept so the column field names have a cell to sit in.
fn corner_width(view: &PivotView) -> usize {
    view.row_fields.len().max(1)
}

/// One header row per column field. The first corner cell names the field.
fn render_column_headers(view: &PivotView, html: &mut String) {
    for (level, spans) in view.column_spans.iter().enumerate() {
        html.push_str("<tr>");
        for i in 0..corner_width(view) {
            let label = if i == 0 {
                view.column_fields.get(level).map(String::as_str).unwrap_or("")
            } else {
                ""
            };
            html.push_str(&format!("<th>{}</th>", html_escape(label)));
        }
        for span in spans {
            html.push_str(&format!(
                r#"<th colspan="{}">{}</th>"#,
                span.span,
                html_escape(&span.label)
            ));
        }
        html.push_str("</tr>");
    }
}

/// The row naming the row fields. Without column fields it also titles the
/// single value column.
fn render_row_label_header(view: &PivotView, html: &mut String) {
    html.push_str("<tr>");
    for field in &view.row_fields {
        html.push_str(&format!("<th>{}</th>", html_escape(field)));
    }
    if view.row_fields.is_empty() {
        html.push_str("<th></th>");
    }
    if view.column_fields.is_empty() {
        let title = format!("{} of {}", view.aggregation, view.value_field);
        for _ in &view.column_groups {
            html.push_str(&format!("<th>{}</th>", html_escape(&title)));
        }
    }
    html.push_str("</tr>");
}

fn render_data_rows(view: &PivotView, html: &mut String) {
    for row in 0..view.row_count() {
        html.push_str("<tr>");

        if view.row_fields.is_empty() {
            let title = format!("{} of {}", view.aggregation, view.value_field);
            html.push_str(&format!("<td>{}</td>", html_escape(&title)));
        }
        for spans in &view.row_spans {
            if let Some(span) = span_starting_at(spans, row) {
                html.push_str(&format!(
                    r#"<td rowspan="{}">{}</td>"#,
                    span.span,
                    html_escape(&span.label)
                ));
            }
        }

        for col in 0..view.col_count() {
            let value = view.value_or_zero(row, col);
            match view.color(row, col) {
                Some(color) => html.push_str(&format!(
                    r#"<td style="background-color: {};">{}</td>"#,
                    color.to_rgb_css(),
                    value
                )),
                None => html.push_str(&format!("<td>{}</td>", value)),
            }
        }

        html.push_str("</tr>");
    }
}

fn render_legend(entries: &[LegendEntry]) -> String {
    let swatches: String = entries
        .iter()
        .map(|entry| {
            format!(
                r#"<div style="display: flex; align-items: center; margin-right: 15px;"><div style="width: 20px; height: 20px; background-color: {}; margin-right: 5px;"></div><div>{}</div></div>"#,
                entry.color.to_rgb_css(),
                html_escape(&entry.label)
            )
        })
        .collect();

    format!(
        r#"<div class="pivot-legend" style="display: flex; align-items: center; margin-top: 10px;"><div style="margin-right: 10px;">Legend:</div>{}</div>"#,
        swatches
    )
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
