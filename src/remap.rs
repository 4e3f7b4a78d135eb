use crate::rows::{KeyTable, Row};
use serde_json::Value;

// Generic keys emitted by upstream chart endpoints in place of semantic
// field names.
const PLACEHOLDER_KEYS: &[&str] = &[
    "x", "y", "name", "value", "category", "Year", "year", "Volume", "volume",
];

const X_PROBES: &[&str] = &["x", "name", "category", "Year", "year"];
const Y_PROBES: &[&str] = &["y", "value", "Volume", "volume"];

/// Whether the remap applies: the sample row exhibits at least one
/// placeholder key, or the declared target x field is missing from it.
/// Otherwise rows pass through unchanged (avoids needless copying).
pub fn needs_remap(sample: &Row, x_field: &str) -> bool {
    PLACEHOLDER_KEYS.iter().any(|k| sample.contains_key(*k)) || !sample.contains_key(x_field)
}

/// Rewrite rows keyed by placeholder names onto the configured
/// `(x_field, y_field)` names. The x value is probed from the placeholder
/// names in priority order, falling back to the row's first enumerated
/// key; y falls back to the second key, then the first. A configured
/// legend column is copied under its exact key, else a case-insensitive
/// match, else omitted for that row.
pub fn remap_rows(
    rows: &[Row],
    x_field: &str,
    y_field: &str,
    legend_field: Option<&str>,
) -> Vec<Row> {
    let table = rows.first().map(KeyTable::new);

    rows.iter()
        .map(|row| {
            let mut out = Row::new();
            out.insert(x_field.to_string(), resolve_x(row));
            out.insert(y_field.to_string(), resolve_y(row));
            if let (Some(legend), Some(table)) = (legend_field, table.as_ref()) {
                let actual = if row.contains_key(legend) {
                    legend.to_string()
                } else {
                    table.resolve(legend)
                };
                if let Some(v) = row.get(&actual) {
                    out.insert(legend.to_string(), v.clone());
                }
            }
            out
        })
        .collect()
}

fn resolve_x(row: &Row) -> Value {
    for probe in X_PROBES {
        if let Some(v) = row.get(*probe) {
            return v.clone();
        }
    }
    nth_value(row, 0)
}

fn resolve_y(row: &Row) -> Value {
    for probe in Y_PROBES {
        if let Some(v) = row.get(*probe) {
            return v.clone();
        }
    }
    if row.len() >= 2 {
        nth_value(row, 1)
    } else {
        nth_value(row, 0)
    }
}

fn nth_value(row: &Row, n: usize) -> Value {
    row.values().nth(n).cloned().unwrap_or(Value::Null)
}
