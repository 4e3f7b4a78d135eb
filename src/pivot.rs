use crate::rows::{number_value, value_as_f64, value_label, KeyTable, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Policy for duplicate (x, legend) pairs during the pivot. `Last`
/// preserves the historical overwrite behavior of the pivot path; the pie
/// path always sums regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Last,
    Sum,
    Avg,
}

impl Aggregation {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "last" => Some(Aggregation::Last),
            "sum" => Some(Aggregation::Sum),
            "avg" | "mean" => Some(Aggregation::Avg),
            _ => None,
        }
    }
}

/// Wide-format pivot output. `unique_values` is the distinct legend values
/// in first-seen order; this order drives series and color assignment
/// downstream, so it is part of the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotResult {
    pub pivoted: Vec<Row>,
    pub unique_values: Vec<String>,
}

// Key names that never count as series fields when deciding whether the
// data is already pivoted.
const NON_SERIES_KEYS: &[&str] = &["year", "date", "category", "label"];

/// Convert long-format rows `{x, legend, y}` into wide-format rows
/// `{x, legend1: y1, legend2: y2, ...}`, one output row per distinct x
/// value in first-seen order.
///
/// Key resolution is case-insensitive against the first row; an entirely
/// unknown key is used literally and reads nothing. Empty input returns an
/// empty result. Rows that already carry two or more numeric series fields
/// are treated as pre-pivoted and pass through unchanged.
pub fn pivot_by_legend(
    rows: &[Row],
    x_key: &str,
    y_key: &str,
    legend_key: &str,
    aggregation: Aggregation,
) -> PivotResult {
    let first = match rows.first() {
        Some(r) => r,
        None => return PivotResult::default(),
    };

    let table = KeyTable::new(first);
    let actual_x = table.resolve(x_key);
    let actual_y = table.resolve(y_key);
    let actual_legend = table.resolve(legend_key);

    if let Some(series_fields) = pre_pivoted_fields(first, &actual_x, &actual_legend) {
        log::debug!(
            "rows already pivoted; passing through with series {:?}",
            series_fields
        );
        return PivotResult {
            pivoted: rows.to_vec(),
            unique_values: series_fields,
        };
    }

    let mut unique_values: Vec<String> = Vec::new();
    let mut seen_legends: HashSet<String> = HashSet::new();

    let mut x_order: Vec<String> = Vec::new();
    let mut accumulators: HashMap<String, Row> = HashMap::new();
    // (x label, legend label) -> running count, for averaging.
    let mut counts: HashMap<(String, String), f64> = HashMap::new();

    for row in rows {
        let legend_val = row.get(&actual_legend).filter(|v| !v.is_null());
        let legend_label = legend_val.map(value_label);

        if let Some(label) = &legend_label {
            if seen_legends.insert(label.clone()) {
                unique_values.push(label.clone());
            }
        }

        let x_val = row.get(&actual_x).cloned().unwrap_or(Value::Null);
        let x_label = value_label(&x_val);

        if !accumulators.contains_key(&x_label) {
            x_order.push(x_label.clone());
            let mut acc = Row::new();
            acc.insert(x_key.to_string(), x_val);
            accumulators.insert(x_label.clone(), acc);
        }

        let (acc, label) = match (accumulators.get_mut(&x_label), legend_label) {
            (Some(acc), Some(label)) => (acc, label),
            _ => continue,
        };

        let y_val = row.get(&actual_y).cloned().unwrap_or(Value::Null);
        match aggregation {
            Aggregation::Last => {
                // Later rows with the same (x, legend) overwrite.
                acc.insert(label, y_val);
            }
            Aggregation::Sum | Aggregation::Avg => {
                let previous = acc.get(&label).and_then(value_as_f64).unwrap_or(0.0);
                let increment = value_as_f64(&y_val).unwrap_or(0.0);
                acc.insert(label.clone(), number_value(previous + increment));
                *counts.entry((x_label.clone(), label)).or_insert(0.0) += 1.0;
            }
        }
    }

    if aggregation == Aggregation::Avg {
        for ((x_label, legend), count) in &counts {
            if *count > 1.0 {
                if let Some(acc) = accumulators.get_mut(x_label) {
                    if let Some(total) = acc.get(legend).and_then(value_as_f64) {
                        acc.insert(legend.clone(), number_value(total / count));
                    }
                }
            }
        }
    }

    let pivoted = x_order
        .iter()
        .filter_map(|x| accumulators.remove(x))
        .collect();

    PivotResult {
        pivoted,
        unique_values,
    }
}

/// Pre-pivoted detection: collect numeric fields of the sample row other
/// than the x key, the legend key, and the non-series names. Two or more
/// such fields means the data already carries one column per series.
fn pre_pivoted_fields(row: &Row, x_key: &str, legend_key: &str) -> Option<Vec<String>> {
    let numeric: Vec<String> = row
        .iter()
        .filter(|(k, v)| {
            k.as_str() != x_key
                && k.as_str() != legend_key
                && !NON_SERIES_KEYS.contains(&k.to_lowercase().as_str())
                && value_as_f64(v).is_some()
        })
        .map(|(k, _)| k.clone())
        .collect();
    if numeric.len() >= 2 {
        Some(numeric)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::rows_from_json;
    use serde_json::json;

    #[test]
    fn test_pivot_empty_input() {
        let result = pivot_by_legend(&[], "x", "y", "l", Aggregation::Last);
        assert!(result.pivoted.is_empty());
        assert!(result.unique_values.is_empty());
    }

    #[test]
    fn test_pivot_first_seen_legend_order() {
        let rows = rows_from_json(&json!([
            {"x": 1, "l": "B", "y": 5},
            {"x": 1, "l": "A", "y": 3},
            {"x": 2, "l": "A", "y": 7}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "l", Aggregation::Last);
        assert_eq!(result.unique_values, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(result.pivoted.len(), 2);
        assert_eq!(result.pivoted[0]["x"], json!(1));
        assert_eq!(result.pivoted[0]["B"], json!(5));
        assert_eq!(result.pivoted[0]["A"], json!(3));
        assert_eq!(result.pivoted[1]["A"], json!(7));
        assert!(result.pivoted[1].get("B").is_none());
    }

    #[test]
    fn test_pivot_last_write_wins() {
        let rows = rows_from_json(&json!([
            {"x": 1, "l": "A", "y": 5},
            {"x": 1, "l": "A", "y": 9}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "l", Aggregation::Last);
        assert_eq!(result.pivoted.len(), 1);
        assert_eq!(result.pivoted[0]["A"], json!(9));
    }

    #[test]
    fn test_pivot_sum_strategy() {
        let rows = rows_from_json(&json!([
            {"x": 1, "l": "A", "y": 5},
            {"x": 1, "l": "A", "y": 9}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "l", Aggregation::Sum);
        assert_eq!(result.pivoted[0]["A"], json!(14.0));
    }

    #[test]
    fn test_pivot_avg_strategy() {
        let rows = rows_from_json(&json!([
            {"x": 1, "l": "A", "y": 5},
            {"x": 1, "l": "A", "y": 9},
            {"x": 2, "l": "A", "y": 4}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "l", Aggregation::Avg);
        assert_eq!(result.pivoted[0]["A"], json!(7.0));
        // Single observation stays untouched.
        assert_eq!(result.pivoted[1]["A"], json!(4.0));
    }

    #[test]
    fn test_pivot_case_insensitive_keys() {
        let rows = rows_from_json(&json!([
            {"Year": 2020, "Region": "East", "Volume": 10}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "year", "volume", "region", Aggregation::Last);
        assert_eq!(result.unique_values, vec!["East".to_string()]);
        assert_eq!(result.pivoted[0]["year"], json!(2020));
        assert_eq!(result.pivoted[0]["East"], json!(10));
    }

    #[test]
    fn test_pivot_unknown_legend_key_reads_nothing() {
        let rows = rows_from_json(&json!([
            {"x": 1, "y": 2}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "nope", Aggregation::Last);
        assert!(result.unique_values.is_empty());
        // One accumulator per x value still comes out, holding only x.
        assert_eq!(result.pivoted.len(), 1);
        assert_eq!(result.pivoted[0]["x"], json!(1));
    }

    #[test]
    fn test_pivot_pre_pivoted_short_circuit() {
        let rows = rows_from_json(&json!([
            {"year": 2020, "East": 10, "West": 12},
            {"year": 2021, "East": 11, "West": 13}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "year", "value", "region", Aggregation::Last);
        assert_eq!(
            result.unique_values,
            vec!["East".to_string(), "West".to_string()]
        );
        assert_eq!(result.pivoted, rows);
    }

    #[test]
    fn test_pivot_long_format_not_mistaken_for_pre_pivoted() {
        // A long-format row has exactly one numeric series candidate (y),
        // which must not trigger the pass-through.
        let rows = rows_from_json(&json!([
            {"x": 1, "region": "East", "y": 10}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "region", Aggregation::Last);
        assert_eq!(result.unique_values, vec!["East".to_string()]);
        assert_eq!(result.pivoted[0]["East"], json!(10));
    }

    #[test]
    fn test_pivot_distinct_legend_count() {
        let rows = rows_from_json(&json!([
            {"x": 1, "l": "A", "y": 1},
            {"x": 2, "l": "B", "y": 2},
            {"x": 3, "l": "C", "y": 3},
            {"x": 4, "l": "A", "y": 4}
        ]))
        .unwrap();
        let result = pivot_by_legend(&rows, "x", "y", "l", Aggregation::Last);
        assert_eq!(result.unique_values.len(), 3);
        assert_eq!(result.pivoted.len(), 4);
    }
}
