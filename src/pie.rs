use crate::rows::{value_as_f64, value_label, Row};
use serde::{Deserialize, Serialize};

/// One pie slice: a category label and its summed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// Sum y values across all rows sharing the same x value. Output follows
/// first-seen x order; non-numeric y values count as 0. This is a true
/// summing aggregation, unlike the legend pivot's overwrite default.
pub fn aggregate_pie(rows: &[Row], x_key: &str, y_key: &str) -> Vec<PieSlice> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: std::collections::HashMap<String, f64> = std::collections::HashMap::new();

    for row in rows {
        let name = row.get(x_key).map(value_label).unwrap_or_default();
        let value = row.get(y_key).and_then(value_as_f64).unwrap_or(0.0);

        if !totals.contains_key(&name) {
            order.push(name.clone());
        }
        *totals.entry(name).or_insert(0.0) += value;
    }

    order
        .into_iter()
        .map(|name| {
            let value = totals.get(&name).copied().unwrap_or(0.0);
            PieSlice { name, value }
        })
        .collect()
}
