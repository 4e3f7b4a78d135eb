use anyhow::{anyhow, Result};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};

/// A single tabular row: an ordered mapping from column name to a scalar
/// value. Any row may be missing any key; no schema is enforced.
pub type Row = Map<String, Value>;

/// Build rows from a JSON array of objects.
pub fn rows_from_json(value: &Value) -> Result<Vec<Row>> {
    let array = value
        .as_array()
        .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

    let mut rows = Vec::with_capacity(array.len());
    for item in array {
        let obj = item
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        rows.push(obj.clone());
    }
    Ok(rows)
}

/// Build rows from CSV text. Cells that parse as numbers become JSON
/// numbers so numeric-key detection works the same for CSV and JSON input;
/// empty cells become null.
pub fn rows_from_csv(text: &str) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| anyhow!("Failed to read CSV headers: {}", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| anyhow!("Failed to read CSV row {}: {}", idx + 1, e))?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), csv_cell_value(field));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn csv_cell_value(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    Value::String(trimmed.to_string())
}

/// Case-folding key lookup built once per data batch: maps a requested key
/// to the actual row key by exact match first, then lowercase comparison.
/// If neither matches, the requested key is returned unchanged (reads will
/// simply find nothing — accepted behavior, not an error).
#[derive(Debug, Clone)]
pub struct KeyTable {
    exact: HashSet<String>,
    folded: HashMap<String, String>,
}

impl KeyTable {
    pub fn new(row: &Row) -> Self {
        let mut exact = HashSet::new();
        let mut folded = HashMap::new();
        for key in row.keys() {
            exact.insert(key.clone());
            folded.entry(key.to_lowercase()).or_insert_with(|| key.clone());
        }
        Self { exact, folded }
    }

    pub fn resolve(&self, key: &str) -> String {
        if self.exact.contains(key) {
            return key.to_string();
        }
        self.folded
            .get(&key.to_lowercase())
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Coerce a scalar to f64. Numeric strings are accepted; NaN and infinities
/// are rejected.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Display label for a scalar (used for legend values and x categories).
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Wrap a finite f64 in a JSON number, falling back to null for values the
/// JSON model cannot hold.
pub fn number_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Keep only rows whose stringified cell value is in the allowed set for
/// every filtered column. A row missing a filtered column is excluded.
pub fn apply_filters(rows: Vec<Row>, filters: &HashMap<String, Vec<String>>) -> Vec<Row> {
    if filters.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            filters.iter().all(|(column, allowed)| {
                row.get(column)
                    .map(|v| allowed.iter().any(|a| a == &value_label(v)))
                    .unwrap_or(false)
            })
        })
        .collect()
}
