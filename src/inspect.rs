use crate::rows::{value_as_f64, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Renderable chart kinds. Area and scatter share the line-chart key
/// detection heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Area,
    Pie,
    Scatter,
}

impl ChartType {
    /// Parse a chart type tag, accepting both bare names ("pie") and the
    /// suffixed form used by chart requests ("pie_chart").
    pub fn parse(tag: &str) -> Option<Self> {
        let name = tag.trim().to_lowercase();
        let name = name.strip_suffix("_chart").unwrap_or(&name);
        match name {
            "line" => Some(ChartType::Line),
            "bar" => Some(ChartType::Bar),
            "area" => Some(ChartType::Area),
            "pie" => Some(ChartType::Pie),
            "scatter" => Some(ChartType::Scatter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
        }
    }
}

/// Configuration for one renderable series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub x_field: Option<String>,
    pub y_field: Option<String>,
    pub legend_field: Option<String>,
    #[serde(default)]
    pub y_fields: Vec<String>,
    #[serde(default)]
    pub filters: HashMap<String, Vec<String>>,
}

/// Resolved axis keys. Either side may be None, in which case the caller
/// must fall back to a "configure chart" placeholder rather than error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisBinding {
    pub x_key: Option<String>,
    pub y_key: Option<String>,
}

/// Detect x/y keys for a sample row. Caller-supplied fields win when they
/// exist as literal keys; otherwise per-chart-type name heuristics apply,
/// falling back to positional keys. Never errors: an empty or missing
/// sample yields an unresolved binding.
pub fn resolve_axes(sample: Option<&Row>, chart_type: ChartType, config: &SeriesConfig) -> AxisBinding {
    let row = match sample {
        Some(r) if !r.is_empty() => r,
        _ => return AxisBinding::default(),
    };

    let x_key = config
        .x_field
        .as_ref()
        .filter(|f| row.contains_key(f.as_str()))
        .cloned()
        .or_else(|| detect_x_key(row, chart_type));

    let y_key = config
        .y_field
        .as_ref()
        .filter(|f| row.contains_key(f.as_str()))
        .cloned()
        .or_else(|| detect_y_key(row, chart_type));

    log::debug!(
        "resolved axes for {:?}: x={:?} y={:?}",
        chart_type,
        x_key,
        y_key
    );
    AxisBinding { x_key, y_key }
}

fn detect_x_key(row: &Row, chart_type: ChartType) -> Option<String> {
    let candidates: &[&str] = match chart_type {
        ChartType::Pie => &["name", "label"],
        ChartType::Bar => &["x", "name", "category"],
        ChartType::Line | ChartType::Area | ChartType::Scatter => &["x", "date"],
    };
    probe(row, candidates).or_else(|| nth_key(row, 0))
}

fn detect_y_key(row: &Row, chart_type: ChartType) -> Option<String> {
    let candidates: &[&str] = match chart_type {
        ChartType::Pie => &["value"],
        ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Scatter => &["y", "value"],
    };
    let positional = match chart_type {
        // Pie falls all the way back to the first key when there is no
        // second; other types leave y unresolved.
        ChartType::Pie => nth_key(row, 1).or_else(|| nth_key(row, 0)),
        _ => nth_key(row, 1),
    };
    probe(row, candidates).or(positional)
}

fn probe(row: &Row, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|c| row.contains_key(**c))
        .map(|c| c.to_string())
}

fn nth_key(row: &Row, n: usize) -> Option<String> {
    row.keys().nth(n).cloned()
}

/// The y columns to plot for a single-series chart. Explicit `y_fields`
/// win; otherwise the sample row is scanned for numeric keys (excluding
/// the x key and `category`/`label`) and the first two form a dual-Y pair.
/// Fewer than two candidates means no multi-Y axis.
pub fn multi_y_fields(sample: Option<&Row>, x_key: &str, config: &SeriesConfig) -> Vec<String> {
    if !config.y_fields.is_empty() {
        return config.y_fields.clone();
    }
    let row = match sample {
        Some(r) => r,
        None => return Vec::new(),
    };
    let numeric: Vec<String> = row
        .iter()
        .filter(|(k, v)| {
            k.as_str() != x_key
                && k.as_str() != "category"
                && k.as_str() != "label"
                && value_as_f64(v).is_some()
        })
        .map(|(k, _)| k.clone())
        .collect();
    if numeric.len() >= 2 {
        numeric.into_iter().take(2).collect()
    } else {
        Vec::new()
    }
}
