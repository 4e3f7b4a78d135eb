use crate::inspect::{multi_y_fields, resolve_axes, ChartType, SeriesConfig};
use crate::pie::{aggregate_pie, PieSlice};
use crate::pivot::{pivot_by_legend, Aggregation};
use crate::remap::{needs_remap, remap_rows};
use crate::rows::{apply_filters, Row};
use anyhow::Result;
use serde::Serialize;

/// Everything a chart card needs to re-derive its renderable state. Every
/// transition is a synchronous re-evaluation of these inputs; there is no
/// internal timer- or event-driven machinery.
#[derive(Debug, Clone)]
pub struct ChartInput<'a> {
    pub rows: Option<&'a [Row]>,
    pub loading: bool,
    pub chart_type: ChartType,
    pub config: &'a SeriesConfig,
    pub aggregation: Aggregation,
}

/// Renderable chart state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChartState {
    /// No rows at all: render an empty placeholder.
    NoData,
    /// The x or y key could not be resolved: render a "select axes"
    /// placeholder.
    NeedsConfig,
    /// A fetch is in flight; no stale data is carried underneath.
    Loading,
    SingleSeries {
        x_key: String,
        y_keys: Vec<String>,
        rows: Vec<Row>,
    },
    MultiSeries {
        x_key: String,
        series: Vec<String>,
        rows: Vec<Row>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    /// A failure while computing derived data, contained at this boundary
    /// so it can never unmount sibling cards.
    Error {
        message: String,
    },
}

/// Evaluate the chart state machine against the latest inputs. Errors in
/// the data pipeline are converted into an inline `Error` state here and
/// never propagate.
pub fn evaluate(input: &ChartInput) -> ChartState {
    match evaluate_inner(input) {
        Ok(state) => state,
        Err(e) => {
            log::debug!("chart evaluation failed: {:#}", e);
            ChartState::Error {
                message: format!("Error rendering chart: {:#}", e),
            }
        }
    }
}

fn evaluate_inner(input: &ChartInput) -> Result<ChartState> {
    if input.loading {
        return Ok(ChartState::Loading);
    }

    let rows = match input.rows {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(ChartState::NoData),
    };

    let rows = apply_filters(rows.to_vec(), &input.config.filters);
    if rows.is_empty() {
        return Ok(ChartState::NoData);
    }

    let sample = rows.first().cloned();
    let (rows, x_key, y_key) = match bind_axes(rows, sample.as_ref(), input) {
        Some(bound) => bound,
        None => return Ok(ChartState::NeedsConfig),
    };

    if input.chart_type == ChartType::Pie {
        let slices = aggregate_pie(&rows, &x_key, &y_key);
        return Ok(ChartState::Pie { slices });
    }

    if let Some(legend) = &input.config.legend_field {
        let result = pivot_by_legend(&rows, &x_key, &y_key, legend, input.aggregation);
        if !result.unique_values.is_empty() {
            return Ok(ChartState::MultiSeries {
                x_key,
                series: result.unique_values,
                rows: result.pivoted,
            });
        }
        // Legend produced zero series: fall through to a single series.
    }

    let detected = multi_y_fields(rows.first(), &x_key, input.config);
    let y_keys = if detected.is_empty() { vec![y_key] } else { detected };

    Ok(ChartState::SingleSeries { x_key, y_keys, rows })
}

/// Resolve the working rows and axis keys: remap generic placeholder keys
/// onto the configured field names when applicable, otherwise run the
/// inspector heuristics. Returns None when neither axis can be resolved,
/// which the caller renders as `NeedsConfig`.
fn bind_axes(
    rows: Vec<Row>,
    sample: Option<&Row>,
    input: &ChartInput,
) -> Option<(Vec<Row>, String, String)> {
    if let (Some(xf), Some(yf), Some(sample_row)) =
        (&input.config.x_field, &input.config.y_field, sample)
    {
        if !sample_row.is_empty() && needs_remap(sample_row, xf) {
            let remapped = remap_rows(&rows, xf, yf, input.config.legend_field.as_deref());
            return Some((remapped, xf.clone(), yf.clone()));
        }
    }

    let axes = resolve_axes(sample, input.chart_type, input.config);
    match (axes.x_key, axes.y_key) {
        (Some(x), Some(y)) => Some((rows, x, y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::rows_from_json;
    use serde_json::json;
    use std::collections::HashMap;

    fn input<'a>(
        rows: Option<&'a [Row]>,
        chart_type: ChartType,
        config: &'a SeriesConfig,
    ) -> ChartInput<'a> {
        ChartInput {
            rows,
            loading: false,
            chart_type,
            config,
            aggregation: Aggregation::Last,
        }
    }

    #[test]
    fn test_loading_state_wins() {
        let rows = rows_from_json(&json!([{"x": 1, "y": 2}])).unwrap();
        let config = SeriesConfig::default();
        let mut i = input(Some(&rows), ChartType::Line, &config);
        i.loading = true;
        assert_eq!(evaluate(&i), ChartState::Loading);
    }

    #[test]
    fn test_no_data() {
        let config = SeriesConfig::default();
        assert_eq!(
            evaluate(&input(None, ChartType::Line, &config)),
            ChartState::NoData
        );
        assert_eq!(
            evaluate(&input(Some(&[]), ChartType::Line, &config)),
            ChartState::NoData
        );
    }

    #[test]
    fn test_empty_rows_need_config() {
        let rows = vec![Row::new()];
        let config = SeriesConfig::default();
        assert_eq!(
            evaluate(&input(Some(&rows), ChartType::Line, &config)),
            ChartState::NeedsConfig
        );
    }

    #[test]
    fn test_single_series() {
        let rows = rows_from_json(&json!([
            {"x": 1, "y": 10},
            {"x": 2, "y": 20}
        ]))
        .unwrap();
        let config = SeriesConfig::default();
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::SingleSeries { x_key, y_keys, rows } => {
                assert_eq!(x_key, "x");
                assert_eq!(y_keys, vec!["y".to_string()]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("Expected SingleSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_single_series_dual_y_detection() {
        let rows = rows_from_json(&json!([
            {"x": 1, "volume": 10, "revenue": 4.5}
        ]))
        .unwrap();
        let config = SeriesConfig::default();
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::SingleSeries { y_keys, .. } => {
                assert_eq!(y_keys, vec!["volume".to_string(), "revenue".to_string()]);
            }
            other => panic!("Expected SingleSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_series_legend() {
        let rows = rows_from_json(&json!([
            {"x": 1, "region": "East", "y": 5},
            {"x": 1, "region": "West", "y": 3},
            {"x": 2, "region": "East", "y": 7}
        ]))
        .unwrap();
        let config = SeriesConfig {
            legend_field: Some("region".to_string()),
            ..Default::default()
        };
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::MultiSeries { x_key, series, rows } => {
                assert_eq!(x_key, "x");
                assert_eq!(series, vec!["East".to_string(), "West".to_string()]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0]["East"], json!(5));
                assert_eq!(rows[0]["West"], json!(3));
            }
            other => panic!("Expected MultiSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_legend_with_zero_series_falls_back_to_single() {
        // The legend column never appears, so pivot finds no unique values.
        let rows = rows_from_json(&json!([{"x": 1, "y": 5}])).unwrap();
        let config = SeriesConfig {
            legend_field: Some("region".to_string()),
            ..Default::default()
        };
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::SingleSeries { y_keys, .. } => {
                assert_eq!(y_keys, vec!["y".to_string()]);
            }
            other => panic!("Expected SingleSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_pie_scenario() {
        // chart type pie_chart, duplicate names collapse by summation.
        let rows = rows_from_json(&json!([
            {"name": "A", "value": 1},
            {"name": "A", "value": 2}
        ]))
        .unwrap();
        let config = SeriesConfig::default();
        match evaluate(&input(Some(&rows), ChartType::Pie, &config)) {
            ChartState::Pie { slices } => {
                assert_eq!(slices.len(), 1);
                assert_eq!(slices[0].name, "A");
                assert_eq!(slices[0].value, 3.0);
            }
            other => panic!("Expected Pie, got {:?}", other),
        }
    }

    #[test]
    fn test_filters_applied_before_shaping() {
        let rows = rows_from_json(&json!([
            {"x": 1, "region": "East", "y": 5},
            {"x": 1, "region": "West", "y": 3}
        ]))
        .unwrap();
        let mut filters = HashMap::new();
        filters.insert("region".to_string(), vec!["East".to_string()]);
        let config = SeriesConfig {
            legend_field: Some("region".to_string()),
            filters,
            ..Default::default()
        };
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::MultiSeries { series, .. } => {
                assert_eq!(series, vec!["East".to_string()]);
            }
            other => panic!("Expected MultiSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_filters_excluding_everything_is_no_data() {
        let rows = rows_from_json(&json!([{"x": 1, "region": "East", "y": 5}])).unwrap();
        let mut filters = HashMap::new();
        filters.insert("region".to_string(), vec!["North".to_string()]);
        let config = SeriesConfig {
            filters,
            ..Default::default()
        };
        assert_eq!(
            evaluate(&input(Some(&rows), ChartType::Line, &config)),
            ChartState::NoData
        );
    }

    #[test]
    fn test_generic_rows_remapped_to_configured_fields() {
        let rows = rows_from_json(&json!([{"x": "2020", "y": 10}])).unwrap();
        let config = SeriesConfig {
            x_field: Some("year".to_string()),
            y_field: Some("revenue".to_string()),
            ..Default::default()
        };
        match evaluate(&input(Some(&rows), ChartType::Line, &config)) {
            ChartState::SingleSeries { x_key, y_keys, rows } => {
                assert_eq!(x_key, "year");
                assert_eq!(y_keys, vec!["revenue".to_string()]);
                assert_eq!(rows[0]["year"], json!("2020"));
                assert_eq!(rows[0]["revenue"], json!(10));
            }
            other => panic!("Expected SingleSeries, got {:?}", other),
        }
    }
}
