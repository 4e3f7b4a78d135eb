// AST for the chart DSL

use crate::inspect::{ChartType, SeriesConfig};
use crate::pivot::Aggregation;
use std::collections::HashMap;

/// One pipeline command, as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Chart {
        chart_type: ChartType,
        x: Option<String>,
        y: Option<String>,
    },
    Legend(String),
    Measures(Vec<String>),
    Filter {
        column: String,
        values: Vec<String>,
    },
    Agg(Aggregation),
    Title(String),
}

/// Fully assembled chart specification: the pipeline's commands folded
/// into one series configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub config: SeriesConfig,
    pub aggregation: Aggregation,
    pub title: Option<String>,
}

impl ChartSpec {
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            chart_type,
            config: SeriesConfig::default(),
            aggregation: Aggregation::default(),
            title: None,
        }
    }
}

/// Union filter values per column; repeated filter commands on the same
/// column extend its allow-list without duplicates.
pub fn merge_filter(
    filters: &mut HashMap<String, Vec<String>>,
    column: String,
    values: Vec<String>,
) {
    let entry = filters.entry(column).or_default();
    for value in values {
        if !entry.contains(&value) {
            entry.push(value);
        }
    }
}
