// Pipeline parser for the chart DSL

use super::ast::{merge_filter, ChartSpec, Command};
use super::command::parse_command;
use super::lexer::ws;
use nom::{
    bytes::complete::tag,
    combinator::eof,
    error::{Error, ErrorKind},
    multi::separated_list0,
    IResult,
};

/// Parse a complete chart specification
/// Format: chart(...) | command | command | ...
///
/// Exactly one chart command is required; it may appear anywhere in the
/// pipeline. Later legend/agg/title commands override earlier ones, and
/// repeated filters on the same column union their values.
pub fn parse_chart_spec(input: &str) -> IResult<&str, ChartSpec> {
    let (input, commands) = separated_list0(ws(tag("|")), parse_command)(input)?;
    let (input, _) = ws(eof)(input)?;

    let mut spec: Option<ChartSpec> = None;
    let mut legend = None;
    let mut measures = Vec::new();
    let mut filters = Vec::new();
    let mut agg = None;
    let mut title = None;

    for command in commands {
        match command {
            Command::Chart { chart_type, x, y } => {
                if spec.is_some() {
                    // A second chart command is ambiguous.
                    return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
                }
                let mut s = ChartSpec::new(chart_type);
                s.config.x_field = x;
                s.config.y_field = y;
                spec = Some(s);
            }
            Command::Legend(column) => legend = Some(column),
            Command::Measures(columns) => measures = columns,
            Command::Filter { column, values } => filters.push((column, values)),
            Command::Agg(a) => agg = Some(a),
            Command::Title(t) => title = Some(t),
        }
    }

    let mut spec = match spec {
        Some(s) => s,
        None => return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    };

    spec.config.legend_field = legend;
    spec.config.y_fields = measures;
    for (column, values) in filters {
        merge_filter(&mut spec.config.filters, column, values);
    }
    if let Some(a) = agg {
        spec.aggregation = a;
    }
    spec.title = title;

    Ok((input, spec))
}
