// Command parsers for the chart DSL

use super::ast::Command;
use super::lexer::{identifier, string_literal, value_token, ws};
use crate::inspect::ChartType;
use crate::pivot::Aggregation;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map_opt, opt},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

fn chart_type(input: &str) -> IResult<&str, ChartType> {
    map_opt(identifier, |name| ChartType::parse(&name))(input)
}

fn aggregation(input: &str) -> IResult<&str, Aggregation> {
    map_opt(identifier, |name| Aggregation::parse(&name))(input)
}

/// Parse a chart command
/// Format: chart(type: line) or chart(type: bar, x: year, y: volume)
pub fn parse_chart(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("chart"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, ct) = preceded(ws(tag("type:")), ws(chart_type))(input)?;

    let (input, x) = opt(preceded(
        ws(char(',')),
        preceded(ws(tag("x:")), ws(identifier)),
    ))(input)?;

    let (input, y) = opt(preceded(
        ws(char(',')),
        preceded(ws(tag("y:")), ws(identifier)),
    ))(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Chart { chart_type: ct, x, y }))
}

/// Parse a legend command
/// Format: legend(region)
pub fn parse_legend(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("legend"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, column) = ws(identifier)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Legend(column)))
}

/// Parse a measures command selecting explicit y columns
/// Format: measures(volume, revenue)
pub fn parse_measures(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("measures"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, columns) = separated_list1(ws(char(',')), ws(identifier))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Measures(columns)))
}

/// Parse a filter command
/// Format: filter(region: "East", West)
pub fn parse_filter(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("filter"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, column) = ws(identifier)(input)?;
    let (input, _) = ws(char(':'))(input)?;
    let (input, values) = separated_list1(ws(char(',')), ws(value_token))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Filter { column, values }))
}

/// Parse an aggregation command
/// Format: agg(sum)
pub fn parse_agg(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("agg"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, agg) = ws(aggregation)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Agg(agg)))
}

/// Parse a title command
/// Format: title("Sales by Region")
pub fn parse_title(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("title"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, text) = ws(string_literal)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, Command::Title(text)))
}

/// Parse any command
pub fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_chart,
        parse_legend,
        parse_measures,
        parse_filter,
        parse_agg,
        parse_title,
    ))(input)
}
