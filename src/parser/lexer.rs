// Shared lexical helpers for the chart DSL

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace.
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier: starts with a letter or underscore, continues with
/// letters, digits, or underscores.
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        str::to_string,
    )(input)
}

/// Parse a double-quoted string literal (no escape sequences).
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        str::to_string,
    )(input)
}

/// Parse a bare value token: letters, digits, underscores, dots, dashes.
/// Covers unquoted filter values like `2020` or `us-east`.
pub fn bare_token(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.' || c == '-'),
        str::to_string,
    )(input)
}

/// A filter value: quoted string or bare token.
pub fn value_token(input: &str) -> IResult<&str, String> {
    alt((string_literal, bare_token))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("year_col rest"), Ok((" rest", "year_col".to_string())));
        assert!(identifier("9abc").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""hello world""#), Ok(("", "hello world".to_string())));
        assert!(string_literal(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_value_token_bare() {
        assert_eq!(value_token("2020,"), Ok((",", "2020".to_string())));
        assert_eq!(value_token("us-east)"), Ok((")", "us-east".to_string())));
    }

    #[test]
    fn test_ws_strips_both_sides() {
        let mut parser = ws(tag("|"));
        assert_eq!(parser("  |  x"), Ok(("x", "|")));
    }
}
