// Token-level parsers shared by the chart DSL commands

use crate::config::PropertyValue;
use crate::data::Value;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize, value, verify},
    multi::many0_count,
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare identifier: letters, digits, `_` and `.`, not starting with a digit
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_"), tag(".")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Double-quoted string, no escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

/// Finite numbers only; `nan`, `inf` and overflowing literals are rejected
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    verify(double, |n: &f64| n.is_finite())(input)
}

pub fn bool_literal(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

/// Field name or enum word: quoted for names with spaces, bare otherwise
pub fn word(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

/// Style property value: boolean, number or string
pub fn property_value(input: &str) -> IResult<&str, PropertyValue> {
    alt((
        map(bool_literal, PropertyValue::Bool),
        map(number_literal, PropertyValue::Number),
        map(string_literal, PropertyValue::Text),
    ))(input)
}

/// Filter value: names and quoted strings are text, bare numbers stay numeric
pub fn cell_value(input: &str) -> IResult<&str, Value> {
    alt((
        map(word, Value::Text),
        map(number_literal, Value::Number),
    ))(input)
}
