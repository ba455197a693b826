// Title command parser

use super::lexer::{identifier, string_literal, ws};
use nom::{
    bytes::complete::tag,
    character::complete::char,
    combinator::map_res,
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};

/// Chart property id set by a `labs` key. Full property ids are accepted too.
fn title_property(key: &str) -> Result<&'static str, String> {
    match key {
        "title" => Ok("title"),
        "x" | "xAxisTitle" => Ok("xAxisTitle"),
        "y" | "yAxisTitle" => Ok("yAxisTitle"),
        other => Err(format!("labs() has no '{}' title", other)),
    }
}

/// Parse a title command into `(property id, text)` pairs in source order
/// Format: labs(title: "...", x: "...", y: "...")
pub fn parse_labs(input: &str) -> IResult<&str, Vec<(&'static str, String)>> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, titles) = separated_list0(
        ws(char(',')),
        separated_pair(ws(map_res(identifier, |key: String| title_property(&key))), char(':'), ws(string_literal)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;
    Ok((input, titles))
}
