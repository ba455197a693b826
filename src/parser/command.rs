// Data transformation commands: filter, sort, group

use super::ast::{GroupCommand, SortCommand};
use super::lexer::{cell_value, word, ws};
use crate::config::{Aggregation, SortOrder};
use crate::data::Value;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map_res, opt},
    multi::separated_list0,
    sequence::{preceded, separated_pair},
    IResult,
};

/// Parse a filter command
/// Format: filter(region: "North", year: 2024)
pub fn parse_filter(input: &str) -> IResult<&str, Vec<(String, Value)>> {
    let (input, _) = ws(tag("filter"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, filters) = separated_list0(
        ws(char(',')),
        separated_pair(ws(word), char(':'), ws(cell_value)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, filters))
}

/// Parse a sort command
/// Format: sort(by: col) or sort(by: col, order: "desc")
pub fn parse_sort(input: &str) -> IResult<&str, SortCommand> {
    let (input, _) = ws(tag("sort"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, _) = ws(tag("by:"))(input)?;
    let (input, field) = ws(word)(input)?;

    let (input, order) = opt(preceded(
        ws(char(',')),
        preceded(
            ws(tag("order:")),
            ws(map_res(word, |s| s.parse::<SortOrder>())),
        ),
    ))(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        SortCommand { field, order },
    ))
}

/// Parse a group command
/// Format: group(by: col) or group(by: col, agg: "sum")
pub fn parse_group(input: &str) -> IResult<&str, GroupCommand> {
    let (input, _) = ws(tag("group"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, _) = ws(tag("by:"))(input)?;
    let (input, field) = ws(word)(input)?;

    let (input, aggregation) = opt(preceded(
        ws(char(',')),
        preceded(
            ws(alt((tag("agg:"), tag("aggregation:")))),
            ws(map_res(word, |s| s.parse::<Aggregation>())),
        ),
    ))(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        GroupCommand { field, aggregation },
    ))
}
