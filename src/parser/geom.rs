// Chart command parser: chart type plus style properties

use super::ast::ChartCommand;
use super::lexer::{identifier, property_value, ws};
use crate::mapping::ChartType;
use nom::{
    character::complete::char,
    combinator::map_res,
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};

/// Parse a chart command
/// Format: scatter() or bar(barColor: "#f00", barOpacity: 0.5, showValues: true)
///
/// Property names are checked later against the style schema, so any
/// identifier is accepted here.
pub fn parse_chart(input: &str) -> IResult<&str, ChartCommand> {
    let (input, chart_type) = ws(map_res(identifier, |name| name.parse::<ChartType>()))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, properties) = separated_list0(
        ws(char(',')),
        separated_pair(ws(identifier), char(':'), ws(property_value)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        ChartCommand {
            chart_type,
            properties,
        },
    ))
}
