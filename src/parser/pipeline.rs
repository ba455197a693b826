// Pipeline parser for the chart DSL

use super::aesthetics::parse_aesthetics;
use super::ast::{ChartCommand, ChartRequest, GroupCommand, SortCommand};
use super::command::{parse_filter, parse_group, parse_sort};
use super::geom::parse_chart;
use super::titles::parse_labs;
use super::lexer::ws;
use crate::data::Value;
use crate::mapping::{Channel, Mapping};
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map, opt},
    error::{Error, ErrorKind},
    multi::separated_list0,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Aes(Mapping),
    Chart(ChartCommand),
    Filter(Vec<(String, Value)>),
    Sort(SortCommand),
    Group(GroupCommand),
    Titles(Vec<(&'static str, String)>),
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    // Keyword commands first; anything else must name a chart type
    alt((
        map(parse_aesthetics, PipelineComponent::Aes),
        map(parse_filter, PipelineComponent::Filter),
        map(parse_sort, PipelineComponent::Sort),
        map(parse_group, PipelineComponent::Group),
        map(parse_labs, PipelineComponent::Titles),
        map(parse_chart, PipelineComponent::Chart),
    ))(input)
}

/// Parse a complete chart request
/// Format: component | component | ...
///
/// Exactly one chart command is required. Later `aes` entries override
/// earlier ones channel by channel; filters and titles accumulate.
pub fn parse_chart_request(input: &str) -> IResult<&str, ChartRequest> {
    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, components) = separated_list0(ws(tag("|")), parse_pipeline_component)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut mapping = Mapping::default();
    let mut charts = Vec::new();
    let mut filters = Vec::new();
    let mut sort = None;
    let mut group = None;
    let mut titles = Vec::new();

    for comp in components {
        match comp {
            PipelineComponent::Aes(m) => {
                for (channel, field) in m.assigned() {
                    mapping.set(channel, Some(field.to_string()));
                }
            }
            PipelineComponent::Chart(c) => charts.push(c),
            PipelineComponent::Filter(f) => filters.extend(f),
            PipelineComponent::Sort(s) => sort = Some(s),
            PipelineComponent::Group(g) => group = Some(g),
            PipelineComponent::Titles(t) => titles.extend(t),
        }
    }

    // Validation: exactly one chart command
    if charts.len() != 1 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    let chart = charts.remove(0);

    Ok((
        input,
        ChartRequest {
            mapping,
            chart,
            filters,
            sort,
            group,
            titles,
        },
    ))
}

/// Channels assigned by the request, for diagnostics
pub fn mapped_channels(request: &ChartRequest) -> Vec<Channel> {
    request.mapping.assigned().map(|(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Aggregation, ChartConfig, SortOrder};
    use crate::mapping::ChartType;

    #[test]
    fn test_parse_aes_and_chart() {
        let (_, req) = parse_chart_request("aes(x: time, y: temp) | line()").unwrap();
        assert_eq!(req.chart.chart_type, ChartType::Line);
        assert_eq!(req.mapping.get(Channel::X), Some("time"));
        assert_eq!(mapped_channels(&req), vec![Channel::X, Channel::Y]);
    }

    #[test]
    fn test_parse_full_pipeline() {
        let input = r##"aes(x: region, y: sales, color: region)
            | bar(barColor: "#f00", showValues: true)
            | filter(year: 2024)
            | sort(by: sales, order: "desc")
            | group(by: region, agg: "sum")
            | labs(title: "Sales by region")"##;
        let (rest, req) = parse_chart_request(input).unwrap();
        assert_eq!(rest, "");
        assert_eq!(req.chart.chart_type, ChartType::Bar);
        assert_eq!(req.filters, vec![("year".to_string(), Value::Number(2024.0))]);

        let config = req.apply_to(&ChartConfig::default()).unwrap();
        assert_eq!(config.bar_color(), "#f00");
        assert!(config.show_values());
        assert_eq!(config.transform.sort_order(), SortOrder::Desc);
        assert_eq!(config.transform.group_by(), Some("region"));
        assert_eq!(config.transform.aggregation(), Aggregation::Sum);
        assert_eq!(config.title(), Some("Sales by region"));
    }

    #[test]
    fn test_chart_only() {
        let (_, req) = parse_chart_request("histogram()").unwrap();
        assert_eq!(req.chart.chart_type, ChartType::Histogram);
        assert_eq!(req.mapping, Mapping::default());
    }

    #[test]
    fn test_later_aes_and_titles_merge() {
        let input = r#"aes(x: a, y: b) | aes(y: c) | scatter() | labs(title: "T") | labs(x: "X")"#;
        let (_, req) = parse_chart_request(input).unwrap();
        assert_eq!(req.mapping.get(Channel::X), Some("a"));
        assert_eq!(req.mapping.get(Channel::Y), Some("c"));
        let config = req.apply_to(&ChartConfig::default()).unwrap();
        assert_eq!(config.title(), Some("T"));
        assert_eq!(config.x_axis_title(), Some("X"));
    }

    #[test]
    fn test_requires_one_chart() {
        assert!(parse_chart_request("aes(x: a, y: b)").is_err());
        assert!(parse_chart_request("line() | bar()").is_err());
        assert!(parse_chart_request("").is_err());
    }

    #[test]
    fn test_trailing_garbage_fails() {
        assert!(parse_chart_request("scatter() | nonsense").is_err());
        assert!(parse_chart_request("scatter() extra").is_err());
    }
}
