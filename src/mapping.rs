//! Channels, field mappings, chart types, and the mapping validator.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A visual role a field can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Color,
    Size,
    Opacity,
    Shape,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::X,
        Channel::Y,
        Channel::Color,
        Channel::Size,
        Channel::Opacity,
        Channel::Shape,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Size => "size",
            Channel::Opacity => "opacity",
            Channel::Shape => "shape",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| anyhow!("Unknown channel '{}' (expected one of x, y, color, size, opacity, shape)", s))
    }
}

/// Partial assignment of channels to field names.
///
/// Field names are not checked against the table here; an empty name counts
/// as unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

impl Mapping {
    fn slot(&self, channel: Channel) -> &Option<String> {
        match channel {
            Channel::X => &self.x,
            Channel::Y => &self.y,
            Channel::Color => &self.color,
            Channel::Size => &self.size,
            Channel::Opacity => &self.opacity,
            Channel::Shape => &self.shape,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<String> {
        match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Color => &mut self.color,
            Channel::Size => &mut self.size,
            Channel::Opacity => &mut self.opacity,
            Channel::Shape => &mut self.shape,
        }
    }

    /// Field assigned to `channel`, if any and non-empty.
    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.slot(channel).as_deref().filter(|f| !f.is_empty())
    }

    /// Assign or clear a channel. Empty names clear it.
    pub fn set(&mut self, channel: Channel, field: Option<String>) {
        *self.slot_mut(channel) = field.filter(|f| !f.is_empty());
    }

    pub fn with(mut self, channel: Channel, field: impl Into<String>) -> Self {
        self.set(channel, Some(field.into()));
        self
    }

    /// Assigned channels in canonical order.
    pub fn assigned(&self) -> impl Iterator<Item = (Channel, &str)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|f| (c, f)))
    }
}

/// Chart families the compiler knows how to build.
///
/// `Unknown` stands for any other name read back from stored state; it gets
/// the default channel rules and a point mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Scatter,
    Line,
    Bar,
    Area,
    Histogram,
    Box,
    Heatmap,
    #[serde(other)]
    Unknown,
}

impl ChartType {
    pub const KNOWN: [ChartType; 7] = [
        ChartType::Scatter,
        ChartType::Line,
        ChartType::Bar,
        ChartType::Area,
        ChartType::Histogram,
        ChartType::Box,
        ChartType::Heatmap,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartType::Scatter => "scatter",
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
            ChartType::Histogram => "histogram",
            ChartType::Box => "box",
            ChartType::Heatmap => "heatmap",
            ChartType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ChartType::KNOWN
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| anyhow!("Unknown chart type '{}'", s))
    }
}

/// Channels that must be mapped before a chart of this type is complete.
pub fn required_channels(chart_type: ChartType) -> &'static [Channel] {
    use Channel::*;
    match chart_type {
        ChartType::Box => &[Y],
        _ => &[X, Y],
    }
}

/// Channels a chart of this type may additionally use.
pub fn optional_channels(chart_type: ChartType) -> &'static [Channel] {
    use Channel::*;
    match chart_type {
        ChartType::Scatter => &[Color, Size, Opacity, Shape],
        ChartType::Line | ChartType::Bar | ChartType::Area | ChartType::Histogram => &[Color, Opacity],
        ChartType::Box => &[X, Color],
        ChartType::Heatmap | ChartType::Unknown => &[Color],
    }
}

/// Required channels still unassigned, in canonical order.
pub fn missing_channels(mapping: &Mapping, chart_type: ChartType) -> Vec<Channel> {
    required_channels(chart_type)
        .iter()
        .copied()
        .filter(|c| mapping.get(*c).is_none())
        .collect()
}

/// Every required channel has a non-empty field. Optional channels never matter.
pub fn is_complete(mapping: &Mapping, chart_type: ChartType) -> bool {
    missing_channels(mapping, chart_type).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ChartType::Scatter, &[Channel::X, Channel::Y], &[Channel::Color, Channel::Size, Channel::Opacity, Channel::Shape])]
    #[case(ChartType::Line, &[Channel::X, Channel::Y], &[Channel::Color, Channel::Opacity])]
    #[case(ChartType::Bar, &[Channel::X, Channel::Y], &[Channel::Color, Channel::Opacity])]
    #[case(ChartType::Area, &[Channel::X, Channel::Y], &[Channel::Color, Channel::Opacity])]
    #[case(ChartType::Histogram, &[Channel::X, Channel::Y], &[Channel::Color, Channel::Opacity])]
    #[case(ChartType::Box, &[Channel::Y], &[Channel::X, Channel::Color])]
    #[case(ChartType::Heatmap, &[Channel::X, Channel::Y], &[Channel::Color])]
    #[case(ChartType::Unknown, &[Channel::X, Channel::Y], &[Channel::Color])]
    fn test_channel_table(
        #[case] chart: ChartType,
        #[case] required: &[Channel],
        #[case] optional: &[Channel],
    ) {
        assert_eq!(required_channels(chart), required);
        assert_eq!(optional_channels(chart), optional);
    }

    #[test]
    fn test_box_complete_without_x() {
        let mapping = Mapping::default().with(Channel::Y, "f1");
        assert!(is_complete(&mapping, ChartType::Box));
    }

    #[test]
    fn test_scatter_incomplete_without_y() {
        let mapping = Mapping::default().with(Channel::X, "f1");
        assert!(!is_complete(&mapping, ChartType::Scatter));
        assert_eq!(missing_channels(&mapping, ChartType::Scatter), vec![Channel::Y]);
    }

    #[test]
    fn test_optional_channels_do_not_affect_completeness() {
        let mapping = Mapping::default()
            .with(Channel::X, "a")
            .with(Channel::Y, "b");
        assert!(is_complete(&mapping, ChartType::Scatter));
        let with_color = mapping.clone().with(Channel::Color, "c");
        assert!(is_complete(&with_color, ChartType::Scatter));
    }

    #[test]
    fn test_empty_field_name_is_unassigned() {
        let mapping = Mapping {
            x: Some(String::new()),
            y: Some("b".to_string()),
            ..Default::default()
        };
        assert_eq!(mapping.get(Channel::X), None);
        assert!(!is_complete(&mapping, ChartType::Line));
    }

    #[test]
    fn test_unknown_chart_name_deserializes() {
        let chart: ChartType = serde_json::from_str("\"pie\"").unwrap();
        assert_eq!(chart, ChartType::Unknown);
        assert!("pie".parse::<ChartType>().is_err());
        assert_eq!("heatmap".parse::<ChartType>().unwrap(), ChartType::Heatmap);
    }

    #[test]
    fn test_mapping_serializes_only_assigned() {
        let mapping = Mapping::default().with(Channel::X, "a");
        assert_eq!(serde_json::to_string(&mapping).unwrap(), r#"{"x":"a"}"#);
        let assigned: Vec<_> = mapping.assigned().collect();
        assert_eq!(assigned, vec![(Channel::X, "a")]);
    }
}
