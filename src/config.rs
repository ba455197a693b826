//! Chart style and transformation configuration.
//!
//! Every documented option is an explicit `Option` field; the accessor methods
//! carry the fallback used when the option is unset. Options that do not apply
//! to the current chart type are simply not read, so they survive switching
//! chart types back and forth.

use crate::data::Value;
use crate::mapping::ChartType;
use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_POINT_SIZE: f64 = 100.0;
pub const DEFAULT_POINT_OPACITY: f64 = 0.7;
pub const DEFAULT_POINT_SHAPE: &str = "circle";
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;
pub const DEFAULT_MARK_COLOR: &str = "#3b82f6";
pub const DEFAULT_INTERPOLATION: &str = "linear";
pub const DEFAULT_BAR_OPACITY: f64 = 0.8;
pub const DEFAULT_BAR_CORNER_RADIUS: f64 = 0.0;
pub const DEFAULT_AREA_OPACITY: f64 = 0.6;

// Starting values the editor shows for a fresh chart. They differ from the
// compiler fallbacks above for these three properties.
const EDITOR_POINT_SIZE: f64 = 50.0;
const EDITOR_POINT_OPACITY: f64 = 0.8;
const EDITOR_AREA_OPACITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(anyhow!("Unknown sort order '{}' (expected \"asc\" or \"desc\")", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    #[default]
    Count,
    Avg,
    Min,
    Max,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Sum => "sum",
            Aggregation::Count => "count",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        };
        f.write_str(name)
    }
}

impl FromStr for Aggregation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(Aggregation::Sum),
            "count" => Ok(Aggregation::Count),
            "avg" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(anyhow!("Unknown aggregation '{}'", other)),
        }
    }
}

/// Filter, sort and group settings applied to the rows before encoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filters: IndexMap<String, Value>,
}

impl TransformConfig {
    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref().filter(|s| !s.is_empty())
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref().filter(|s| !s.is_empty())
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation.unwrap_or_default()
    }

    /// Whether any stage would change the rows.
    pub fn is_identity(&self) -> bool {
        self.sort_field().is_none()
            && self.group_by().is_none()
            && self.filters.values().all(Value::is_blank)
    }
}

/// Style options chosen in the graphic editor plus the transform settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_points: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_values: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,

    #[serde(flatten)]
    pub transform: TransformConfig,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl ChartConfig {
    pub fn point_size(&self) -> f64 {
        self.point_size.unwrap_or(DEFAULT_POINT_SIZE)
    }

    pub fn point_opacity(&self) -> f64 {
        self.point_opacity.unwrap_or(DEFAULT_POINT_OPACITY)
    }

    pub fn point_shape(&self) -> &str {
        non_empty(&self.point_shape).unwrap_or(DEFAULT_POINT_SHAPE)
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid.unwrap_or(true)
    }

    pub fn line_width(&self) -> f64 {
        self.line_width.unwrap_or(DEFAULT_LINE_WIDTH)
    }

    pub fn line_color(&self) -> &str {
        non_empty(&self.line_color).unwrap_or(DEFAULT_MARK_COLOR)
    }

    pub fn show_points(&self) -> bool {
        self.show_points.unwrap_or(false)
    }

    pub fn interpolation(&self) -> &str {
        non_empty(&self.interpolation).unwrap_or(DEFAULT_INTERPOLATION)
    }

    pub fn bar_color(&self) -> &str {
        non_empty(&self.bar_color).unwrap_or(DEFAULT_MARK_COLOR)
    }

    pub fn bar_opacity(&self) -> f64 {
        self.bar_opacity.unwrap_or(DEFAULT_BAR_OPACITY)
    }

    pub fn bar_corner_radius(&self) -> f64 {
        self.bar_corner_radius.unwrap_or(DEFAULT_BAR_CORNER_RADIUS)
    }

    pub fn show_values(&self) -> bool {
        self.show_values.unwrap_or(false)
    }

    pub fn area_opacity(&self) -> f64 {
        self.area_opacity.unwrap_or(DEFAULT_AREA_OPACITY)
    }

    pub fn area_color(&self) -> &str {
        non_empty(&self.area_color).unwrap_or(DEFAULT_MARK_COLOR)
    }

    pub fn show_line(&self) -> bool {
        self.show_line.unwrap_or(true)
    }

    pub fn x_axis_title(&self) -> Option<&str> {
        non_empty(&self.x_axis_title)
    }

    pub fn y_axis_title(&self) -> Option<&str> {
        non_empty(&self.y_axis_title)
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn show_legend(&self) -> bool {
        self.show_legend.unwrap_or(true)
    }

    /// Apply one editor property by id, checking the value against the property schema.
    pub fn set_property(&mut self, id: &str, value: PropertyValue) -> Result<()> {
        let spec = lookup_property(id).ok_or_else(|| anyhow!("Unknown chart property '{}'", id))?;
        spec.kind.check(id, &value)?;
        if !spec.kind.in_range(&value) {
            warn!(property = id, %value, "value outside the editor range");
        }

        match (id, value) {
            ("pointSize", PropertyValue::Number(v)) => self.point_size = Some(v),
            ("pointOpacity", PropertyValue::Number(v)) => self.point_opacity = Some(v),
            ("pointShape", PropertyValue::Text(v)) => self.point_shape = Some(v),
            ("showGrid", PropertyValue::Bool(v)) => self.show_grid = Some(v),
            ("lineWidth", PropertyValue::Number(v)) => self.line_width = Some(v),
            ("lineColor", PropertyValue::Text(v)) => self.line_color = Some(v),
            ("showPoints", PropertyValue::Bool(v)) => self.show_points = Some(v),
            ("interpolation", PropertyValue::Text(v)) => self.interpolation = Some(v),
            ("barColor", PropertyValue::Text(v)) => self.bar_color = Some(v),
            ("barOpacity", PropertyValue::Number(v)) => self.bar_opacity = Some(v),
            ("barCornerRadius", PropertyValue::Number(v)) => self.bar_corner_radius = Some(v),
            ("showValues", PropertyValue::Bool(v)) => self.show_values = Some(v),
            ("areaOpacity", PropertyValue::Number(v)) => self.area_opacity = Some(v),
            ("areaColor", PropertyValue::Text(v)) => self.area_color = Some(v),
            ("showLine", PropertyValue::Bool(v)) => self.show_line = Some(v),
            ("xAxisTitle", PropertyValue::Text(v)) => self.x_axis_title = Some(v),
            ("yAxisTitle", PropertyValue::Text(v)) => self.y_axis_title = Some(v),
            ("title", PropertyValue::Text(v)) => self.title = Some(v),
            ("showLegend", PropertyValue::Bool(v)) => self.show_legend = Some(v),
            (id, value) => bail!("Property '{}' cannot take value {}", id, value),
        }
        Ok(())
    }
}

// =============================================================================
// Property schema
// =============================================================================

/// A literal value supplied by an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "\"{}\"", s),
            PropertyValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Editor control for a property, serialized as `{"type": ..., ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyKind {
    /// Editor range is advisory; values outside it are accepted.
    Number { min: f64, max: f64, step: f64 },
    Color,
    Select { options: &'static [&'static str] },
    Boolean,
    Text,
}

impl PropertyKind {
    fn check(&self, id: &str, value: &PropertyValue) -> Result<()> {
        match (self, value) {
            (PropertyKind::Number { .. }, PropertyValue::Number(_)) => Ok(()),
            (PropertyKind::Color | PropertyKind::Text, PropertyValue::Text(_)) => Ok(()),
            (PropertyKind::Boolean, PropertyValue::Bool(_)) => Ok(()),
            (PropertyKind::Select { options }, PropertyValue::Text(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(())
                } else {
                    bail!("'{}' must be one of: {}", id, options.join(", "))
                }
            }
            (kind, value) => bail!("'{}' expects {}, got {}", id, kind.describe(), value),
        }
    }

    /// Whether a number lies within the editor's slider range. Non-numeric
    /// kinds have no range.
    pub fn in_range(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (PropertyKind::Number { min, max, .. }, PropertyValue::Number(v)) => (*min..=*max).contains(v),
            _ => true,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            PropertyKind::Number { .. } => "a number",
            PropertyKind::Color => "a color string",
            PropertyKind::Select { .. } => "one of a fixed set of strings",
            PropertyKind::Boolean => "true or false",
            PropertyKind::Text => "a string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyDefault {
    Number(f64),
    Str(&'static str),
    Bool(bool),
    Unset,
}

impl PropertyDefault {
    pub fn is_unset(&self) -> bool {
        matches!(self, PropertyDefault::Unset)
    }
}

/// One editable style property, as listed by `--check`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropertySpec {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(flatten)]
    pub kind: PropertyKind,
    #[serde(skip_serializing_if = "PropertyDefault::is_unset")]
    pub default: PropertyDefault,
}

const fn number(min: f64, max: f64, step: f64) -> PropertyKind {
    PropertyKind::Number { min, max, step }
}

const SCATTER_PROPERTIES: &[PropertySpec] = &[
    PropertySpec { id: "pointSize", label: "Point size", description: "Base size of the points", kind: number(10.0, 200.0, 10.0), default: PropertyDefault::Number(EDITOR_POINT_SIZE) },
    PropertySpec { id: "pointOpacity", label: "Opacity", description: "Point transparency", kind: number(0.0, 1.0, 0.1), default: PropertyDefault::Number(EDITOR_POINT_OPACITY) },
    PropertySpec { id: "pointShape", label: "Shape", description: "Point shape", kind: PropertyKind::Select { options: &["circle", "square", "triangle-up", "diamond"] }, default: PropertyDefault::Str(DEFAULT_POINT_SHAPE) },
    PropertySpec { id: "showGrid", label: "Show grid", description: "Draw grid lines", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(true) },
];

const LINE_PROPERTIES: &[PropertySpec] = &[
    PropertySpec { id: "lineWidth", label: "Line width", description: "Stroke width of the line", kind: number(1.0, 10.0, 1.0), default: PropertyDefault::Number(DEFAULT_LINE_WIDTH) },
    PropertySpec { id: "lineColor", label: "Line color", description: "Main line color", kind: PropertyKind::Color, default: PropertyDefault::Str(DEFAULT_MARK_COLOR) },
    PropertySpec { id: "showPoints", label: "Show points", description: "Overlay points on the line", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(false) },
    PropertySpec { id: "interpolation", label: "Interpolation", description: "Interpolation mode", kind: PropertyKind::Select { options: &["linear", "step", "step-before", "step-after", "basis", "cardinal", "monotone"] }, default: PropertyDefault::Str(DEFAULT_INTERPOLATION) },
];

const BAR_PROPERTIES: &[PropertySpec] = &[
    PropertySpec { id: "barColor", label: "Bar color", description: "Fill color of the bars", kind: PropertyKind::Color, default: PropertyDefault::Str(DEFAULT_MARK_COLOR) },
    PropertySpec { id: "barOpacity", label: "Opacity", description: "Bar transparency", kind: number(0.0, 1.0, 0.1), default: PropertyDefault::Number(DEFAULT_BAR_OPACITY) },
    PropertySpec { id: "barCornerRadius", label: "Corner radius", description: "Rounded corner radius", kind: number(0.0, 20.0, 1.0), default: PropertyDefault::Number(DEFAULT_BAR_CORNER_RADIUS) },
    PropertySpec { id: "showValues", label: "Show values", description: "Print values above the bars", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(false) },
];

const AREA_PROPERTIES: &[PropertySpec] = &[
    PropertySpec { id: "areaOpacity", label: "Area opacity", description: "Area transparency", kind: number(0.0, 1.0, 0.1), default: PropertyDefault::Number(EDITOR_AREA_OPACITY) },
    PropertySpec { id: "areaColor", label: "Area color", description: "Fill color of the area", kind: PropertyKind::Color, default: PropertyDefault::Str(DEFAULT_MARK_COLOR) },
    PropertySpec { id: "showLine", label: "Show line", description: "Draw the border line", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(true) },
    PropertySpec { id: "lineWidth", label: "Line width", description: "Stroke width of the border line", kind: number(1.0, 10.0, 1.0), default: PropertyDefault::Number(DEFAULT_LINE_WIDTH) },
    PropertySpec { id: "showValues", label: "Show values", description: "Print values above the area", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(false) },
];

/// Axis, title and legend settings shared by every chart type.
pub const COMMON_PROPERTIES: &[PropertySpec] = &[
    PropertySpec { id: "xAxisTitle", label: "X axis title", description: "Overrides the x field name", kind: PropertyKind::Text, default: PropertyDefault::Unset },
    PropertySpec { id: "yAxisTitle", label: "Y axis title", description: "Overrides the y field name", kind: PropertyKind::Text, default: PropertyDefault::Unset },
    PropertySpec { id: "title", label: "Chart title", description: "Title drawn above the chart", kind: PropertyKind::Text, default: PropertyDefault::Unset },
    PropertySpec { id: "showLegend", label: "Show legend", description: "Legend for the color channel", kind: PropertyKind::Boolean, default: PropertyDefault::Bool(true) },
];

/// Style properties the editor offers for a chart type.
pub fn properties(chart_type: ChartType) -> &'static [PropertySpec] {
    match chart_type {
        ChartType::Scatter => SCATTER_PROPERTIES,
        ChartType::Line => LINE_PROPERTIES,
        ChartType::Bar => BAR_PROPERTIES,
        ChartType::Area => AREA_PROPERTIES,
        _ => &[],
    }
}

/// Find a property by id across every chart type.
pub fn lookup_property(id: &str) -> Option<&'static PropertySpec> {
    SCATTER_PROPERTIES
        .iter()
        .chain(LINE_PROPERTIES)
        .chain(BAR_PROPERTIES)
        .chain(AREA_PROPERTIES)
        .chain(COMMON_PROPERTIES)
        .find(|p| p.id == id)
}
