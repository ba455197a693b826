use crate::data::Row;
use crate::infer::FieldType;
use serde::{Serialize, Serializer};

// =============================================================================
// Compiled chart specification (Vega-Lite v5 subset)
// =============================================================================

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Complete declarative chart handed to the rendering engine.
/// Always derived from the compiler inputs, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Specification {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub data: InlineData,
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub body: SpecBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub values: Vec<Row>,
}

/// A single mark + encoding pair, or a `layer` list when more than one is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecBody {
    Single(LayerSpec),
    Layered { layer: Vec<LayerSpec> },
}

impl Specification {
    pub fn layers(&self) -> Vec<&LayerSpec> {
        match &self.body {
            SpecBody::Single(layer) => vec![layer],
            SpecBody::Layered { layer } => layer.iter().collect(),
        }
    }

    /// The first (data-drawing) layer.
    pub fn primary(&self) -> &LayerSpec {
        match &self.body {
            SpecBody::Single(layer) => layer,
            SpecBody::Layered { layer } => &layer[0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub mark: Mark,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Point,
    Line,
    Bar,
    Area,
    Rect,
    Boxplot,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
}

impl Mark {
    pub fn new(kind: MarkType) -> Self {
        Self {
            kind,
            size: None,
            opacity: None,
            shape: None,
            color: None,
            point: None,
            stroke_width: None,
            interpolate: None,
            corner_radius: None,
            line: None,
            extent: None,
            align: None,
            baseline: None,
            dy: None,
        }
    }
}

/// Border line drawn on top of an area mark
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineOverlay {
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<ChannelDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ChannelDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
}

/// Association of a field (or an aggregate) with one visual channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChannelDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Hidden>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleDef>,
}

impl ChannelDef {
    pub fn field(name: &str, field_type: FieldType) -> Self {
        Self {
            field: Some(name.to_string()),
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    pub fn count(title: &str) -> Self {
        Self {
            aggregate: Some(AggregateOp::Count),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub grid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleDef {
    pub scheme: String,
}

/// Serializes as `null`, which tells Vega-Lite not to draw the guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hidden;

impl Serialize for Hidden {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }
}
