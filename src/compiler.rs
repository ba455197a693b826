use crate::config::ChartConfig;
use crate::data::Table;
use crate::infer::{infer_type, FieldType};
use crate::ir::{
    Axis, ChannelDef, Encoding, Hidden, InlineData, LayerSpec, LineOverlay, Mark, MarkType, ScaleDef,
    SpecBody, Specification, VEGA_LITE_SCHEMA,
};
use crate::mapping::{Channel, ChartType, Mapping};
use crate::transform::transform;
use tracing::{debug, warn};

pub const DEFAULT_WIDTH: u32 = 700;
pub const DEFAULT_HEIGHT: u32 = 450;
pub const DEFAULT_PADDING: u32 = 20;

/// Sequential scheme attached to the color channel of heatmaps.
pub const HEATMAP_SCHEME: &str = "blues";

/// Compile the four editor inputs into a chart specification.
///
/// Returns `None` ("nothing to render yet") when there is no table or when the
/// x channel is unmapped. Only x gates compilation, whatever the chart type's
/// own required channels are: a box chart mapped on y alone is complete for
/// the validator but still yields `None` here.
pub fn compile(
    table: Option<&Table>,
    mapping: &Mapping,
    chart_type: ChartType,
    config: &ChartConfig,
) -> Option<Specification> {
    let table = table?;
    let x_field = mapping.get(Channel::X)?;
    let y_field = mapping.get(Channel::Y);

    for (channel, field) in mapping.assigned() {
        if !table.has_field(field) {
            warn!(channel = channel.name(), field, "mapped field is not a column of the table");
        }
    }

    let values = transform(&table.rows, &config.transform, y_field);

    let mut encoding = build_encoding(table, mapping, config);
    let mark = build_mark(chart_type, config);

    match chart_type {
        ChartType::Histogram => {
            if let Some(x) = encoding.x.as_mut() {
                x.bin = Some(true);
            }
            encoding.y = Some(ChannelDef::count("Count"));
        }
        ChartType::Heatmap => {
            if let Some(color) = encoding.color.as_mut() {
                color.scale = Some(ScaleDef {
                    scheme: HEATMAP_SCHEME.to_string(),
                });
            }
        }
        _ => {}
    }

    let primary = LayerSpec { mark, encoding };
    let body = match value_labels(chart_type, config, y_field, &primary) {
        Some(labels) => SpecBody::Layered {
            layer: vec![primary, labels],
        },
        None => SpecBody::Single(primary),
    };

    debug!(
        chart = %chart_type,
        x = x_field,
        rows = values.len(),
        layered = matches!(body, SpecBody::Layered { .. }),
        "compiled chart specification"
    );

    Some(Specification {
        schema: VEGA_LITE_SCHEMA.to_string(),
        data: InlineData { values },
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        padding: DEFAULT_PADDING,
        title: config.title().map(str::to_string),
        body,
    })
}

// =============================================================================
// Encoding
// =============================================================================

/// Encodings are built in x, y, color, size, opacity order. Types are inferred
/// on the untransformed table. Shape is never encoded.
fn build_encoding(table: &Table, mapping: &Mapping, config: &ChartConfig) -> Encoding {
    let axis = || Axis {
        grid: config.show_grid(),
    };
    let def = |field: &str, title: Option<&str>| ChannelDef {
        title: Some(title.unwrap_or(field).to_string()),
        ..ChannelDef::field(field, infer_type(table, field))
    };

    let mut encoding = Encoding::default();

    if let Some(field) = mapping.get(Channel::X) {
        encoding.x = Some(ChannelDef {
            axis: Some(axis()),
            ..def(field, config.x_axis_title())
        });
    }
    if let Some(field) = mapping.get(Channel::Y) {
        encoding.y = Some(ChannelDef {
            axis: Some(axis()),
            ..def(field, config.y_axis_title())
        });
    }
    if let Some(field) = mapping.get(Channel::Color) {
        encoding.color = Some(ChannelDef {
            legend: (!config.show_legend()).then_some(Hidden),
            ..def(field, None)
        });
    }
    if let Some(field) = mapping.get(Channel::Size) {
        encoding.size = Some(def(field, None));
    }
    if let Some(field) = mapping.get(Channel::Opacity) {
        encoding.opacity = Some(def(field, None));
    }

    encoding
}

// =============================================================================
// Marks
// =============================================================================

fn build_mark(chart_type: ChartType, config: &ChartConfig) -> Mark {
    match chart_type {
        ChartType::Scatter => Mark {
            size: Some(config.point_size()),
            opacity: Some(config.point_opacity()),
            shape: Some(config.point_shape().to_string()),
            ..Mark::new(MarkType::Point)
        },
        ChartType::Line => Mark {
            point: Some(config.show_points()),
            stroke_width: Some(config.line_width()),
            color: Some(config.line_color().to_string()),
            interpolate: Some(config.interpolation().to_string()),
            ..Mark::new(MarkType::Line)
        },
        ChartType::Bar => Mark {
            opacity: Some(config.bar_opacity()),
            color: Some(config.bar_color().to_string()),
            corner_radius: Some(config.bar_corner_radius()),
            ..Mark::new(MarkType::Bar)
        },
        ChartType::Area => Mark {
            opacity: Some(config.area_opacity()),
            color: Some(config.area_color().to_string()),
            line: config.show_line().then(|| LineOverlay {
                stroke_width: config.line_width(),
            }),
            ..Mark::new(MarkType::Area)
        },
        ChartType::Histogram => Mark::new(MarkType::Bar),
        ChartType::Box => Mark {
            extent: Some("min-max".to_string()),
            ..Mark::new(MarkType::Boxplot)
        },
        ChartType::Heatmap => Mark::new(MarkType::Rect),
        ChartType::Unknown => Mark::new(MarkType::Point),
    }
}

/// Text layer printing the y value above each bar or area point.
fn value_labels(
    chart_type: ChartType,
    config: &ChartConfig,
    y_field: Option<&str>,
    primary: &LayerSpec,
) -> Option<LayerSpec> {
    if !config.show_values() || !matches!(chart_type, ChartType::Bar | ChartType::Area) {
        return None;
    }
    let y_field = y_field?;

    let mut encoding = primary.encoding.clone();
    encoding.text = Some(ChannelDef::field(y_field, FieldType::Quantitative));

    Some(LayerSpec {
        mark: Mark {
            align: Some("center".to_string()),
            baseline: Some("bottom".to_string()),
            dy: Some(-5.0),
            ..Mark::new(MarkType::Text)
        },
        encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Aggregation;
    use crate::data::{row, Value};
    use serde_json::json;

    fn make_table() -> Table {
        Table::from_rows(vec![
            row([("month", Value::from("2024-01-01")), ("sales", Value::from(10.0)), ("region", Value::from("North"))]),
            row([("month", Value::from("2024-02-01")), ("sales", Value::from(20.0)), ("region", Value::from("South"))]),
            row([("month", Value::from("2024-03-01")), ("sales", Value::from(5.0)), ("region", Value::from("North"))]),
        ])
    }

    fn xy() -> Mapping {
        Mapping::default()
            .with(Channel::X, "month")
            .with(Channel::Y, "sales")
    }

    #[test]
    fn test_null_without_x() {
        let table = make_table();
        let spec = compile(Some(&table), &Mapping::default(), ChartType::Scatter, &ChartConfig::default());
        assert!(spec.is_none());
    }

    #[test]
    fn test_null_without_table() {
        assert!(compile(None, &xy(), ChartType::Scatter, &ChartConfig::default()).is_none());
    }

    #[test]
    fn test_x_only_gives_single_layer() {
        let table = make_table();
        let mapping = Mapping::default().with(Channel::X, "month");
        let spec = compile(Some(&table), &mapping, ChartType::Scatter, &ChartConfig::default()).unwrap();
        assert_eq!(spec.layers().len(), 1);
        assert!(matches!(spec.body, SpecBody::Single(_)));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["$schema"], VEGA_LITE_SCHEMA);
        assert_eq!(json["width"], 700);
        assert_eq!(json["height"], 450);
        assert_eq!(json["mark"]["type"], "point");
        assert!(json.get("layer").is_none());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_box_chart_still_gated_on_x() {
        // Documented quirk: the validator accepts a box chart mapped on y
        // alone, but the compiler only starts once x is mapped.
        let table = make_table();
        let mapping = Mapping::default().with(Channel::Y, "sales");
        assert!(crate::mapping::is_complete(&mapping, ChartType::Box));
        assert!(compile(Some(&table), &mapping, ChartType::Box, &ChartConfig::default()).is_none());

        let with_x = mapping.with(Channel::X, "region");
        let spec = compile(Some(&table), &with_x, ChartType::Box, &ChartConfig::default()).unwrap();
        assert_eq!(spec.primary().mark.kind, MarkType::Boxplot);
        assert_eq!(spec.primary().mark.extent.as_deref(), Some("min-max"));
    }

    #[test]
    fn test_scatter_encoding() {
        let table = make_table();
        let mapping = xy().with(Channel::Color, "region").with(Channel::Shape, "region");
        let spec = compile(Some(&table), &mapping, ChartType::Scatter, &ChartConfig::default()).unwrap();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(
            json["mark"],
            json!({"type": "point", "size": 100.0, "opacity": 0.7, "shape": "circle"})
        );
        assert_eq!(
            json["encoding"]["x"],
            json!({"field": "month", "type": "temporal", "title": "month", "axis": {"grid": true}})
        );
        assert_eq!(json["encoding"]["y"]["type"], "quantitative");
        assert_eq!(
            json["encoding"]["color"],
            json!({"field": "region", "type": "nominal", "title": "region"})
        );
        assert!(json["encoding"].get("shape").is_none());

        let keys: Vec<&String> = json["encoding"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["x", "y", "color"]);
    }

    #[test]
    fn test_titles_grid_and_legend() {
        let table = make_table();
        let config = ChartConfig {
            x_axis_title: Some("Month".into()),
            y_axis_title: Some("Revenue".into()),
            title: Some("Sales".into()),
            show_grid: Some(false),
            show_legend: Some(false),
            ..Default::default()
        };
        let mapping = xy().with(Channel::Color, "region");
        let spec = compile(Some(&table), &mapping, ChartType::Line, &config).unwrap();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["title"], "Sales");
        assert_eq!(json["encoding"]["x"]["title"], "Month");
        assert_eq!(json["encoding"]["y"]["title"], "Revenue");
        assert_eq!(json["encoding"]["x"]["axis"]["grid"], false);
        assert!(json["encoding"]["color"]["legend"].is_null());
        assert!(json["encoding"]["color"].as_object().unwrap().contains_key("legend"));
    }

    #[test]
    fn test_line_mark_defaults() {
        let table = make_table();
        let spec = compile(Some(&table), &xy(), ChartType::Line, &ChartConfig::default()).unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json["mark"],
            json!({"type": "line", "color": "#3b82f6", "point": false, "strokeWidth": 2.0, "interpolate": "linear"})
        );
    }

    #[test]
    fn test_area_mark_border_line() {
        let table = make_table();
        let spec = compile(Some(&table), &xy(), ChartType::Area, &ChartConfig::default()).unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mark"]["opacity"], 0.6);
        assert_eq!(json["mark"]["line"], json!({"strokeWidth": 2.0}));

        let config = ChartConfig {
            show_line: Some(false),
            ..Default::default()
        };
        let spec = compile(Some(&table), &xy(), ChartType::Area, &config).unwrap();
        assert!(spec.primary().mark.line.is_none());
    }

    #[test]
    fn test_histogram_discards_user_y() {
        let table = make_table();
        let spec = compile(Some(&table), &xy(), ChartType::Histogram, &ChartConfig::default()).unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mark"]["type"], "bar");
        assert_eq!(json["encoding"]["x"]["bin"], true);
        assert_eq!(json["encoding"]["y"], json!({"aggregate": "count", "title": "Count"}));

        let x_only = Mapping::default().with(Channel::X, "sales");
        let spec = compile(Some(&table), &x_only, ChartType::Histogram, &ChartConfig::default()).unwrap();
        assert_eq!(spec.primary().encoding.y, Some(ChannelDef::count("Count")));
    }

    #[test]
    fn test_heatmap_color_scheme() {
        let table = make_table();
        let mapping = xy().with(Channel::Color, "sales");
        let spec = compile(Some(&table), &mapping, ChartType::Heatmap, &ChartConfig::default()).unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["mark"]["type"], "rect");
        assert_eq!(json["encoding"]["color"]["scale"]["scheme"], "blues");

        let spec = compile(Some(&table), &xy(), ChartType::Heatmap, &ChartConfig::default()).unwrap();
        assert!(spec.primary().encoding.color.is_none());
    }

    #[test]
    fn test_unknown_chart_uses_point() {
        let table = make_table();
        let spec = compile(Some(&table), &xy(), ChartType::Unknown, &ChartConfig::default()).unwrap();
        assert_eq!(spec.primary().mark, Mark::new(MarkType::Point));
    }

    #[test]
    fn test_show_values_adds_text_layer() {
        let table = make_table();
        let config = ChartConfig {
            show_values: Some(true),
            ..Default::default()
        };
        let spec = compile(Some(&table), &xy(), ChartType::Bar, &config).unwrap();
        let json = serde_json::to_value(&spec).unwrap();

        assert!(json.get("mark").is_none());
        let layers = json["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["mark"]["type"], "bar");
        assert_eq!(
            layers[1]["mark"],
            json!({"type": "text", "align": "center", "baseline": "bottom", "dy": -5.0})
        );
        assert_eq!(layers[1]["encoding"]["text"], json!({"field": "sales", "type": "quantitative"}));
        assert_eq!(layers[1]["encoding"]["x"], layers[0]["encoding"]["x"]);

        // Only bar and area get value labels
        let spec = compile(Some(&table), &xy(), ChartType::Line, &config).unwrap();
        assert_eq!(spec.layers().len(), 1);

        // Nothing to print without a y field
        let x_only = Mapping::default().with(Channel::X, "month");
        let spec = compile(Some(&table), &x_only, ChartType::Bar, &config).unwrap();
        assert_eq!(spec.layers().len(), 1);
    }

    #[test]
    fn test_embeds_transformed_rows() {
        let table = make_table();
        let mut config = ChartConfig::default();
        config.transform.group_by = Some("region".into());
        config.transform.aggregation = Some(Aggregation::Sum);
        let mapping = Mapping::default()
            .with(Channel::X, "region")
            .with(Channel::Y, "sales");
        let spec = compile(Some(&table), &mapping, ChartType::Bar, &config).unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json["data"]["values"],
            json!([{"region": "North", "sales": 15}, {"region": "South", "sales": 20}])
        );
        // Types still come from the source table
        assert_eq!(json["encoding"]["x"]["type"], "nominal");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let table = make_table();
        let mapping = xy().with(Channel::Color, "region").with(Channel::Size, "sales");
        let config = ChartConfig {
            show_values: Some(true),
            ..Default::default()
        };
        let a = compile(Some(&table), &mapping, ChartType::Bar, &config).unwrap();
        let b = compile(Some(&table), &mapping, ChartType::Bar, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
