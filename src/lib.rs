// Library exports for vegamapper

pub mod csv_reader;
pub mod data;
pub mod parser;

// Compilation pipeline
pub mod infer;
pub mod transform;
pub mod mapping;
pub mod config;
pub mod ir;
pub mod compiler;

// Application shell
pub mod state;
pub mod persist;
pub mod export;

pub use compiler::compile;
pub use config::ChartConfig;
pub use data::{Table, Value};
pub use ir::Specification;
pub use mapping::{ChartType, Mapping};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Renderer {
    #[serde(rename = "svg")]
    #[default]
    Svg,
    #[serde(rename = "canvas")]
    Canvas,
}

/// Menu entries the rendering engine offers next to the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedActions {
    #[serde(default = "enabled")]
    pub export: bool,
    #[serde(default = "enabled")]
    pub source: bool,
    #[serde(default = "enabled")]
    pub compiled: bool,
    #[serde(default = "enabled")]
    pub editor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipOptions {
    pub theme: String,
}

/// Options handed to the rendering engine together with the specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EmbedOptions {
    #[serde(default)]
    pub actions: EmbedActions,
    #[serde(default)]
    pub renderer: Renderer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<TooltipOptions>,
}

fn enabled() -> bool { true }

impl Default for EmbedActions {
    fn default() -> Self {
        Self {
            export: true,
            source: true,
            compiled: true,
            editor: true,
        }
    }
}

/// Specification plus rendering options, as printed by `--embed`
#[derive(Debug, Clone, Serialize)]
pub struct EmbedDocument<'a> {
    pub spec: &'a Specification,
    pub options: &'a EmbedOptions,
}
