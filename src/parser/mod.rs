// Chart DSL parser module

pub mod aesthetics;
pub mod ast;
pub mod command;
pub mod geom;
pub mod lexer;
pub mod pipeline;
pub mod titles;

// Public API re-exports
pub use ast::{ChartCommand, ChartRequest, GroupCommand, SortCommand};
pub use pipeline::{mapped_channels, parse_chart_request};
