use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vegamapper::config::{properties, ChartConfig};
use vegamapper::export::{self, ExportKind};
use vegamapper::mapping::{missing_channels, optional_channels, required_channels, ChartType};
use vegamapper::parser::{self, ChartRequest};
use vegamapper::persist::{FileStore, Persister};
use vegamapper::state::{reduce, Action, AppState, Dataset};
use vegamapper::{csv_reader, EmbedDocument, EmbedOptions, Renderer, Table};

/// Exit status when the chart cannot be compiled yet (x unmapped)
const EXIT_NOT_READY: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "vegamapper")]
#[command(about = "Compile CSV data and a chart description into a Vega-Lite specification", long_about = None)]
struct Args {
    /// Chart DSL (e.g., 'aes(x: month, y: sales) | bar(barColor: "#f00") | sort(by: sales)')
    dsl: String,

    /// Read the table from a file instead of stdin (CSV, or a JSON array of objects)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Base chart configuration (JSON); DSL arguments override it
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Print {"spec", "options"} for the rendering engine instead of the bare spec
    #[arg(long)]
    embed: bool,

    /// Renderer requested in the embed options
    #[arg(long, value_parser = ["svg", "canvas"], default_value = "svg")]
    renderer: String,

    /// Report mapping completeness for the chart type instead of compiling
    #[arg(long)]
    check: bool,

    /// Write the chart configuration document (file or directory)
    #[arg(long, value_name = "PATH")]
    export_config: Option<PathBuf>,

    /// Embed the dataset rows in the configuration export
    #[arg(long, requires = "export_config")]
    include_data: bool,

    /// Write the transformed rows (file or directory); a `.json` file gets the JSON data document
    #[arg(long, value_name = "PATH")]
    export_data: Option<PathBuf>,

    /// Data export format when --export-data names a directory
    #[arg(long, value_parser = ["csv", "json"], default_value = "csv")]
    data_format: String,

    /// Also write the compiled specification (file or directory)
    #[arg(long, value_name = "PATH")]
    export_spec: Option<PathBuf>,

    /// Mirror dataset, mapping and config into this directory
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    // Parse the DSL string
    let request = match parser::parse_chart_request(&args.dsl) {
        Ok((_, request)) => request,
        Err(e) => {
            eprintln!("Parse error: {:?}", e);
            std::process::exit(1);
        }
    };
    debug!(channels = ?parser::mapped_channels(&request), "parsed chart request");

    let base = match &args.config {
        Some(path) => load_config(path)?,
        None => ChartConfig::default(),
    };
    let config = request.apply_to(&base)?;

    let dataset = load_dataset(args.input.as_deref())?;
    let state = build_state(&request, config, dataset, args.state_dir.as_deref());

    if args.check {
        return print_check(&state);
    }

    let Some(spec) = state.compile() else {
        eprintln!("Chart not ready: map a field to the x channel to compile a specification");
        std::process::exit(EXIT_NOT_READY);
    };

    if let Some(path) = &args.export_config {
        let data = if args.include_data { state.active_table() } else { None };
        let doc = export::config_document(state.chart_type, &state.mapping, &state.chart_config, data);
        let target = export_path(path, state.chart_type, ExportKind::Config);
        write_json(&target, &doc)?;
        info!(path = %target.display(), with_data = data.is_some(), "exported chart configuration");
    }

    if let Some(path) = &args.export_data {
        let table = state.active_table().cloned().unwrap_or_default();
        let rows = export::transformed_table(&table, &state.mapping, &state.chart_config);
        let kind = data_export_kind(path, &args.data_format);
        let target = export_path(path, state.chart_type, kind);
        if kind == ExportKind::Data {
            let name = state.active_dataset().map(|d| d.name.as_str()).unwrap_or("dataset");
            write_json(&target, &export::data_document(name, &rows))?;
        } else {
            let file = File::create(&target).with_context(|| format!("Failed to create {}", target.display()))?;
            export::write_csv(&rows, file)?;
        }
        info!(path = %target.display(), rows = rows.len(), "exported transformed data");
    }

    if let Some(path) = &args.export_spec {
        let target = export_path(path, state.chart_type, ExportKind::Spec);
        write_json(&target, &spec)?;
        info!(path = %target.display(), "exported specification");
    }

    let output = if args.embed {
        let options = EmbedOptions {
            renderer: if args.renderer == "canvas" { Renderer::Canvas } else { Renderer::Svg },
            ..Default::default()
        };
        serde_json::to_string_pretty(&EmbedDocument {
            spec: &spec,
            options: &options,
        })
    } else {
        serde_json::to_string_pretty(&spec)
    }
    .context("Failed to serialize specification")?;

    // Write the specification to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", output).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn load_config(path: &Path) -> Result<ChartConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid chart config in {}", path.display()))
}

fn load_dataset(input: Option<&Path>) -> Result<Dataset> {
    match input {
        Some(path) => {
            let table = if path.extension().is_some_and(|ext| ext == "json") {
                let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
                let value: serde_json::Value =
                    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))?;
                Table::from_json(&value)?
            } else {
                csv_reader::read_csv_file(path)?
            };
            let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(Dataset::new(name, table, size))
        }
        None => {
            let table = csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?;
            Ok(Dataset::new("stdin", table, 0))
        }
    }
}

/// Run the editor actions through the reducer, mirroring them when a state directory is set.
fn build_state(request: &ChartRequest, config: ChartConfig, dataset: Dataset, state_dir: Option<&Path>) -> AppState {
    let mut persister = state_dir.map(|dir| Persister::new(FileStore::new(dir)));
    let actions = [
        Action::AddDataset(dataset),
        Action::SetMapping(request.mapping.clone()),
        Action::SetChartType(request.chart.chart_type),
        Action::SetChartConfig(config),
    ];

    let mut state = AppState::default();
    for action in actions {
        let next = reduce(&state, action.clone());
        if let Some(p) = persister.as_mut() {
            p.record(&action, &next);
        }
        state = next;
    }
    state
}

fn print_check(state: &AppState) -> Result<()> {
    let names = |channels: &[vegamapper::mapping::Channel]| -> Vec<&'static str> {
        channels.iter().map(|c| c.name()).collect()
    };
    let unknown: Vec<&str> = match state.active_table() {
        Some(table) => state
            .mapping
            .assigned()
            .map(|(_, field)| field)
            .filter(|field| !table.has_field(field))
            .collect(),
        None => Vec::new(),
    };
    let report = serde_json::json!({
        "chartType": state.chart_type,
        "complete": state.mapping_complete(),
        "required": names(required_channels(state.chart_type)),
        "optional": names(optional_channels(state.chart_type)),
        "missing": names(&missing_channels(&state.mapping, state.chart_type)),
        "unknownFields": unknown,
        "properties": properties(state.chart_type),
    });
    println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    Ok(())
}

fn write_json<T: serde::Serialize>(target: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", target.display()))?;
    fs::write(target, text).with_context(|| format!("Failed to write {}", target.display()))
}

/// A file's `.json` extension selects the JSON document; directories and
/// extensionless paths follow `--data-format`.
fn data_export_kind(path: &Path, format: &str) -> ExportKind {
    let json = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !path.is_dir() => ext.eq_ignore_ascii_case("json"),
        _ => format == "json",
    };
    if json {
        ExportKind::Data
    } else {
        ExportKind::Csv
    }
}

/// Directories get a generated file name; anything else is used as given.
fn export_path(path: &Path, chart_type: ChartType, kind: ExportKind) -> PathBuf {
    if path.is_dir() {
        path.join(export::file_name(chart_type, kind, Utc::now()))
    } else {
        path.to_path_buf()
    }
}
