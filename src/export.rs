//! Export documents: chart configuration, dataset, CSV and file naming.

use crate::config::ChartConfig;
use crate::data::{cell, Row, Table};
use crate::mapping::{Channel, ChartType, Mapping};
use crate::transform::transform;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

pub const EXPORT_VERSION: &str = "1.0";

/// Everything needed to rebuild the chart, optionally with the raw rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument<'a> {
    pub chart_type: ChartType,
    pub mapping: &'a Mapping,
    pub chart_config: &'a ChartConfig,
    pub exported_at: DateTime<Utc>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDocument<'a> {
    pub dataset: &'a str,
    pub fields: &'a [String],
    pub rows: &'a [Row],
    pub exported_at: DateTime<Utc>,
    pub total_rows: usize,
}

pub fn config_document<'a>(
    chart_type: ChartType,
    mapping: &'a Mapping,
    config: &'a ChartConfig,
    data: Option<&'a Table>,
) -> ConfigDocument<'a> {
    ConfigDocument {
        chart_type,
        mapping,
        chart_config: config,
        exported_at: Utc::now(),
        version: EXPORT_VERSION,
        data,
    }
}

pub fn data_document<'a>(name: &'a str, table: &'a Table) -> DataDocument<'a> {
    DataDocument {
        dataset: name,
        fields: &table.fields,
        rows: &table.rows,
        exported_at: Utc::now(),
        total_rows: table.len(),
    }
}

/// The rows the compiler would embed, as a table of their own.
pub fn transformed_table(table: &Table, mapping: &Mapping, config: &ChartConfig) -> Table {
    let rows = transform(&table.rows, &config.transform, mapping.get(Channel::Y));
    if config.transform.group_by().is_some() {
        Table::from_rows(rows)
    } else {
        Table::new(table.fields.clone(), rows)
    }
}

/// Header row of `fields`, then one record per row. Missing and null cells are empty.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.fields)
        .context("Failed to write CSV header")?;
    for row in &table.rows {
        out.write_record(table.fields.iter().map(|f| cell(row, f).to_string()))
            .context("Failed to write CSV record")?;
    }
    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Config,
    Data,
    Csv,
    Spec,
}

impl ExportKind {
    fn suffix(&self) -> &'static str {
        match self {
            ExportKind::Config => "-config.json",
            ExportKind::Data => "-data.json",
            ExportKind::Csv => "-data.csv",
            ExportKind::Spec => ".json",
        }
    }
}

/// `vegamapper-<chart>-<YYYY-MM-DDTHH-MM-SS><suffix>`
pub fn file_name(chart_type: ChartType, kind: ExportKind, at: DateTime<Utc>) -> String {
    format!(
        "vegamapper-{}-{}{}",
        chart_type,
        at.format("%Y-%m-%dT%H-%M-%S"),
        kind.suffix()
    )
}
