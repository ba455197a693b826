//! Application state and its pure reducer.
//!
//! The state is an explicit value: editors produce [`Action`]s, [`reduce`]
//! returns the next state, and the compiler reads the state only through
//! [`AppState::compile`]. Nothing here touches storage; see `persist`.

use crate::compiler::compile;
use crate::config::ChartConfig;
use crate::data::Table;
use crate::ir::Specification;
use crate::mapping::{is_complete, ChartType, Mapping};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded table with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub table: Table,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: u64,
}

impl Dataset {
    /// New dataset stamped with the current time. The id is derived from the
    /// timestamp, the way uploads were identified originally.
    pub fn new(name: impl Into<String>, table: Table, file_size: u64) -> Self {
        let uploaded_at = Utc::now();
        Self {
            id: format!("dataset-{}", uploaded_at.timestamp_millis()),
            name: name.into(),
            table,
            uploaded_at,
            file_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub datasets: Vec<Dataset>,
    pub active_dataset_id: Option<String>,
    pub mapping: Mapping,
    pub chart_type: ChartType,
    pub chart_config: ChartConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddDataset(Dataset),
    RemoveDataset(String),
    SetActiveDataset(String),
    DuplicateDataset(String),
    SetMapping(Mapping),
    SetChartType(ChartType),
    SetChartConfig(ChartConfig),
}

impl AppState {
    pub fn active_dataset(&self) -> Option<&Dataset> {
        let id = self.active_dataset_id.as_deref()?;
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn active_table(&self) -> Option<&Table> {
        self.active_dataset().map(|d| &d.table)
    }

    /// Compile the active dataset with the current mapping, chart type and config.
    pub fn compile(&self) -> Option<Specification> {
        compile(self.active_table(), &self.mapping, self.chart_type, &self.chart_config)
    }

    pub fn mapping_complete(&self) -> bool {
        is_complete(&self.mapping, self.chart_type)
    }
}

/// Next state after `action`. The previous state is left untouched.
///
/// Dataset actions never reset the mapping, chart type or config.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::AddDataset(dataset) => {
            next.active_dataset_id = Some(dataset.id.clone());
            next.datasets.push(dataset);
        }
        Action::RemoveDataset(id) => {
            next.datasets.retain(|d| d.id != id);
            if next.active_dataset_id.as_deref() == Some(id.as_str()) {
                next.active_dataset_id = next.datasets.first().map(|d| d.id.clone());
            }
        }
        Action::SetActiveDataset(id) => {
            if next.datasets.iter().any(|d| d.id == id) {
                next.active_dataset_id = Some(id);
            }
        }
        Action::DuplicateDataset(id) => {
            if let Some(source) = next.datasets.iter().find(|d| d.id == id) {
                let copy = Dataset {
                    id: copy_id(&next.datasets, &source.id),
                    name: format!("{} (copy)", source.name),
                    uploaded_at: Utc::now(),
                    ..source.clone()
                };
                next.datasets.push(copy);
            }
        }
        Action::SetMapping(mapping) => next.mapping = mapping,
        Action::SetChartType(chart_type) => next.chart_type = chart_type,
        Action::SetChartConfig(config) => next.chart_config = config,
    }
    next
}

/// First `<id>-copy-N` not already taken.
fn copy_id(datasets: &[Dataset], id: &str) -> String {
    (1..)
        .map(|n| format!("{}-copy-{}", id, n))
        .find(|candidate| datasets.iter().all(|d| &d.id != candidate))
        .unwrap_or_else(|| format!("{}-copy", id))
}
