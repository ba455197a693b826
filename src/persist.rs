//! Best-effort mirroring of the application state to a key-value store.
//!
//! Storage is a cache for session restoration, never the source of truth:
//! every failure is logged and dropped so it cannot affect compilation.

use crate::config::ChartConfig;
use crate::mapping::Mapping;
use crate::state::{Action, AppState, Dataset};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DATASETS_KEY: &str = "vega-mapper:datasets";
pub const ACTIVE_DATASET_KEY: &str = "vega-mapper:active-dataset";
pub const MAPPING_KEY: &str = "vega-mapper:mapping";
pub const CHART_CONFIG_KEY: &str = "vega-mapper:chart-config";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Mirrors state transitions into a store and reads them back.
pub struct Persister<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Persister<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist whatever `action` changed in `state` (the state after the action).
    /// The chart type is not persisted.
    pub fn record(&mut self, action: &Action, state: &AppState) {
        let result = match action {
            Action::AddDataset(_) | Action::RemoveDataset(_) | Action::DuplicateDataset(_) => self
                .save_datasets(state)
                .and_then(|_| self.save_active(state)),
            Action::SetActiveDataset(_) => self.save_active(state),
            Action::SetMapping(_) => self.save_json(MAPPING_KEY, &state.mapping),
            Action::SetChartConfig(_) => self.save_json(CHART_CONFIG_KEY, &state.chart_config),
            Action::SetChartType(_) => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %format!("{:#}", e), "failed to persist state");
        }
    }

    /// Rebuild a state from the store. Missing or unreadable entries keep their defaults.
    pub fn restore(&self) -> AppState {
        let mut state = AppState::default();
        if let Some(datasets) = self.load::<Vec<Dataset>>(DATASETS_KEY) {
            state.datasets = datasets;
        }
        if let Some(mapping) = self.load::<Mapping>(MAPPING_KEY) {
            state.mapping = mapping;
        }
        if let Some(config) = self.load::<ChartConfig>(CHART_CONFIG_KEY) {
            state.chart_config = config;
        }
        match self.store.get(ACTIVE_DATASET_KEY) {
            Ok(Some(id)) if state.datasets.iter().any(|d| d.id == id) => {
                state.active_dataset_id = Some(id);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %format!("{:#}", e), "failed to read active dataset"),
        }
        debug!(datasets = state.datasets.len(), "restored state");
        state
    }

    fn save_datasets(&mut self, state: &AppState) -> Result<()> {
        self.save_json(DATASETS_KEY, &state.datasets)
    }

    fn save_active(&mut self, state: &AppState) -> Result<()> {
        match &state.active_dataset_id {
            Some(id) => self.store.set(ACTIVE_DATASET_KEY, id),
            None => self.store.remove(ACTIVE_DATASET_KEY),
        }
    }

    fn save_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value).with_context(|| format!("Failed to serialize {}", key))?;
        self.store.set(key, &text)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = match self.store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %format!("{:#}", e), "failed to read persisted entry");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "skipping corrupt persisted entry");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{row, Table};
    use crate::mapping::{Channel, ChartType};
    use crate::state::reduce;

    fn dataset(id: &str) -> Dataset {
        Dataset {
            id: id.to_string(),
            ..Dataset::new("sales.csv", Table::from_rows(vec![row([("a", "1")])]), 4)
        }
    }

    fn apply<S: KeyValueStore>(persister: &mut Persister<S>, state: &AppState, action: Action) -> AppState {
        let next = reduce(state, action.clone());
        persister.record(&action, &next);
        next
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("storage unavailable")
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("quota exceeded")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            anyhow::bail!("storage unavailable")
        }
    }

    #[test]
    fn test_record_and_restore_round_trip() {
        let mut persister = Persister::new(MemoryStore::new());
        let mapping = Mapping::default().with(Channel::X, "a");
        let config = ChartConfig {
            bar_color: Some("#ff0000".into()),
            ..Default::default()
        };

        let state = apply(&mut persister, &AppState::default(), Action::AddDataset(dataset("d1")));
        let state = apply(&mut persister, &state, Action::AddDataset(dataset("d2")));
        let state = apply(&mut persister, &state, Action::SetActiveDataset("d1".into()));
        let state = apply(&mut persister, &state, Action::SetMapping(mapping.clone()));
        let state = apply(&mut persister, &state, Action::SetChartConfig(config.clone()));
        let state = apply(&mut persister, &state, Action::SetChartType(ChartType::Bar));

        let restored = persister.restore();
        assert_eq!(restored.datasets, state.datasets);
        assert_eq!(restored.active_dataset_id.as_deref(), Some("d1"));
        assert_eq!(restored.mapping, mapping);
        assert_eq!(restored.chart_config, config);
        // Chart type is not persisted
        assert_eq!(restored.chart_type, ChartType::Scatter);
    }

    #[test]
    fn test_removing_last_dataset_clears_active_key() {
        let mut persister = Persister::new(MemoryStore::new());
        let state = apply(&mut persister, &AppState::default(), Action::AddDataset(dataset("d1")));
        apply(&mut persister, &state, Action::RemoveDataset("d1".into()));
        assert_eq!(persister.store().get(ACTIVE_DATASET_KEY).unwrap(), None);
        assert_eq!(persister.store().get(DATASETS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut persister = Persister::new(BrokenStore);
        let state = reduce(&AppState::default(), Action::AddDataset(dataset("d1")));
        persister.record(&Action::AddDataset(dataset("d1")), &state);
        assert_eq!(persister.restore(), AppState::default());
    }

    #[test]
    fn test_corrupt_entries_are_skipped() {
        let mut store = MemoryStore::new();
        store.set(MAPPING_KEY, "{not json").unwrap();
        store.set(CHART_CONFIG_KEY, r#"{"title":"kept"}"#).unwrap();
        store.set(ACTIVE_DATASET_KEY, "ghost").unwrap();
        let restored = Persister::new(store).restore();
        assert_eq!(restored.mapping, Mapping::default());
        assert_eq!(restored.chart_config.title(), Some("kept"));
        assert_eq!(restored.active_dataset_id, None);
    }

    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("vegamapper-store-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.get(MAPPING_KEY).unwrap(), None);
        store.set(MAPPING_KEY, r#"{"x":"a"}"#).unwrap();
        assert!(dir.join("vega-mapper_mapping.json").exists());
        assert_eq!(store.get(MAPPING_KEY).unwrap().as_deref(), Some(r#"{"x":"a"}"#));
        store.remove(MAPPING_KEY).unwrap();
        store.remove(MAPPING_KEY).unwrap();
        assert_eq!(store.get(MAPPING_KEY).unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
