// Abstract Syntax Tree for the chart DSL

use crate::config::{Aggregation, ChartConfig, PropertyValue, SortOrder};
use crate::data::Value;
use crate::mapping::{ChartType, Mapping};
use anyhow::{Context, Result};

/// Complete chart request: one chart command plus optional mapping,
/// transformation and label commands
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub mapping: Mapping,
    pub chart: ChartCommand,
    /// In source order; a later filter on the same field replaces an earlier one
    pub filters: Vec<(String, Value)>,
    pub sort: Option<SortCommand>,
    pub group: Option<GroupCommand>,
    /// `(property id, text)` from `labs`, applied in order after the chart properties
    pub titles: Vec<(&'static str, String)>,
}

/// Chart type plus its style properties, e.g. `bar(barColor: "#f00")`
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCommand {
    pub chart_type: ChartType,
    pub properties: Vec<(String, PropertyValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortCommand {
    pub field: String,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCommand {
    pub field: String,
    pub aggregation: Option<Aggregation>,
}

impl ChartRequest {
    /// Layer the request's settings over `base`.
    pub fn apply_to(&self, base: &ChartConfig) -> Result<ChartConfig> {
        let mut config = base.clone();

        for (id, value) in &self.chart.properties {
            config
                .set_property(id, value.clone())
                .with_context(|| format!("Invalid argument to {}()", self.chart.chart_type))?;
        }

        for (field, value) in &self.filters {
            config.transform.filters.insert(field.clone(), value.clone());
        }
        if let Some(sort) = &self.sort {
            config.transform.sort_field = Some(sort.field.clone());
            if sort.order.is_some() {
                config.transform.sort_order = sort.order;
            }
        }
        if let Some(group) = &self.group {
            config.transform.group_by = Some(group.field.clone());
            if group.aggregation.is_some() {
                config.transform.aggregation = group.aggregation;
            }
        }
        for (id, text) in &self.titles {
            config
                .set_property(id, PropertyValue::Text(text.clone()))
                .context("Invalid argument to labs()")?;
        }

        Ok(config)
    }
}
