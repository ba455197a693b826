use crate::config::{Aggregation, SortOrder, TransformConfig};
use crate::data::{cell, Row, Value, ValueKey};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Output key for the aggregate when no y field is mapped.
pub const COUNT_FIELD: &str = "count";

/// Main entry point: filter, then sort, then group the rows.
///
/// Pure: `rows` is left untouched and a new sequence is returned. The stage
/// order is fixed; when grouping is active the emitted group order is the
/// first-occurrence order of each key after sorting, and the aggregated rows
/// are not sorted again.
pub fn transform(rows: &[Row], config: &TransformConfig, y_field: Option<&str>) -> Vec<Row> {
    if config.is_identity() {
        return rows.to_vec();
    }

    // 1. Filter
    let mut kept: Vec<&Row> = rows
        .iter()
        .filter(|row| matches_filters(row, &config.filters))
        .collect();

    // 2. Sort
    if let Some(field) = config.sort_field() {
        sort_rows(&mut kept, field, config.sort_order());
    }

    // 3. Group
    let out = match config.group_by() {
        Some(group_field) => group_rows(&kept, group_field, y_field, config.aggregation()),
        None => kept.into_iter().cloned().collect(),
    };

    debug!(
        rows_in = rows.len(),
        rows_out = out.len(),
        "applied data transform"
    );
    out
}

/// Every configured filter must accept the row.
pub fn matches_filters(row: &Row, filters: &IndexMap<String, Value>) -> bool {
    filters
        .iter()
        .all(|(field, wanted)| matches_filter(cell(row, field), wanted))
}

/// Text cells match on a case-insensitive substring; anything else must equal
/// the filter value, either as-is or after reading the filter as a number.
/// A blank filter value places no constraint.
fn matches_filter(value: &Value, wanted: &Value) -> bool {
    if wanted.is_blank() {
        return true;
    }
    match value {
        Value::Text(text) => text
            .to_lowercase()
            .contains(&wanted.to_string().to_lowercase()),
        other => {
            other == wanted
                || match (other, wanted.as_number()) {
                    (Value::Number(n), Some(w)) => *n == w,
                    _ => false,
                }
        }
    }
}

fn sort_class(value: &Value) -> u8 {
    match value {
        v if v.as_number().is_some() => 0,
        Value::Null => 2,
        _ => 1,
    }
}

/// Total order over cell values: numeric values first (numerically), then
/// other text (lexically), then nulls.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    sort_class(a).cmp(&sort_class(b)).then_with(|| match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => match (a, b) {
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    })
}

/// Stable sort; `Desc` reverses the comparator, so equal keys keep their order.
fn sort_rows(rows: &mut [&Row], field: &str, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ord = compare_values(cell(a, field), cell(b, field));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn group_rows(
    rows: &[&Row],
    group_field: &str,
    y_field: Option<&str>,
    aggregation: Aggregation,
) -> Vec<Row> {
    let mut groups: IndexMap<ValueKey, (Value, Vec<&Row>)> = IndexMap::new();
    for row in rows {
        let value = cell(row, group_field);
        groups
            .entry(value.key())
            .or_insert_with(|| (value.clone(), Vec::new()))
            .1
            .push(*row);
    }

    groups
        .into_values()
        .map(|(key, members)| {
            let mut out = Row::new();
            out.insert(group_field.to_string(), key);
            match y_field {
                Some(y) => {
                    out.insert(y.to_string(), aggregate(&members, y, aggregation));
                }
                None => {
                    out.insert(COUNT_FIELD.to_string(), Value::Number(members.len() as f64));
                }
            }
            out
        })
        .collect()
}

/// Reduce one group. Non-numeric values are skipped by sum/avg/min/max; a group
/// without any numeric value gives 0 for sum/avg and null for min/max.
fn aggregate(members: &[&Row], y_field: &str, aggregation: Aggregation) -> Value {
    if aggregation == Aggregation::Count {
        return Value::Number(members.len() as f64);
    }

    let numbers: Vec<f64> = members
        .iter()
        .filter_map(|row| cell(row, y_field).as_number())
        .collect();
    let sum: f64 = numbers.iter().sum();

    match aggregation {
        Aggregation::Sum => Value::Number(sum),
        Aggregation::Avg if numbers.is_empty() => Value::Number(0.0),
        Aggregation::Avg => Value::Number(sum / numbers.len() as f64),
        Aggregation::Min => numbers
            .iter()
            .copied()
            .reduce(f64::min)
            .map_or(Value::Null, Value::Number),
        Aggregation::Max => numbers
            .iter()
            .copied()
            .reduce(f64::max)
            .map_or(Value::Null, Value::Number),
        Aggregation::Count => Value::Number(members.len() as f64),
    }
}
