//! Field type inference.
//!
//! Classifies a column into one of the four Vega-Lite measurement types by
//! sampling the first rows of the table. Inference is total: any table/field
//! combination yields a type, and unclassifiable data falls back to nominal.

use crate::data::{cell, Table, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Number of leading rows inspected per field.
pub const SAMPLE_SIZE: usize = 10;

/// Share of the sample that must agree before a type is chosen.
const MAJORITY: f64 = 0.7;

/// Distinct/sample ratio under which a repeating column counts as ordinal.
const ORDINAL_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Temporal,
    Ordinal,
    Nominal,
}

/// Infer the semantic type of `field` in `table`.
///
/// Checks run in a fixed order (quantitative, temporal, ordinal) and the
/// first one that passes wins, so a column of small repeating numeric codes
/// is quantitative rather than ordinal.
pub fn infer_type(table: &Table, field: &str) -> FieldType {
    let sample: Vec<&Value> = table
        .rows
        .iter()
        .take(SAMPLE_SIZE)
        .map(|row| cell(row, field))
        .collect();
    classify(&sample)
}

fn classify(sample: &[&Value]) -> FieldType {
    let n = sample.len() as f64;

    let numeric = sample.iter().filter(|v| v.as_number().is_some()).count() as f64;
    if numeric > n * MAJORITY {
        return FieldType::Quantitative;
    }

    let dates = sample.iter().filter(|v| is_calendar_date(v)).count() as f64;
    if dates > n * MAJORITY {
        return FieldType::Temporal;
    }

    let distinct: HashSet<_> = sample.iter().map(|v| v.key()).collect();
    if distinct.len() > 1 && (distinct.len() as f64) < n * ORDINAL_RATIO {
        return FieldType::Ordinal;
    }

    FieldType::Nominal
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Whether a value is text holding a recognisable calendar date.
pub fn is_calendar_date(value: &Value) -> bool {
    let Some(text) = value.as_text() else {
        return false;
    };
    let s = text.trim();
    if s.is_empty() {
        return false;
    }

    if DateTime::parse_from_rfc3339(s).is_ok() || DateTime::parse_from_rfc2822(s).is_ok() {
        return true;
    }
    if DATE_FORMATS.iter().any(|f| NaiveDate::parse_from_str(s, f).is_ok()) {
        return true;
    }
    if DATETIME_FORMATS.iter().any(|f| NaiveDateTime::parse_from_str(s, f).is_ok()) {
        return true;
    }
    // Year-month, e.g. "2024-03"
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").is_ok() && s.len() == 7
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{row, Row};
    use rstest::rstest;

    fn column(values: &[&str]) -> Table {
        let rows: Vec<Row> = values.iter().map(|v| row([("f", *v)])).collect();
        Table::new(vec!["f".to_string()], rows)
    }

    #[rstest]
    #[case(&["1", "2.5", "-3", "4e2"], FieldType::Quantitative)]
    #[case(&["2024-01-01", "2024-02-01", "2024-03-15"], FieldType::Temporal)]
    #[case(&["2024-01-01T10:00:00Z", "Mar 5, 2024", "03/05/2024"], FieldType::Temporal)]
    #[case(&["a", "b", "a", "b", "a", "b"], FieldType::Ordinal)]
    #[case(&["ana", "bo", "cy", "di"], FieldType::Nominal)]
    #[case(&["x", "x", "x", "x"], FieldType::Nominal)]
    fn test_infer_cases(#[case] values: &[&str], #[case] expected: FieldType) {
        assert_eq!(infer_type(&column(values), "f"), expected);
    }

    #[test]
    fn test_empty_table_is_nominal() {
        assert_eq!(infer_type(&Table::default(), "anything"), FieldType::Nominal);
    }

    #[test]
    fn test_missing_field_is_nominal() {
        let table = column(&["1", "2", "3"]);
        assert_eq!(infer_type(&table, "nope"), FieldType::Nominal);
    }

    #[test]
    fn test_numeric_beats_dates() {
        let mut values = vec!["1", "2", "3", "4", "5", "6", "7", "8"];
        values.extend(["2024-01-01", "2024-01-02"]);
        assert_eq!(infer_type(&column(&values), "f"), FieldType::Quantitative);
    }

    #[test]
    fn test_numeric_beats_ordinal() {
        let values = ["1", "2", "1", "2", "1", "2", "1", "2", "1", "2"];
        assert_eq!(infer_type(&column(&values), "f"), FieldType::Quantitative);
    }

    #[test]
    fn test_only_first_ten_rows_sampled() {
        let mut values = vec!["1"; 10];
        values.extend(vec!["text"; 50]);
        assert_eq!(infer_type(&column(&values), "f"), FieldType::Quantitative);
    }

    #[test]
    fn test_blank_values_count_against_numeric_share() {
        // 7 of 10 numeric is not more than 70%
        let values = ["1", "2", "3", "4", "5", "6", "7", "", "", ""];
        assert_ne!(infer_type(&column(&values), "f"), FieldType::Quantitative);
    }

    #[test]
    fn test_number_cells_are_quantitative() {
        let rows: Vec<Row> = (0..5).map(|i| row([("n", Value::from(i as f64))])).collect();
        let table = Table::new(vec!["n".to_string()], rows);
        assert_eq!(infer_type(&table, "n"), FieldType::Quantitative);
    }

    #[test]
    fn test_calendar_dates() {
        assert!(is_calendar_date(&Value::from("2023-12-31")));
        assert!(is_calendar_date(&Value::from("2023-12")));
        assert!(is_calendar_date(&Value::from("Tue, 1 Jul 2003 10:52:37 +0200")));
        assert!(!is_calendar_date(&Value::from("2023-13-01")));
        assert!(!is_calendar_date(&Value::from("hello")));
        assert!(!is_calendar_date(&Value::from(20231231.0)));
        assert!(!is_calendar_date(&Value::Null));
    }
}
