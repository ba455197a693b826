// CSV ingestion: header row, every cell kept as text

use crate::data::{Row, Table, Value};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a CSV table from stdin
pub fn read_csv_from_stdin() -> Result<Table> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}

/// Read a CSV table from a file on disk
pub fn read_csv_file(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv(file).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Parse CSV text into a Table.
///
/// No dynamic typing is applied: every cell becomes `Value::Text`, and typing is
/// left to the field type inferencer. Records shorter than the header omit the
/// trailing fields and repeated header names are renamed `name_1`, `name_2`, ...
/// Only empty lines are skipped; a record of empty cells such as `,,` is kept.
/// Header names are used exactly as written.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        anyhow::bail!("CSV input has no header row");
    }

    let fields = dedupe_headers(raw_headers);

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        let row: Row = fields
            .iter()
            .zip(record.iter())
            .map(|(field, cell)| (field.clone(), Value::Text(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(fields, rows))
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}_{}", header, n);
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cell;

    #[test]
    fn test_read_basic_csv() {
        let table = read_csv("name,score\nana,10\nbo,7\n".as_bytes()).unwrap();
        assert_eq!(table.fields, vec!["name", "score"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["score"], Value::from("10"));
    }

    #[test]
    fn test_short_records_omit_fields() {
        let table = read_csv("a,b,c\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 2);
        assert!(cell(&table.rows[0], "c").is_null());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = read_csv("a,b\n1,2\n\n3,4\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_cells_are_a_row() {
        let table = read_csv("a,b\n1,2\n,\n\n3,4\n".as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1]["a"], Value::from(""));
        assert_eq!(table.rows[1]["b"], Value::from(""));
    }

    #[test]
    fn test_header_names_keep_whitespace() {
        let table = read_csv(" city ,pop\nLima,10\n".as_bytes()).unwrap();
        assert_eq!(table.fields, vec![" city ", "pop"]);
        assert_eq!(table.rows[0][" city "], Value::from("Lima"));
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let table = read_csv("v,v,v\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(table.fields, vec!["v", "v_1", "v_2"]);
        assert_eq!(table.rows[0]["v_2"], Value::from("3"));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = read_csv("x,y\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.fields.len(), 2);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(read_csv("".as_bytes()).is_err());
    }
}
