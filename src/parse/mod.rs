//! Turns delimited text exports into `SaleRecord`s.
//!
//! Parsing is best-effort. Rows are never rejected: missing or unresolvable columns fall back to
//! an empty string or a fixed placeholder so that grouping never sees an empty key.

mod columns;

pub use columns::{match_header, ColumnMap};

use crate::model::SaleRecord;
use crate::utils;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Returned when the input does not contain a header row and at least one data row.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct EmptyInput {
    lines: usize,
}

impl EmptyInput {
    /// The number of non-blank lines that were found.
    pub fn lines(&self) -> usize {
        self.lines
    }
}

impl Display for EmptyInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected a header row and at least one data row, found {} non-blank line{}",
            self.lines,
            if self.lines == 1 { "" } else { "s" }
        )
    }
}

impl StdError for EmptyInput {}

/// Parses `text` into records, resolving columns from the first non-blank line.
pub fn parse_records(text: &str) -> Result<Vec<SaleRecord>, EmptyInput> {
    let lines = non_blank_lines(text);
    if lines.len() < 2 {
        return Err(EmptyInput { lines: lines.len() });
    }

    let header_line = lines[0];
    let separator = detect_separator(header_line);
    let headers: Vec<String> = split_line(header_line, separator)
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    debug!("Detected headers {headers:?} with separator {separator:?}");

    let columns = ColumnMap::resolve(&headers);
    let unresolved = columns.unresolved();
    if !unresolved.is_empty() {
        debug!("Columns not found in the header row: {unresolved:?}");
    }

    let records: Vec<SaleRecord> = lines[1..]
        .iter()
        .map(|line| build_record(&columns, &split_line(line, separator)))
        .collect();
    trace!("Parsed {} records", records.len());
    Ok(records)
}

/// Like `parse_records`, but input without data rows yields no records.
pub fn parse_records_lenient(text: &str) -> Vec<SaleRecord> {
    match parse_records(text) {
        Ok(records) => records,
        Err(e) => {
            warn!("{e}, treating the input as empty");
            Vec::new()
        }
    }
}

/// Reads the file at `path` and parses it with `parse_records_lenient`.
pub async fn parse_file(path: &Path) -> crate::Result<Vec<SaleRecord>> {
    let text = utils::read(path).await?;
    Ok(parse_records_lenient(&text))
}

/// Picks the separator from the header line: tab, then semicolon, else comma.
pub(crate) fn detect_separator(header_line: &str) -> char {
    if header_line.contains('\t') {
        '\t'
    } else if header_line.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Splits one line on `separator`. A `"` toggles quoted mode and is dropped; separators inside
/// quotes are kept. Every field is trimmed.
pub(crate) fn split_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn non_blank_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

fn build_record(columns: &ColumnMap, values: &[String]) -> SaleRecord {
    let mut record = SaleRecord::default();
    for (field, ix) in columns.fields() {
        let value = ix
            .and_then(|ix| values.get(ix))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| field.placeholder());
        record.set(field, value.to_string());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordField;

    #[test]
    fn test_header_only_is_empty_input() {
        let err = parse_records("Client,Dealership,Model\n").unwrap_err();
        assert_eq!(err.lines(), 1);
        assert!(parse_records("").is_err());
        assert!(parse_records("\n  \r\n\n").is_err());
        assert!(parse_records_lenient("Client,Model").is_empty());
    }

    #[test]
    fn test_detect_separator_priority() {
        assert_eq!(detect_separator("a\tb;c,d"), '\t');
        assert_eq!(detect_separator("a;b,c"), ';');
        assert_eq!(detect_separator("a,b"), ',');
        assert_eq!(detect_separator("single"), ',');
    }

    #[test]
    fn test_split_line_respects_quotes() {
        let fields = split_line(r#"Jane Doe, "Acme, North Branch" ,ModelX"#, ',');
        assert_eq!(fields, vec!["Jane Doe", "Acme, North Branch", "ModelX"]);
    }

    #[test]
    fn test_split_line_keeps_empty_fields() {
        let fields = split_line("a,,c,", ',');
        assert_eq!(fields, vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_scenario_row() {
        let text = "Client,Dealership,Model,Branch Office,Type\n\
                    Jane Doe,\"Acme, North Branch\",ModelX,Springfield,Mobile Device\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.client(), "Jane Doe");
        assert_eq!(r.dealership(), "Acme, North Branch");
        assert_eq!(r.model(), "ModelX");
        assert_eq!(r.branch_office(), "Springfield");
        assert_eq!(r.record_type(), "Mobile Device");
        assert_eq!(r.mobile_no(), "");
        assert_eq!(r.status(), None);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let text = "client;model;type\r\n\r\nAda;M1;Mobile Device\r\n   \r\nBob;M2;Other\r\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client(), "Ada");
        assert_eq!(records[1].model(), "M2");
    }

    #[test]
    fn test_tab_separated_with_status() {
        let text = "Client\tStatus\tType\nAda\tPending ETR\tMobile Device\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records[0].status(), Some("Pending ETR"));
    }

    #[test]
    fn test_missing_columns_use_placeholders() {
        let text = "client,type\nAda,Mobile Device\n";
        let records = parse_records(text).unwrap();
        let r = &records[0];
        assert_eq!(r.branch_office(), "Unknown Branch");
        assert_eq!(r.dealership(), "Unknown Dealership");
        assert_eq!(r.model(), "Unknown Model");
        assert_eq!(r.make(), "");
        assert_eq!(r.get(RecordField::ChasisNo), "");
    }

    #[test]
    fn test_short_rows_and_extra_fields() {
        let text = "client,dealership,model,type\nAda\nBob,Acme,M1,Mobile Device,extra,more\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client(), "Ada");
        assert_eq!(records[0].dealership(), "Unknown Dealership");
        assert_eq!(records[0].record_type(), "");
        assert_eq!(records[1].dealership(), "Acme");
        assert_eq!(records[1].record_type(), "Mobile Device");
    }

    #[test]
    fn test_blank_cell_uses_placeholder() {
        let text = "client,model,branch office\nAda,,\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records[0].model(), "Unknown Model");
        assert_eq!(records[0].branch_office(), "Unknown Branch");
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sales.csv");
        utils::write(&path, "client,type\nAda,Mobile Device\n")
            .await
            .unwrap();
        let records = parse_file(&path).await.unwrap();
        assert_eq!(records.len(), 1);

        utils::write(&path, "client,type\n").await.unwrap();
        assert!(parse_file(&path).await.unwrap().is_empty());

        assert!(parse_file(&dir.path().join("missing.csv")).await.is_err());
    }
}
