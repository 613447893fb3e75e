// src/parse/mod.rs

pub mod plan;

use crate::error::{IngestError, Result};
use std::collections::BTreeMap;

/// A parsed CSV file: the header line plus one record per data line.
///
/// Records map header names to raw field values. Fields are matched to
/// headers by position; a short row maps its missing headers to the empty
/// string, and fields beyond the header count are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Parse raw CSV text into a [`CsvDocument`].
///
/// Accepts `\n` or `\r\n` line endings and a leading UTF-8 BOM. Header names
/// are trimmed; whitespace-only lines are skipped. Fails with
/// [`IngestError::EmptyDocument`] when there is no data row below the header.
pub fn parse(text: &str) -> Result<CsvDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(IngestError::EmptyDocument);
    }

    let headers: Vec<String> = split_fields(lines[0])
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = lines[1..]
        .iter()
        .map(|line| {
            let fields = split_fields(line);
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), fields.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect();

    Ok(CsvDocument { headers, rows })
}

/// Split one CSV line into fields.
///
/// A double quote toggles quoted mode and is dropped from the output; commas
/// inside quotes are literal. A doubled quote (`""`) therefore yields nothing
/// rather than an escaped quote, matching the behavior the backend's callers
/// already rely on.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let doc = parse("A,B,C\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(doc.headers, vec!["A", "B", "C"]);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[0]["A"], "1");
        assert_eq!(doc.rows[1]["C"], "6");
    }

    #[test]
    fn strips_bom_and_crlf() {
        let doc = parse("\u{feff}A,B\r\n1,2\r\n").unwrap();
        assert_eq!(doc.headers, vec!["A", "B"]);
        assert_eq!(doc.rows[0]["B"], "2");
    }

    #[test]
    fn trims_header_whitespace() {
        let doc = parse(" A , B \nx,y\n").unwrap();
        assert_eq!(doc.headers, vec!["A", "B"]);
    }

    #[test]
    fn quoted_field_keeps_commas() {
        let doc = parse("A,B\n\"hello, world\",2\n").unwrap();
        assert_eq!(doc.rows[0]["A"], "hello, world");
        assert_eq!(doc.rows[0]["B"], "2");
    }

    #[test]
    fn doubled_quote_is_dropped_not_unescaped() {
        // Matches existing behavior: quotes only toggle quoting.
        let doc = parse("A\n\"he said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(doc.rows[0]["A"], "he said hi");
    }

    #[test]
    fn short_row_maps_missing_fields_to_empty() {
        let doc = parse("A,B,C\n1,2\n").unwrap();
        assert_eq!(doc.rows[0]["B"], "2");
        assert_eq!(doc.rows[0]["C"], "");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let doc = parse("A,B\n1,2,3,4\n").unwrap();
        assert_eq!(doc.rows[0].len(), 2);
        assert_eq!(doc.rows[0]["B"], "2");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let doc = parse("A,B\n\n1,2\n   \n3,4\n").unwrap();
        assert_eq!(doc.rows.len(), 2);
    }

    #[test]
    fn header_only_is_empty_document() {
        assert!(matches!(parse("A,B,C\n"), Err(IngestError::EmptyDocument)));
    }

    #[test]
    fn empty_text_is_empty_document() {
        assert!(matches!(parse(""), Err(IngestError::EmptyDocument)));
    }
}
