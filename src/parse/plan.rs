// src/parse/plan.rs

use crate::error::{IngestError, Result};
use crate::parse::CsvDocument;
use serde::Serialize;
use std::collections::BTreeMap;

/// Header names the variables bulk-upload endpoint requires. Extra columns
/// are allowed and passed through untouched.
pub const REQUIRED_VARIABLE_COLUMNS: &[&str] = &[
    "Sector", "Domain", "Country", "Part", "Section", "Group", "Variable",
];

/// A contiguous run of data rows destined for one chunk-upload request.
///
/// `start_row_index` is the 1-based line number of the chunk's first row in
/// the original file (the header is line 1), so backend error messages can
/// point at the file the user actually edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub rows: Vec<BTreeMap<String, String>>,
    pub start_row_index: u32,
}

/// How a document should reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Small file: send the raw CSV as one multipart upload.
    SingleShot,
    /// Large file: send these chunks sequentially.
    Chunked(Vec<Chunk>),
}

/// Validate the header contract and decide the upload strategy.
///
/// Documents with at most `single_shot_threshold` rows take the single-shot
/// path; larger ones are partitioned into order-preserving chunks of at most
/// `chunk_size` rows. Fails with [`IngestError::MissingColumns`] naming
/// exactly the required columns absent from the header.
pub fn plan(
    doc: &CsvDocument,
    required_columns: &[&str],
    single_shot_threshold: usize,
    chunk_size: usize,
) -> Result<UploadPlan> {
    let mut missing: Vec<String> = required_columns
        .iter()
        .filter(|c| !doc.headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(IngestError::MissingColumns(missing));
    }

    if doc.rows.len() <= single_shot_threshold {
        return Ok(UploadPlan::SingleShot);
    }

    let chunks = doc
        .rows
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, rows)| Chunk {
            rows: rows.to_vec(),
            // +2: 1-based lines, plus the header on line 1.
            start_row_index: (i * chunk_size + 2) as u32,
        })
        .collect();

    Ok(UploadPlan::Chunked(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn doc_with_rows(n: usize) -> CsvDocument {
        let mut text = String::from("Sector,Domain,Country,Part,Section,Group,Variable\n");
        for i in 0..n {
            text.push_str(&format!("s{i},d,c,p,sec,g,v{i}\n"));
        }
        parse::parse(&text).unwrap()
    }

    #[test]
    fn small_document_is_single_shot() {
        let doc = doc_with_rows(80);
        let plan = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap();
        assert_eq!(plan, UploadPlan::SingleShot);
    }

    #[test]
    fn eighty_one_rows_make_two_chunks() {
        let doc = doc_with_rows(81);
        let plan = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap();
        let UploadPlan::Chunked(chunks) = plan else {
            panic!("expected chunked plan");
        };
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].rows.len(), 80);
        assert_eq!(chunks[1].rows.len(), 1);
        assert_eq!(chunks[0].start_row_index, 2);
        assert_eq!(chunks[1].start_row_index, 82);
    }

    #[test]
    fn chunks_preserve_row_order() {
        let doc = doc_with_rows(200);
        let plan = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap();
        let UploadPlan::Chunked(chunks) = plan else {
            panic!("expected chunked plan");
        };
        let flattened: Vec<_> = chunks.iter().flat_map(|c| c.rows.iter()).collect();
        assert_eq!(flattened.len(), doc.rows.len());
        for (got, want) in flattened.iter().zip(doc.rows.iter()) {
            assert_eq!(*got, want);
        }
    }

    #[test]
    fn planning_is_idempotent() {
        let doc = doc_with_rows(250);
        let a = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap();
        let b = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_column_names_exactly_the_gap() {
        let doc = parse::parse("Sector,Domain,Country,Part,Section,Variable\na,b,c,d,e,f\n").unwrap();
        let err = plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).unwrap_err();
        match err {
            IngestError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["Group".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extra_columns_are_fine() {
        let doc = parse::parse(
            "Sector,Domain,Country,Part,Section,Group,Variable,Notes\na,b,c,d,e,f,g,h\n",
        )
        .unwrap();
        assert!(plan(&doc, REQUIRED_VARIABLE_COLUMNS, 80, 80).is_ok());
    }
}
