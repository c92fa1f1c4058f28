//! Glossary CSV loading
//!
//! Reads bilingual term pairs from CSV files. The first two columns are
//! source and target; extra columns are ignored. Rows with an empty or
//! placeholder side are dropped during cleaning.

use std::path::Path;
use thiserror::Error;

use crate::index::ReferenceEntry;

/// Errors from corpus loading and persistence
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("glossary needs at least 2 columns, found {0}")]
    TooFewColumns(usize),

    #[error("glossary contained no usable entries")]
    Empty,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Load term pairs from a CSV file
///
/// The header row is required. Returns [`CorpusError::Empty`] when no row
/// survives cleaning.
pub fn load_csv(path: &Path) -> Result<Vec<ReferenceEntry>, CorpusError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?;
    if headers.len() < 2 {
        return Err(CorpusError::TooFewColumns(headers.len()));
    }

    let mut raw = Vec::new();
    for record in reader.records() {
        let record = record?;
        let source = record.get(0).unwrap_or("").to_string();
        let target = record.get(1).unwrap_or("").to_string();
        raw.push((source, target));
    }

    let entries = clean_pairs(raw);
    if entries.is_empty() {
        return Err(CorpusError::Empty);
    }

    tracing::info!(entries = entries.len(), path = %path.display(), "Loaded glossary CSV");
    Ok(entries)
}

/// Trim pairs and drop unusable rows
///
/// A row is unusable when either side is empty after trimming or is a
/// spreadsheet "nan" placeholder.
pub fn clean_pairs(raw: Vec<(String, String)>) -> Vec<ReferenceEntry> {
    raw.into_iter()
        .filter_map(|(source, target)| {
            let source = source.trim();
            let target = target.trim();
            if source.is_empty() || target.is_empty() {
                return None;
            }
            if source.eq_ignore_ascii_case("nan") || target.eq_ignore_ascii_case("nan") {
                return None;
            }
            Some(ReferenceEntry::new(source, target))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_pairs_drops_bad_rows() {
        let raw = vec![
            ("chicken breast".to_string(), "صدر دجاج".to_string()),
            ("  salt  ".to_string(), " ملح ".to_string()),
            ("".to_string(), "ملح".to_string()),
            ("sugar".to_string(), "   ".to_string()),
            ("nan".to_string(), "شيء".to_string()),
            ("thing".to_string(), "NaN".to_string()),
        ];

        let entries = clean_pairs(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, "chicken breast");
        assert_eq!(entries[1].source, "salt");
        assert_eq!(entries[1].target, "ملح");
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glossary.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "english,arabic").unwrap();
        writeln!(file, "chicken breast,صدر دجاج").unwrap();
        writeln!(file, "salt,ملح").unwrap();

        let entries = load_csv(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].combined, "chicken breast | صدر دجاج");
    }

    #[test]
    fn test_load_csv_too_few_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "english").unwrap();
        writeln!(file, "salt").unwrap();

        assert!(matches!(
            load_csv(&path),
            Err(CorpusError::TooFewColumns(1))
        ));
    }

    #[test]
    fn test_load_csv_all_rows_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "english,arabic").unwrap();
        writeln!(file, "nan,nan").unwrap();
        writeln!(file, " , ").unwrap();

        assert!(matches!(load_csv(&path), Err(CorpusError::Empty)));
    }
}
