// src/source.rs
//! Lazy reader for `;`-separated record files.
//!
//! The first row is the header and names the fields of every following row. Input is
//! decoded as Windows-1252; bytes that have no character in that code page make the row
//! undecodable.

use crate::error::{ReportError, Result};
use encoding_rs::WINDOWS_1252;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DELIMITER: u8 = b';';

/// Byte values left undefined by the Windows-1252 code page.
const UNDEFINED_BYTES: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// One input row, keyed by header name.
pub type Record = BTreeMap<String, String>;

/// Iterator over the records of one input file. Reopen the file to restart.
pub struct RecordSource {
    path: PathBuf,
    headers: Vec<String>,
    rows: csv::ByteRecordsIntoIter<File>,
}

impl RecordSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| csv_error(&path, e))?;

        let headers = reader
            .byte_headers()
            .map_err(|e| csv_error(&path, e))?
            .iter()
            .map(|field| decode_field(&path, 1, field))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path,
            headers,
            rows: reader.into_byte_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn to_record(&self, row: &csv::ByteRecord) -> Result<Record> {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        // Short rows simply lack the trailing fields; surplus fields have no name and are dropped.
        self.headers
            .iter()
            .zip(row.iter())
            .map(|(name, raw)| Ok((name.clone(), decode_field(&self.path, line, raw)?)))
            .collect()
    }
}

impl Iterator for RecordSource {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(
            row.map_err(|e| csv_error(&self.path, e))
                .and_then(|row| self.to_record(&row)),
        )
    }
}

fn decode_field(path: &Path, line: u64, raw: &[u8]) -> Result<String> {
    if let Some(byte) = raw.iter().find(|b| UNDEFINED_BYTES.contains(b)) {
        return Err(ReportError::Format {
            file: path.to_path_buf(),
            line,
            message: format!("byte 0x{:02X} is not valid Windows-1252", byte),
        });
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(raw);
    Ok(text.into_owned())
}

fn csv_error(path: &Path, err: csv::Error) -> ReportError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ReportError::Io(io),
        _ => ReportError::Format {
            file: path.to_path_buf(),
            line,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn header_names_fields_and_is_not_emitted() {
        let file = csv_file(b"id;name\n1;Ann\n2;Bea\n");
        let source = RecordSource::open(file.path()).unwrap();
        assert_eq!(source.headers(), &["id".to_string(), "name".to_string()]);

        let records: Vec<Record> = source.collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "1");
        assert_eq!(records[1]["name"], "Bea");
    }

    #[test]
    fn short_rows_omit_missing_fields() {
        let file = csv_file(b"id;name;city\n1;Ann\n");
        let records: Vec<Record> = RecordSource::open(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0].len(), 2);
        assert!(!records[0].contains_key("city"));
    }

    #[test]
    fn decodes_windows_1252() {
        let file = csv_file(b"name\nM\xfcller \x80\n");
        let records: Vec<Record> = RecordSource::open(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0]["name"], "Müller €");
    }

    #[test]
    fn undefined_byte_is_a_format_error() {
        let file = csv_file(b"name\nok\nbad\x81\n");
        let results: Vec<Result<Record>> = RecordSource::open(file.path()).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(&results[1], Err(ReportError::Format { line: 3, .. })));
    }

    #[test]
    fn quoted_fields_may_contain_delimiter() {
        let file = csv_file(b"id;note\n1;\"a;b\"\n");
        let records: Vec<Record> = RecordSource::open(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0]["note"], "a;b");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = RecordSource::open("/definitely/not/here.csv");
        assert!(matches!(result, Err(ReportError::Io(_))));
    }
}
