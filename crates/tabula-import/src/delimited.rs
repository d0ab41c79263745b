#![forbid(unsafe_code)]

use crate::error::{ImportError, ImportResult};
use crate::registry::TableReader;
use crate::source::RawTable;
use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsvTextEncoding {
    /// Attempt to decode as UTF-8; if a field contains invalid UTF-8, fall back to Windows-1252.
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: CsvTextEncoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            encoding: CsvTextEncoding::Auto,
        }
    }
}

/// Delimited text as a single unnamed sheet.
#[derive(Clone, Debug, Default)]
pub struct CsvReader {
    options: CsvOptions,
}

impl CsvReader {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn tsv() -> Self {
        Self::new(CsvOptions {
            delimiter: b'\t',
            ..CsvOptions::default()
        })
    }

    pub fn read(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            // Headers are handled here so BOM stripping and decoding apply to them too.
            .has_headers(false)
            // Ragged rows are reported by the table builder.
            .flexible(true)
            .from_reader(bytes);

        let mut record = ByteRecord::new();
        let mut record_index: u64 = 0;
        let mut raw = RawTable::default();

        loop {
            record.clear();
            match csv_reader.read_byte_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    record_index += 1;
                    let row = decode_record(&record, record_index, self.options.encoding)?;
                    if record_index == 1 && self.options.has_header {
                        raw.column_names = row;
                    } else {
                        raw.rows.push(row);
                    }
                }
                Err(e) => return Err(map_csv_error(e, record_index + 1)),
            }
        }

        if record_index == 0 {
            return Err(ImportError::EmptyInput);
        }
        if !self.options.has_header {
            let width = raw.rows.iter().map(Vec::len).max().unwrap_or(0);
            raw.column_names = vec![None; width];
        }
        Ok(raw)
    }
}

impl TableReader for CsvReader {
    fn read_sheets(&self, bytes: &[u8]) -> ImportResult<Vec<RawTable>> {
        Ok(vec![self.read(bytes)?])
    }
}

fn decode_record(
    record: &ByteRecord,
    row: u64,
    encoding: CsvTextEncoding,
) -> ImportResult<Vec<Option<String>>> {
    let mut out = Vec::with_capacity(record.len());
    for (idx, field) in record.iter().enumerate() {
        let s = decode_field(field, row, idx as u64 + 1, encoding)?;
        out.push(Some(s.into_owned()).filter(|s| !s.is_empty()));
    }
    Ok(out)
}

fn decode_field<'a>(
    field: &'a [u8],
    row: u64,
    column: u64,
    encoding: CsvTextEncoding,
) -> ImportResult<Cow<'a, str>> {
    // UTF-8 BOM at the start of the file, as written by Excel.
    let field = if row == 1 && column == 1 && field.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &field[3..]
    } else {
        field
    };

    match encoding {
        CsvTextEncoding::Utf8 => std::str::from_utf8(field)
            .map(Cow::Borrowed)
            .map_err(|e| ImportError::Csv {
                row,
                reason: format!("column {column}: invalid UTF-8: {e}"),
            }),
        CsvTextEncoding::Windows1252 => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            Ok(cow)
        }
        CsvTextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(_) => {
                let (cow, _, _) = WINDOWS_1252.decode(field);
                Ok(cow)
            }
        },
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> ImportError {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => ImportError::Io(e),
        _ => {
            let row = pos
                .map(|p| p.record())
                .filter(|r| *r > 0)
                .unwrap_or(fallback_row);
            ImportError::Csv { row, reason }
        }
    }
}
