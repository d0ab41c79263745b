#![forbid(unsafe_code)]

use crate::builder::build_table;
use crate::delimited::CsvReader;
use crate::error::{ImportError, ImportResult};
use crate::options::ReadOptions;
use crate::source::RawTable;
use std::collections::BTreeMap;
use tabula_columnar::{ColumnarError, IndexKind, Table};

/// Turns the bytes of one file format into raw sheets.
pub trait TableReader: Send + Sync {
    fn read_sheets(&self, bytes: &[u8]) -> ImportResult<Vec<RawTable>>;
}

/// Readers keyed by file extension.
///
/// A registry is an ordinary value: build one, register readers and pass it to whoever reads.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: BTreeMap<String, Box<dyn TableReader>>,
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `csv` and `tsv` readers with default options.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("csv", CsvReader::default());
        registry.register("tsv", CsvReader::tsv());
        registry
    }

    /// Register `reader` for `ext`, replacing any previous reader for it.
    pub fn register(&mut self, ext: &str, reader: impl TableReader + 'static) {
        self.readers.insert(normalize_extension(ext), Box::new(reader));
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> + '_ {
        self.readers.keys().map(String::as_str)
    }

    fn reader(&self, ext: &str) -> ImportResult<&dyn TableReader> {
        self.readers
            .get(&normalize_extension(ext))
            .map(|r| r.as_ref())
            .ok_or_else(|| ImportError::UnknownFormat(ext.to_owned()))
    }

    /// Read the sheet at `options.sheet_index`.
    pub fn read(&self, ext: &str, bytes: &[u8], options: &ReadOptions) -> ImportResult<Table> {
        let sheets = self.reader(ext)?.read_sheets(bytes)?;
        read_sheet(&sheets, options)
    }

    /// One table per sheet, in sheet order.
    pub fn read_all(
        &self,
        ext: &str,
        bytes: &[u8],
        options: &ReadOptions,
    ) -> ImportResult<Vec<Table>> {
        let sheets = self.reader(ext)?.read_sheets(bytes)?;
        read_all_sheets(&sheets, options)
    }
}

pub fn read_sheet(sheets: &[RawTable], options: &ReadOptions) -> ImportResult<Table> {
    let sheet = sheets
        .get(options.sheet_index)
        .ok_or(ColumnarError::IndexOutOfRange {
            kind: IndexKind::Sheet,
            index: options.sheet_index,
            len: sheets.len(),
        })?;
    build_table(sheet, options)
}

pub fn read_all_sheets(sheets: &[RawTable], options: &ReadOptions) -> ImportResult<Vec<Table>> {
    sheets.iter().map(|sheet| build_table(sheet, options)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct TwoSheets;

    impl TableReader for TwoSheets {
        fn read_sheets(&self, _bytes: &[u8]) -> ImportResult<Vec<RawTable>> {
            let mut first = RawTable::new("first").with_header(&["n"]);
            first.push_row(&["1"]);
            let mut second = RawTable::new("second").with_header(&["s"]);
            second.push_row(&["x"]);
            Ok(vec![first, second])
        }
    }

    #[test]
    fn dispatches_by_extension() {
        let registry = ReaderRegistry::with_defaults();
        assert_eq!(registry.extensions().collect::<Vec<_>>(), vec!["csv", "tsv"]);
        let table = registry
            .read(".CSV", b"a\n1\n", &ReadOptions::default())
            .unwrap();
        assert_eq!(table.row_count(), 1);
        assert!(matches!(
            registry.read("ods", b"", &ReadOptions::default()),
            Err(ImportError::UnknownFormat(ext)) if ext == "ods"
        ));
    }

    #[test]
    fn selects_sheet_by_index() {
        let mut registry = ReaderRegistry::new();
        registry.register("book", TwoSheets);

        let options = ReadOptions::default().with_sheet_index(1).with_table_name("wb");
        let table = registry.read("book", b"", &options).unwrap();
        assert_eq!(table.name(), "wb#second");
        assert_eq!(table.column_names(), vec!["s"]);

        let err = registry
            .read("book", b"", &ReadOptions::default().with_sheet_index(2))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Columnar(ColumnarError::IndexOutOfRange {
                kind: IndexKind::Sheet,
                index: 2,
                len: 2
            })
        ));

        let all = registry.read_all("book", b"", &ReadOptions::default()).unwrap();
        let names: Vec<&str> = all.iter().map(Table::name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
