#![forbid(unsafe_code)]

//! Raw rows to typed [`Table`].

use crate::error::{ImportError, ImportResult};
use crate::infer::TypeDetector;
use crate::options::ReadOptions;
use crate::source::RawTable;
use std::collections::HashSet;
use tabula_columnar::{Column, ColumnType, Parsers, Table};

/// Header names with blanks replaced by `c{index}` and repeats suffixed with `_{n}`.
pub fn column_names(raw: &[Option<String>]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for (i, name) in raw.iter().enumerate() {
        let base = name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("c{i}"), str::to_owned);
        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn cell<'r>(row: &'r [Option<String>], col: usize) -> Option<&'r str> {
    row.get(col).and_then(|c| c.as_deref())
}

fn is_absent(parsers: &Parsers, token: Option<&str>) -> bool {
    token.map_or(true, |t| parsers.is_missing_token(t))
}

/// Resolve one type per column, honouring the override priority before falling back to detection
/// over the first `options.sample_rows` rows.
pub fn resolve_column_types(
    names: &[String],
    rows: &[&[Option<String>]],
    options: &ReadOptions,
) -> ImportResult<Vec<ColumnType>> {
    let overrides = &options.column_types;
    if let Some(full) = &overrides.full {
        for key in full.keys() {
            if !names.iter().any(|n| n == key) {
                log::warn!("column type map names unknown column {key:?}");
            }
        }
    }

    let sample = match options.sample_rows {
        0 => rows.len(),
        n => n.min(rows.len()),
    };
    let detector = TypeDetector::new(&options.parsers, options.minimize_column_sizes);

    names
        .iter()
        .enumerate()
        .map(|(col, name)| {
            if let Some(full) = &overrides.full {
                return full
                    .get(name)
                    .copied()
                    .ok_or_else(|| ImportError::MissingColumnType {
                        column: name.clone(),
                    });
            }
            if let Some(ty) = overrides.partial.get(name) {
                return Ok(*ty);
            }
            if let Some(ty) = overrides.function.as_ref().and_then(|f| f(name)) {
                return Ok(ty);
            }
            let tokens = rows[..sample].iter().filter_map(|row| cell(row, col));
            Ok(detector.detect(tokens))
        })
        .collect()
}

/// Build a table from raw rows.
///
/// Rows whose cells are all absent are skipped. Rows shorter than the header are padded with
/// missing values; longer rows fail with [`ImportError::RaggedRow`].
pub fn build_table(raw: &RawTable, options: &ReadOptions) -> ImportResult<Table> {
    let names = column_names(&raw.column_names);
    let parsers = &options.parsers;

    let mut rows: Vec<&[Option<String>]> = Vec::with_capacity(raw.rows.len());
    let mut skipped = 0usize;
    for (index, row) in raw.rows.iter().enumerate() {
        if row.len() > names.len() {
            return Err(ImportError::RaggedRow {
                row: index,
                expected: names.len(),
                actual: row.len(),
            });
        }
        if row.iter().all(|c| is_absent(parsers, c.as_deref())) {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }
    if skipped > 0 {
        log::debug!("{}: skipped {skipped} rows with no values", raw.name);
    }

    let types = resolve_column_types(&names, &rows, options)?;

    let mut columns: Vec<Column> = names
        .iter()
        .zip(&types)
        .map(|(name, ty)| Column::empty(name.as_str(), *ty, ty.fits_compact(), rows.len()))
        .collect();
    for column in &columns {
        log::debug!(
            "{}: column {:?} resolved to {}{}",
            raw.name,
            column.name(),
            column.column_type(),
            column
                .as_number()
                .map(|n| format!(" ({})", n.representation()))
                .unwrap_or_default()
        );
    }

    for row in &rows {
        for (col, column) in columns.iter_mut().enumerate() {
            match cell(row, col) {
                Some(token) => {
                    let value = parsers.parse(types[col], &names[col], token)?;
                    column.append_value(&value)?;
                }
                None => column.append_missing(),
            }
        }
    }

    let mut table = Table::with_columns(table_name(options, &raw.name), columns)?;
    if options.remove_all_missing_columns {
        let removed = table.remove_columns_with_all_missing();
        if !removed.is_empty() {
            log::info!("{}: removed all-missing columns {removed:?}", table.name());
        }
    }
    Ok(table)
}

/// `"{table_name}#{sheet}"` when a table name is configured, else the sheet name.
pub fn table_name(options: &ReadOptions, sheet: &str) -> String {
    match options.table_name.as_deref() {
        Some(name) if sheet.is_empty() => name.to_owned(),
        Some(name) => format!("{name}#{sheet}"),
        None => sheet.to_owned(),
    }
}
