#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tabula_columnar::{ColumnType, Locale, Parsers};

/// Maps a column name to a type, or declines with `None` (the column is then detected).
pub type ColumnTypeFn = Arc<dyn Fn(&str) -> Option<ColumnType> + Send + Sync>;

/// Caller-supplied column types.
///
/// Resolution order for each column: `full` (which must name every column) > `partial` >
/// `function` > detection.
#[derive(Clone, Default)]
pub struct TypeOverrides {
    pub full: Option<HashMap<String, ColumnType>>,
    pub partial: HashMap<String, ColumnType>,
    pub function: Option<ColumnTypeFn>,
}

impl fmt::Debug for TypeOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOverrides")
            .field("full", &self.full)
            .field("partial", &self.partial)
            .field("function", &self.function.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl TypeOverrides {
    pub fn is_empty(&self) -> bool {
        self.full.is_none() && self.partial.is_empty() && self.function.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct ReadOptions {
    pub column_types: TypeOverrides,
    /// Drop columns in which every value is missing.
    pub remove_all_missing_columns: bool,
    pub parsers: Parsers,
    /// Rows inspected per column during detection; `0` inspects every row.
    pub sample_rows: usize,
    /// Let detection choose `Short` and `Float` when the sample fits them.
    pub minimize_column_sizes: bool,
    /// Sheet read by single-table entry points.
    pub sheet_index: usize,
    pub table_name: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            column_types: TypeOverrides::default(),
            remove_all_missing_columns: false,
            parsers: Parsers::default(),
            sample_rows: 100,
            minimize_column_sizes: false,
            sheet_index: 0,
            table_name: None,
        }
    }
}

impl ReadOptions {
    /// Types for every column. Building fails if a column is not named here.
    pub fn with_column_types(mut self, types: HashMap<String, ColumnType>) -> Self {
        self.column_types.full = Some(types);
        self
    }

    /// Types for some columns; the rest are detected.
    pub fn with_partial_column_types(mut self, types: HashMap<String, ColumnType>) -> Self {
        self.column_types.partial = types;
        self
    }

    pub fn with_column_type_fn(
        mut self,
        f: impl Fn(&str) -> Option<ColumnType> + Send + Sync + 'static,
    ) -> Self {
        self.column_types.function = Some(Arc::new(f));
        self
    }

    pub fn with_remove_all_missing_columns(mut self, remove: bool) -> Self {
        self.remove_all_missing_columns = remove;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.parsers.locale = locale;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.parsers.date_format = Some(format.into());
        self
    }

    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.parsers.date_time_format = Some(format.into());
        self
    }

    pub fn with_missing_value_indicators<S: Into<String>>(
        mut self,
        indicators: impl IntoIterator<Item = S>,
    ) -> Self {
        self.parsers.missing_value_indicators = indicators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_minimize_column_sizes(mut self, minimize: bool) -> Self {
        self.minimize_column_sizes = minimize;
        self
    }

    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = index;
        self
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let options = ReadOptions::default();
        assert_eq!(options.sample_rows, 100);
        assert_eq!(options.sheet_index, 0);
        assert!(options.column_types.is_empty());
        assert_eq!(
            options.parsers.missing_value_indicators,
            vec!["NA".to_owned(), "N/A".to_owned(), "null".to_owned()]
        );
    }

    #[test]
    fn full_type_map_loads_from_json() {
        let types: HashMap<String, ColumnType> =
            serde_json::from_str(r#"{"id": "short", "when": "date_time"}"#).unwrap();
        let options = ReadOptions::default()
            .with_column_types(types)
            .with_missing_value_indicators(["-"]);
        let full = options.column_types.full.as_ref().unwrap();
        assert_eq!(full["id"], ColumnType::Short);
        assert_eq!(full["when"], ColumnType::DateTime);
        assert_eq!(options.parsers.missing_value_indicators, vec!["-".to_owned()]);
    }
}
