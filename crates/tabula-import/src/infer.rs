#![forbid(unsafe_code)]

//! Column type detection over a sample of raw tokens.

use tabula_columnar::{parse_bool, ColumnType, Parsers};

/// Candidates in the order they are tried; the first type every sampled token satisfies wins.
const DEFAULT_ORDER: &[ColumnType] = &[
    ColumnType::DateTimeOffset,
    ColumnType::DateTime,
    ColumnType::Date,
    ColumnType::Boolean,
    ColumnType::Integer,
    ColumnType::Long,
    ColumnType::Double,
];

const MINIMIZED_ORDER: &[ColumnType] = &[
    ColumnType::DateTimeOffset,
    ColumnType::DateTime,
    ColumnType::Date,
    ColumnType::Boolean,
    ColumnType::Short,
    ColumnType::Integer,
    ColumnType::Long,
    ColumnType::Float,
    ColumnType::Double,
];

pub struct TypeDetector<'a> {
    parsers: &'a Parsers,
    candidates: &'static [ColumnType],
}

impl<'a> TypeDetector<'a> {
    pub fn new(parsers: &'a Parsers, minimize_column_sizes: bool) -> Self {
        Self {
            parsers,
            candidates: if minimize_column_sizes {
                MINIMIZED_ORDER
            } else {
                DEFAULT_ORDER
            },
        }
    }

    /// Narrowest type accepting every present token; `Text` when nothing else fits or when
    /// the sample holds no present token at all.
    pub fn detect<'t>(&self, tokens: impl IntoIterator<Item = &'t str>) -> ColumnType {
        let present: Vec<&str> = tokens
            .into_iter()
            .filter(|t| !self.parsers.is_missing_token(t))
            .collect();
        if present.is_empty() {
            return ColumnType::Text;
        }

        self.candidates
            .iter()
            .copied()
            .find(|ty| self.accepts_all(*ty, &present))
            .unwrap_or(ColumnType::Text)
    }

    fn accepts_all(&self, column_type: ColumnType, present: &[&str]) -> bool {
        match column_type {
            // `0`/`1` alone read better as integers.
            ColumnType::Boolean => {
                let mut saw_text_bool = false;
                for token in present {
                    let v = token.trim();
                    if parse_bool(v).is_none() {
                        return false;
                    }
                    if v != "0" && v != "1" {
                        saw_text_bool = true;
                    }
                }
                saw_text_bool
            }
            ColumnType::Float => present.iter().all(|t| {
                self.parsers
                    .parse_f64(t.trim())
                    .is_some_and(|d| d.is_nan() || (d as f32) as f64 == d)
                    && self.parsers.can_parse(ColumnType::Float, t)
            }),
            _ => present
                .iter()
                .all(|t| self.parsers.can_parse(column_type, t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_columnar::{DateOrder, Locale};

    fn detect(tokens: &[&str]) -> ColumnType {
        let parsers = Parsers::default();
        TypeDetector::new(&parsers, false).detect(tokens.iter().copied())
    }

    fn detect_min(tokens: &[&str]) -> ColumnType {
        let parsers = Parsers::default();
        TypeDetector::new(&parsers, true).detect(tokens.iter().copied())
    }

    #[test]
    fn narrowest_type_wins() {
        assert_eq!(detect(&["1", "2", "", "3"]), ColumnType::Integer);
        assert_eq!(detect(&["1", "3000000000"]), ColumnType::Long);
        assert_eq!(detect(&["1", "2.5"]), ColumnType::Double);
        assert_eq!(detect(&["1,234", "-(5)"]), ColumnType::Text);
        assert_eq!(detect(&["1,234", "(5)"]), ColumnType::Integer);
        assert_eq!(detect(&["2024-01-02", "2024-03-04"]), ColumnType::Date);
        assert_eq!(detect(&["2024-01-02 10:00:00"]), ColumnType::DateTime);
        assert_eq!(detect(&["2024-01-02T10:00:00+02:00"]), ColumnType::DateTimeOffset);
        assert_eq!(detect(&["x", "1"]), ColumnType::Text);
    }

    #[test]
    fn mixed_decimal_and_text_is_text() {
        assert_eq!(detect(&["123.0", "abc"]), ColumnType::Text);
    }

    #[test]
    fn blank_tokens_never_force_text() {
        assert_eq!(detect(&["", "  ", "NA", "7"]), ColumnType::Integer);
        assert_eq!(detect(&["", "NA"]), ColumnType::Text);
    }

    #[test]
    fn booleans_need_a_textual_token() {
        assert_eq!(detect(&["0", "1", "1"]), ColumnType::Integer);
        assert_eq!(detect(&["yes", "0", "N"]), ColumnType::Boolean);
    }

    #[test]
    fn minimized_sizes() {
        assert_eq!(detect_min(&["1", "-200"]), ColumnType::Short);
        assert_eq!(detect_min(&["40000"]), ColumnType::Integer);
        assert_eq!(detect_min(&["0.5", "1.25"]), ColumnType::Float);
        assert_eq!(detect_min(&["0.1"]), ColumnType::Double);
        assert_eq!(detect(&["1", "-200"]), ColumnType::Integer);
    }

    #[test]
    fn locale_changes_number_detection() {
        let parsers = Parsers::with_locale(Locale::new(',', DateOrder::Dmy));
        let detector = TypeDetector::new(&parsers, false);
        assert_eq!(detector.detect(["1.234,5", "2,25"]), ColumnType::Double);
        assert_eq!(detector.detect(["31/12/2024"]), ColumnType::Date);
    }
}
