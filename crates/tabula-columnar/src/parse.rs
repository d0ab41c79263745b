#![forbid(unsafe_code)]

//! Per-type token parsers.
//!
//! Every column type shares one [`Parsers`] configuration (locale, optional date formats and
//! the tokens that count as absent). Parsing a present token either yields a [`Value`] of the
//! requested type or fails with [`ColumnarError::Parse`] naming the owning column.

use crate::error::{ColumnarError, ColumnarResult};
use crate::types::{ColumnType, Value, MISSING_F32_BITS, MISSING_F64_BITS};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Preferred order for ambiguous numeric dates like `01/02/2024`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateOrder {
    /// Month / day / year (e.g. `12/31/2024`).
    #[default]
    Mdy,
    /// Day / month / year (e.g. `31/12/2024`).
    Dmy,
    /// Year / month / day (e.g. `2024/12/31`).
    Ymd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Decimal separator used when parsing numbers.
    ///
    /// `.` matches inputs like `1,234.56`. `,` matches inputs like `1.234,56`.
    pub decimal_separator: char,
    pub date_order: DateOrder,
}

impl Locale {
    pub const fn new(decimal_separator: char, date_order: DateOrder) -> Self {
        Self {
            decimal_separator,
            date_order,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new('.', DateOrder::Mdy)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parsers {
    pub locale: Locale,
    /// `chrono` format string for date columns; overrides the built-in patterns.
    pub date_format: Option<String>,
    /// `chrono` format string for date-time columns; overrides the built-in patterns.
    pub date_time_format: Option<String>,
    /// Tokens (compared after trimming) that mean "absent" in addition to blank tokens.
    pub missing_value_indicators: Vec<String>,
}

impl Default for Parsers {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            date_format: None,
            date_time_format: None,
            missing_value_indicators: vec!["NA".to_owned(), "N/A".to_owned(), "null".to_owned()],
        }
    }
}

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const NAMED_MONTH_DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%d %b %Y", "%b %d, %Y", "%B %d, %Y"];
const MDY_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];
const DMY_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y"];

const ISO_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const MDY_DATE_TIME_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S%.f", "%m/%d/%Y %H:%M"];
const DMY_DATE_TIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S%.f", "%d/%m/%Y %H:%M"];

const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

impl Parsers {
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    /// Blank tokens and configured missing indicators are absent for every type.
    pub fn is_missing_token(&self, token: &str) -> bool {
        let t = token.trim();
        t.is_empty() || self.missing_value_indicators.iter().any(|m| m == t)
    }

    /// Parse `token` as `column_type` on behalf of `column`.
    ///
    /// Absent tokens yield [`Value::Missing`]; a present token that is not a valid literal for the
    /// type fails with [`ColumnarError::Parse`].
    pub fn parse(
        &self,
        column_type: ColumnType,
        column: &str,
        token: &str,
    ) -> ColumnarResult<Value> {
        if self.is_missing_token(token) {
            return Ok(Value::Missing);
        }
        self.parse_present(column_type, token)
            .ok_or_else(|| ColumnarError::Parse {
                column: column.to_owned(),
                token: token.to_owned(),
                column_type,
            })
    }

    /// Whether `token` is acceptable for `column_type`. Absent tokens fit every type.
    pub fn can_parse(&self, column_type: ColumnType, token: &str) -> bool {
        self.is_missing_token(token) || self.parse_present(column_type, token).is_some()
    }

    fn parse_present(&self, column_type: ColumnType, token: &str) -> Option<Value> {
        let v = token.trim();
        match column_type {
            ColumnType::Text => Some(Value::Text(Arc::from(token))),
            // The ranges exclude each type's sentinel, and cap LONG at what f64 holds exactly.
            ColumnType::Short | ColumnType::Integer | ColumnType::Long => {
                let (min, max) = column_type.integer_range()?;
                self.parse_i64(v)
                    .filter(|n| (min..=max).contains(n))
                    .map(Value::Integer)
            }
            ColumnType::Float => self.parse_f32(v).map(|f| Value::Number(f as f64)),
            ColumnType::Double => self
                .parse_f64(v)
                .filter(|d| d.to_bits() != MISSING_F64_BITS)
                .map(Value::Number),
            ColumnType::Boolean => parse_bool(v).map(Value::Boolean),
            ColumnType::Date => self.parse_date(v).map(Value::Date),
            ColumnType::DateTime => self.parse_date_time(v).map(Value::DateTime),
            ColumnType::DateTimeOffset => self.parse_date_time_offset(v).map(Value::DateTimeOffset),
        }
    }

    /// Parse an integral literal, stripping grouping separators. Decimal points and exponents
    /// are rejected.
    pub fn parse_i64(&self, v: &str) -> Option<i64> {
        let (sign, body) = split_sign_and_body(v);
        let mut digits = String::with_capacity(body.len() + 1);
        if sign < 0 {
            digits.push('-');
        }
        let mut saw_digit = false;
        for ch in body.chars() {
            if ch.is_ascii_digit() {
                saw_digit = true;
                digits.push(ch);
            } else if is_grouping_separator(ch, self.locale.decimal_separator) {
                continue;
            } else {
                return None;
            }
        }
        if !saw_digit {
            return None;
        }
        digits.parse().ok()
    }

    pub fn parse_f64(&self, v: &str) -> Option<f64> {
        let (sign, body) = split_sign_and_body(v);
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        if let Some(special) = parse_special_float(body) {
            return Some(special * sign as f64);
        }

        let normalized = normalize_number(body, self.locale.decimal_separator)?;
        let parsed: f64 = normalized.parse().ok()?;
        Some(parsed * sign as f64)
    }

    /// Parse a single-precision literal; values that overflow `f32` are rejected.
    pub fn parse_f32(&self, v: &str) -> Option<f32> {
        let d = self.parse_f64(v)?;
        let f = d as f32;
        if d.is_finite() && !f.is_finite() {
            return None;
        }
        if f.to_bits() == MISSING_F32_BITS {
            return None;
        }
        Some(f)
    }

    pub fn parse_date(&self, v: &str) -> Option<NaiveDate> {
        if let Some(fmt) = &self.date_format {
            return NaiveDate::parse_from_str(v, fmt).ok();
        }
        self.ordered_formats(ISO_DATE_FORMATS, MDY_DATE_FORMATS, DMY_DATE_FORMATS)
            .chain(NAMED_MONTH_DATE_FORMATS.iter().copied())
            .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
    }

    pub fn parse_date_time(&self, v: &str) -> Option<NaiveDateTime> {
        if let Some(fmt) = &self.date_time_format {
            return NaiveDateTime::parse_from_str(v, fmt).ok();
        }
        self.ordered_formats(
            ISO_DATE_TIME_FORMATS,
            MDY_DATE_TIME_FORMATS,
            DMY_DATE_TIME_FORMATS,
        )
        .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
    }

    pub fn parse_date_time_offset(&self, v: &str) -> Option<DateTime<FixedOffset>> {
        if let Some(fmt) = &self.date_time_format {
            if let Ok(parsed) = DateTime::parse_from_str(v, fmt) {
                return Some(parsed);
            }
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(v) {
            return Some(parsed);
        }
        OFFSET_DATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(v, fmt).ok())
    }

    /// ISO patterns first, then the locale's preferred order, then the other order so that
    /// unambiguous inputs like `31/12/2024` still parse under a month-first locale.
    fn ordered_formats(
        &self,
        iso: &'static [&'static str],
        mdy: &'static [&'static str],
        dmy: &'static [&'static str],
    ) -> impl Iterator<Item = &'static str> {
        let (first, second) = match self.locale.date_order {
            DateOrder::Dmy => (dmy, mdy),
            DateOrder::Mdy | DateOrder::Ymd => (mdy, dmy),
        };
        iso.iter().chain(first).chain(second).copied()
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_special_float(body: &str) -> Option<f64> {
    if body.eq_ignore_ascii_case("nan") {
        Some(f64::NAN)
    } else if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
        Some(f64::INFINITY)
    } else {
        None
    }
}

fn normalize_number(s: &str, decimal_separator: char) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut saw_digit = false;
    let mut saw_decimal = false;
    let mut saw_exp = false;
    let mut saw_exp_sign = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            saw_digit = true;
            out.push(ch);
            continue;
        }

        if !saw_exp && ch == decimal_separator {
            if saw_decimal {
                return None;
            }
            saw_decimal = true;
            out.push('.');
            continue;
        }

        if !saw_decimal && is_grouping_separator(ch, decimal_separator) {
            continue;
        }

        if !saw_exp && matches!(ch, 'e' | 'E') {
            if !saw_digit {
                return None;
            }
            saw_exp = true;
            out.push('e');
            continue;
        }

        // Exponent sign is only valid immediately after `e` / `E`.
        if saw_exp && !saw_exp_sign && matches!(ch, '+' | '-') && out.ends_with('e') {
            saw_exp_sign = true;
            out.push(ch);
            continue;
        }

        return None;
    }

    if !saw_digit || out.ends_with('e') || out.ends_with("e+") || out.ends_with("e-") {
        return None;
    }
    Some(out)
}

fn split_sign_and_body(mut s: &str) -> (i64, &str) {
    s = s.trim();
    let mut sign: i64 = 1;

    // Accounting notation: `(12.50)` is negative.
    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        sign = -1;
        s = inner.trim();
    }

    if let Some(rest) = s.strip_prefix('-') {
        sign = -sign;
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start();
    }

    (sign, s)
}

fn is_grouping_separator(ch: char, decimal_separator: char) -> bool {
    match ch {
        ',' => decimal_separator != ',',
        '.' => decimal_separator != '.',
        ' ' | '\u{00A0}' | '\u{202F}' | '_' | '\'' | '’' => true,
        _ => false,
    }
}
