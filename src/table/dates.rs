//! Date conversion for [`Table`] columns.
//!
//! Two conventions are recognized by column name:
//!
//! * Columns whose name contains `date` (any case) hold epoch milliseconds, as returned by the
//!   sales endpoints (`purchase.approved_date`, `purchase.order_date`, ...). They are converted
//!   to UTC date-times by [`Table::convert_epoch_dates`].
//! * Columns whose name contains `date ` or `data ` (with the trailing space, any case) hold
//!   date strings, as in spreadsheet exports (`Data de Venda`, `Approved Date Local`, ...).
//!   [`Table::convert_date_strings`] parses them as UTC and shifts them to a fixed offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use super::{Cell, Table};
use crate::types::Value;

const DATE_STRING_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Converts epoch milliseconds to a UTC date-time. `None` when out of range.
#[must_use]
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Parses a date string, reading it as UTC when it carries no offset.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]` and `DD/MM/YYYY[ HH:MM[:SS]]`.
#[must_use]
pub fn parse_date_string(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc));
    }

    DATE_STRING_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_ONLY_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
}

pub(crate) fn is_epoch_date_column(name: &str) -> bool {
    name.to_lowercase().contains("date")
}

pub(crate) fn is_date_string_column(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("date ") || name.contains("data ")
}

fn epoch_cell(cell: &Cell) -> Option<Cell> {
    let Cell::Value(Value::Number(number)) = cell else {
        return None;
    };

    #[expect(
        clippy::cast_possible_truncation,
        reason = "fractional milliseconds are dropped"
    )]
    let millis = number
        .as_i64()
        .or_else(|| number.as_f64().map(|millis| millis as i64))?;

    from_epoch_millis(millis).map(|date_time| Cell::DateTime(date_time.fixed_offset()))
}

impl Table {
    /// Converts every column whose name contains `date` from epoch milliseconds to UTC
    /// date-times.
    ///
    /// Integer and float cells are converted; nulls and any other values are left as they are.
    /// Returns the number of columns considered.
    pub fn convert_epoch_dates(&mut self) -> usize {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| is_epoch_date_column(name))
            .map(|(i, _)| i)
            .collect();

        for &index in &indices {
            for cell in self.cells_mut(index) {
                if let Some(converted) = epoch_cell(cell) {
                    *cell = converted;
                }
            }
        }

        indices.len()
    }

    /// Converts every column whose name contains `date ` or `data ` from date strings to
    /// date-times at `offset`.
    ///
    /// Strings are read as UTC and shifted to `offset`; date-times already converted are only
    /// shifted. Values that cannot be parsed become [`Cell::Null`]. Returns the number of
    /// columns considered.
    pub fn convert_date_strings(&mut self, offset: FixedOffset) -> usize {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| is_date_string_column(name))
            .map(|(i, _)| i)
            .collect();

        for &index in &indices {
            for cell in self.cells_mut(index) {
                let converted = match &*cell {
                    Cell::DateTime(date_time) => Cell::DateTime(date_time.with_timezone(&offset)),
                    Cell::Value(Value::String(text)) => parse_date_string(text)
                        .map_or(Cell::Null, |date_time| {
                            Cell::DateTime(date_time.with_timezone(&offset))
                        }),
                    _ => Cell::Null,
                };
                *cell = converted;
            }
        }

        indices.len()
    }
}
