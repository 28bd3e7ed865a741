//! Tabular view over sales records.
//!
//! A [`Table`] is built from a sequence of JSON objects: one row per object, one column per key
//! seen in any object (first-seen order), with [`Cell::Null`] where a row lacks a key. Columns
//! holding nested objects can then be flattened into `<column>.<key>` columns, and date columns
//! converted (see [`dates`]).

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::Result;
use crate::error::Error;
use crate::types::{Map, Value};

pub mod dates;

/// A single value of a [`Table`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing key or JSON `null`.
    Null,
    /// Any JSON value other than `null` or an object.
    Value(Value),
    /// A JSON object, until its column is flattened.
    Nested(Map<String, Value>),
    /// A converted date column value.
    DateTime(DateTime<FixedOffset>),
}

impl Cell {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Nested(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::DateTime(date_time) => Some(date_time),
            _ => None,
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Object(map) => Self::Nested(map),
            other => Self::Value(other),
        }
    }
}

/// What a column holds, judged over every row.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every cell is null (or the table has no rows).
    Empty,
    /// Every non-null cell is a plain JSON value.
    Scalar,
    /// Every non-null cell is a nested object.
    Nested,
    /// Every non-null cell is a date-time.
    DateTime,
    /// Non-null cells of different kinds.
    Mixed,
}

impl ColumnKind {
    fn of(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Null => None,
            Cell::Value(_) => Some(Self::Scalar),
            Cell::Nested(_) => Some(Self::Nested),
            Cell::DateTime(_) => Some(Self::DateTime),
        }
    }
}

/// Rows and columns of sales data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'table> {
    columns: &'table [String],
    cells: &'table [Cell],
}

impl<'table> Row<'table> {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'table Cell> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.cells.get(index)
    }

    #[must_use]
    pub fn cells(&self) -> &'table [Cell] {
        self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'table str, &'table Cell)> + use<'table> {
        self.columns.iter().map(String::as_str).zip(self.cells)
    }
}

impl Table {
    /// Builds a table with one row per record.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let records: Vec<Map<String, Value>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for key in records.iter().flat_map(Map::keys) {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Cell::Null; columns.len()];
                for (key, value) in record {
                    if let Some(&i) = index.get(&key) {
                        row[i] = Cell::from(value);
                    }
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Builds a table from a series of JSON objects, or strings holding JSON objects.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first element that is neither.
    pub fn from_json_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(map) => Ok(map),
                Value::String(text) => serde_json::from_str::<Map<String, Value>>(&text)
                    .map_err(|e| {
                        Error::validation(format!("element {i} is not a JSON object: {e}"))
                    }),
                other => Err(Error::validation(format!(
                    "element {i} is not a JSON object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_records(records))
    }

    /// Stacks `tables` vertically. Columns are the union of every table's columns in
    /// first-seen order; rows lacking a column get [`Cell::Null`].
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Table>,
    {
        let mut result = Self::default();

        for table in tables {
            let targets: Vec<usize> = table
                .columns
                .iter()
                .map(|column| result.ensure_column(column))
                .collect();
            let width = result.columns.len();

            for row in table.rows {
                let mut out = vec![Cell::Null; width];
                for (cell, &target) in row.into_iter().zip(&targets) {
                    out[target] = cell;
                }
                result.rows.push(out);
            }
        }

        result
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterates over the cells of `column`, top to bottom.
    pub fn column<'table>(
        &'table self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'table Cell> + use<'table>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().filter_map(move |row| row.get(index)))
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Classifies `column` by scanning every row.
    #[must_use]
    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        let index = self.column_index(column)?;
        Some(self.kind_at(index))
    }

    /// Classifies every column, in column order.
    #[must_use]
    pub fn column_kinds(&self) -> Vec<(&str, ColumnKind)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), self.kind_at(i)))
            .collect()
    }

    /// Names of the columns whose non-null cells are all nested objects.
    #[must_use]
    pub fn nested_columns(&self) -> Vec<String> {
        self.column_kinds()
            .into_iter()
            .filter(|(_, kind)| *kind == ColumnKind::Nested)
            .map(|(name, _)| name.to_owned())
            .collect()
    }

    /// Replaces `column` with one `<column>.<key>` column per key found in any of its objects.
    ///
    /// Objects nested deeper are expanded too (`<column>.<key>.<inner>`). New columns are
    /// appended after the existing ones; rows lacking a key get [`Cell::Null`]. Cells that are
    /// not objects contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the table has no such column.
    pub fn flatten_column(&mut self, column: &str) -> Result<()> {
        let index = self
            .column_index(column)
            .ok_or_else(|| Error::validation(format!("no column named {column:?}")))?;

        let name = self.columns.remove(index);
        let expanded: Vec<Vec<(String, Value)>> = self
            .rows
            .iter_mut()
            .map(|row| {
                let mut pairs = Vec::new();
                match row.remove(index) {
                    Cell::Nested(map) => expand_object(&name, map, &mut pairs),
                    Cell::Null => {}
                    _other => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            column = %name,
                            value = ?_other,
                            "dropping non-object value while flattening"
                        );
                    }
                }
                pairs
            })
            .collect();

        let mut targets: HashMap<String, usize> = HashMap::new();
        for key in expanded.iter().flatten().map(|(key, _)| key) {
            if !targets.contains_key(key) {
                let target = self.ensure_column(key);
                targets.insert(key.clone(), target);
            }
        }

        for (row, pairs) in self.rows.iter_mut().zip(expanded) {
            for (key, value) in pairs.into_iter().filter(|(_, value)| !value.is_null()) {
                if let Some(&target) = targets.get(&key) {
                    row[target] = Cell::from(value);
                }
            }
        }

        Ok(())
    }

    /// Flattens every [`ColumnKind::Nested`] column. Columns mixing objects and other values are
    /// left untouched. Returns the number of columns flattened; a table without nested columns
    /// is unchanged.
    pub fn flatten(&mut self) -> usize {
        let nested = self.nested_columns();

        #[cfg(feature = "tracing")]
        for (name, kind) in self.column_kinds() {
            if kind == ColumnKind::Mixed {
                tracing::warn!(
                    column = %name,
                    "column mixes objects and plain values, not flattening"
                );
            }
        }

        for column in &nested {
            if let Err(_error) = self.flatten_column(column) {
                #[cfg(feature = "tracing")]
                tracing::warn!(column = %column, error = %_error, "could not flatten column");
            }
        }

        nested.len()
    }

    /// Flattens nested columns, then converts epoch-millisecond date columns.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.flatten();
        self.convert_epoch_dates();
        self
    }

    fn kind_at(&self, index: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;

        for cell in self.rows.iter().filter_map(|row| row.get(index)) {
            match (kind, ColumnKind::of(cell)) {
                (_, None) => {}
                (ColumnKind::Empty, Some(found)) => kind = found,
                (current, Some(found)) if current != found => return ColumnKind::Mixed,
                _ => {}
            }
        }

        kind
    }

    /// Index of `column`, appending it (null in every row) when missing.
    fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(index) = self.column_index(column) {
            return index;
        }

        self.columns.push(column.to_owned());
        for row in &mut self.rows {
            row.push(Cell::Null);
        }
        self.columns.len() - 1
    }

    fn cells_mut(&mut self, index: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(index))
    }
}

fn expand_object(prefix: &str, map: Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let path = format!("{prefix}.{key}");
        match value {
            Value::Object(inner) if !inner.is_empty() => expand_object(&path, inner, out),
            Value::Object(_) => out.push((path, Value::Null)),
            other => out.push((path, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn records(values: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(values).expect("records")
    }

    #[test]
    fn from_records_should_union_keys() {
        let table = Table::from_records(records(json!([
            { "transaction": "HP1", "status": "APPROVED" },
            { "transaction": "HP2", "buyer_email": "a@b.c" }
        ])));

        assert_eq!(table.columns(), ["transaction", "status", "buyer_email"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "status"), Some(&Cell::Null));
        assert_eq!(table.get(0, "buyer_email"), Some(&Cell::Null));
        assert_eq!(
            table.get(1, "buyer_email"),
            Some(&Cell::Value(json!("a@b.c")))
        );
    }

    #[test]
    fn flatten_column_should_union_nested_keys() -> Result<()> {
        let mut table = Table::from_records(records(json!([
            { "id": 1, "col": { "a": 1, "b": 2 } },
            { "id": 2, "col": { "a": 3 } }
        ])));

        table.flatten_column("col")?;

        assert_eq!(table.columns(), ["id", "col.a", "col.b"]);
        assert_eq!(table.get(0, "col.b"), Some(&Cell::Value(json!(2))));
        assert_eq!(table.get(1, "col.a"), Some(&Cell::Value(json!(3))));
        assert_eq!(table.get(1, "col.b"), Some(&Cell::Null));
        Ok(())
    }

    #[test]
    fn flatten_column_should_expand_deeper_objects() -> Result<()> {
        let mut table = Table::from_records(records(json!([
            { "purchase": { "price": { "value": 97.0, "currency_code": "BRL" }, "tracking": {} } }
        ])));

        table.flatten_column("purchase")?;

        assert_eq!(
            table.columns(),
            [
                "purchase.price.value",
                "purchase.price.currency_code",
                "purchase.tracking"
            ]
        );
        assert_eq!(table.get(0, "purchase.tracking"), Some(&Cell::Null));
        Ok(())
    }

    #[test]
    fn flatten_missing_column_should_fail() {
        let mut table = Table::default();
        let err = table.flatten_column("buyer").unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Validation);
    }

    #[test]
    fn classification_should_scan_every_row() {
        let table = Table::from_records(records(json!([
            { "buyer": null, "product": { "id": 1 }, "mixed": 1 },
            { "buyer": { "name": "Ana" }, "product": { "id": 2 }, "mixed": { "x": 1 } }
        ])));

        assert_eq!(table.column_kind("buyer"), Some(ColumnKind::Nested));
        assert_eq!(table.column_kind("mixed"), Some(ColumnKind::Mixed));
        assert_eq!(table.nested_columns(), ["buyer", "product"]);
    }

    #[test]
    fn flatten_should_skip_mixed_columns() {
        let mut table = Table::from_records(records(json!([
            { "buyer": { "name": "Ana" }, "mixed": 1 },
            { "buyer": { "name": "Bia" }, "mixed": { "x": 1 } }
        ])));

        assert_eq!(table.flatten(), 1);
        assert_eq!(table.columns(), ["mixed", "buyer.name"]);
    }

    #[test]
    fn flatten_should_be_idempotent() {
        let mut table = Table::from_records(records(json!([
            { "producer": { "name": "P", "ucode": "u1" }, "transaction": "HP1" }
        ])));

        assert_eq!(table.flatten(), 1);
        let once = table.clone();

        assert_eq!(table.flatten(), 0);
        assert_eq!(table, once);
    }

    #[test]
    fn empty_table_should_flatten_to_empty() {
        let table = Table::from_records(Vec::new()).normalized();

        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert!(table.column_kinds().is_empty());
    }

    #[test]
    fn from_json_values_should_accept_objects_and_strings() -> Result<()> {
        let table = Table::from_json_values([
            json!({ "a": 1 }),
            json!("{\"a\": 2, \"b\": true}"),
        ])?;

        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.get(1, "b"), Some(&Cell::Value(json!(true))));

        let err = Table::from_json_values([json!([1, 2])]).unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Validation);
        Ok(())
    }

    #[test]
    fn concat_should_union_columns() {
        let first = Table::from_records(records(json!([{ "a": 1, "b": 2 }])));
        let second = Table::from_records(records(json!([{ "b": 3, "c": 4 }, { "a": 5 }])));

        let table = Table::concat([first, second]);

        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0, "c"), Some(&Cell::Null));
        assert_eq!(table.get(1, "a"), Some(&Cell::Null));
        assert_eq!(table.get(1, "c"), Some(&Cell::Value(json!(4))));
        assert_eq!(table.get(2, "a"), Some(&Cell::Value(json!(5))));
    }

    #[test]
    fn rows_should_pair_columns_and_cells() {
        let table = Table::from_records(records(json!([{ "a": 1, "b": "x" }])));
        let row = table.rows().next().expect("one row");

        assert_eq!(row.get("b"), Some(&Cell::Value(json!("x"))));
        assert_eq!(row.iter().map(|(name, _)| name).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(table.column("a").map(Iterator::count), Some(1));
    }
}
