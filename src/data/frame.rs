//! Columnar time series table
//!
//! This module provides:
//! - `TimeSeriesFrame`, a small column-oriented table with CSV input/output
//! - `Column` and `Cell` value types covering the shapes the pipeline needs
//! - Row grouping by identifier columns with per-group timestamp ordering

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::data::timestamps::Timestamp;
use crate::error::{Error, Result};

/// A single value inside a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value
    Null,
    Float(f64),
    Int(i64),
    Str(String),
    Timestamp(Timestamp),
    /// A per-row vector, used for multi-step forecast columns
    FloatList(Vec<f64>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Float(v) => {
                if v.is_nan() {
                    Ok(())
                } else {
                    write!(f, "{v}")
                }
            }
            Cell::Int(n) => write!(f, "{n}"),
            Cell::Str(s) => write!(f, "{s}"),
            Cell::Timestamp(t) => write!(f, "{t}"),
            Cell::FloatList(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A typed column of values
///
/// Numeric missing values are stored as NaN so float buffers can be handed
/// to the model without an extra mask pass here; integer and string columns
/// keep explicit options.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<Option<i64>>),
    Str(Vec<Option<String>>),
    Timestamp(Vec<Timestamp>),
    FloatList(Vec<Vec<f64>>),
}

impl Column {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Timestamp(v) => v.len(),
            Column::FloatList(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the column's type, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Str(_) => "str",
            Column::Timestamp(_) => "timestamp",
            Column::FloatList(_) => "float list",
        }
    }

    /// Value at `row` as a cell
    pub fn cell(&self, row: usize) -> Cell {
        match self {
            Column::Float(v) => Cell::Float(v[row]),
            Column::Int(v) => match v[row] {
                Some(n) => Cell::Int(n),
                None => Cell::Null,
            },
            Column::Str(v) => match &v[row] {
                Some(s) => Cell::Str(s.clone()),
                None => Cell::Null,
            },
            Column::Timestamp(v) => Cell::Timestamp(v[row]),
            Column::FloatList(v) => Cell::FloatList(v[row].clone()),
        }
    }

    fn empty_like(&self) -> Column {
        match self {
            Column::Float(_) => Column::Float(Vec::new()),
            Column::Int(_) => Column::Int(Vec::new()),
            Column::Str(_) => Column::Str(Vec::new()),
            Column::Timestamp(_) => Column::Timestamp(Vec::new()),
            Column::FloatList(_) => Column::FloatList(Vec::new()),
        }
    }

    /// Build a column from loose cells, inferring the type from their values
    ///
    /// Integers widen to float when mixed with floats or missing values; a
    /// column of only missing cells becomes a float column of NaN. Timestamp
    /// and list cells cannot be mixed with anything else.
    pub fn from_cells(name: &str, cells: Vec<Cell>) -> Result<Column> {
        let mut has_float = false;
        let mut has_int = false;
        let mut has_str = false;
        let mut has_stamp = false;
        let mut has_list = false;
        let mut has_null = false;
        for cell in &cells {
            match cell {
                Cell::Null => has_null = true,
                Cell::Float(_) => has_float = true,
                Cell::Int(_) => has_int = true,
                Cell::Str(_) => has_str = true,
                Cell::Timestamp(_) => has_stamp = true,
                Cell::FloatList(_) => has_list = true,
            }
        }

        let numeric = has_float || has_int;
        let mixed = Error::ColumnTypeMismatch {
            column: name.to_string(),
            details: "cells have incompatible types".to_string(),
        };

        if has_stamp {
            if has_float || has_int || has_str || has_list || has_null {
                return Err(mixed);
            }
            let mut out = Vec::with_capacity(cells.len());
            for cell in cells {
                if let Cell::Timestamp(t) = cell {
                    out.push(t);
                }
            }
            return Ok(Column::Timestamp(out));
        }
        if has_list {
            if has_float || has_int || has_str || has_null {
                return Err(mixed);
            }
            let mut out = Vec::with_capacity(cells.len());
            for cell in cells {
                if let Cell::FloatList(v) = cell {
                    out.push(v);
                }
            }
            return Ok(Column::FloatList(out));
        }
        if has_str {
            if numeric {
                return Err(mixed);
            }
            return Ok(Column::Str(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        Cell::Str(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ));
        }
        if has_int && !has_float && !has_null {
            return Ok(Column::Int(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        Cell::Int(n) => Some(n),
                        _ => None,
                    })
                    .collect(),
            ));
        }
        Ok(Column::Float(
            cells
                .into_iter()
                .map(|cell| match cell {
                    Cell::Float(v) => v,
                    Cell::Int(n) => n as f64,
                    _ => f64::NAN,
                })
                .collect(),
        ))
    }

    fn push(&mut self, cell: Cell, name: &str) -> Result<()> {
        match (self, cell) {
            (Column::Float(v), Cell::Float(x)) => v.push(x),
            (Column::Float(v), Cell::Int(n)) => v.push(n as f64),
            (Column::Float(v), Cell::Null) => v.push(f64::NAN),
            (Column::Int(v), Cell::Int(n)) => v.push(Some(n)),
            (Column::Int(v), Cell::Null) => v.push(None),
            (Column::Str(v), Cell::Str(s)) => v.push(Some(s)),
            (Column::Str(v), Cell::Null) => v.push(None),
            (Column::Timestamp(v), Cell::Timestamp(t)) => v.push(t),
            (Column::FloatList(v), Cell::FloatList(x)) => v.push(x),
            (col, cell) => {
                return Err(Error::ColumnTypeMismatch {
                    column: name.to_string(),
                    details: format!("cannot store {cell:?} in a {} column", col.kind_name()),
                })
            }
        }
        Ok(())
    }
}

/// Rows belonging to one identifier group
#[derive(Debug, Clone)]
pub struct RowGroup {
    /// Values of the grouping columns, empty when there is no grouping
    pub key: Vec<Cell>,
    /// Row indices into the source frame
    pub rows: Vec<usize>,
}

/// Column-oriented table holding one or more time series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesFrame {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl TimeSeriesFrame {
    /// Create an empty frame with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from named columns, validating equal lengths
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut frame = Self::new();
        for (name, column) in columns {
            frame.add_column(name, column)?;
        }
        Ok(frame)
    }

    /// Append a named column, validating its length against existing columns
    pub fn add_column(&mut self, name: String, column: Column) -> Result<()> {
        if self.names.contains(&name) {
            return Err(Error::InvalidConfig(format!("duplicate column '{name}'")));
        }
        if !self.columns.is_empty() && column.len() != self.num_rows() {
            return Err(Error::ColumnLengthMismatch {
                column: name,
                expected: self.num_rows(),
                actual: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_index(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Cell at `(row, column name)`
    pub fn cell(&self, row: usize, name: &str) -> Result<Cell> {
        let column = self.column(name)?;
        if row >= column.len() {
            return Err(Error::ShapeMismatch(format!(
                "row {row} out of range for column '{name}' of length {}",
                column.len()
            )));
        }
        Ok(column.cell(row))
    }

    /// All cells of one row, in column order
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns.iter().map(|c| c.cell(row)).collect()
    }

    /// Append one row of cells, in column order
    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.num_columns() {
            return Err(Error::ShapeMismatch(format!(
                "row has {} cells but the frame has {} columns",
                cells.len(),
                self.num_columns()
            )));
        }
        for ((column, name), cell) in self.columns.iter_mut().zip(&self.names).zip(cells) {
            column.push(cell, name)?;
        }
        Ok(())
    }

    /// Empty frame with the same column names and types
    pub fn empty_like(&self) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(Column::empty_like).collect(),
        }
    }

    /// Numeric values of a column as floats
    ///
    /// Integer columns are widened; missing integers become NaN.
    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        match self.column(name)? {
            Column::Float(v) => Ok(v.clone()),
            Column::Int(v) => Ok(v
                .iter()
                .map(|n| n.map_or(f64::NAN, |n| n as f64))
                .collect()),
            other => Err(Error::ColumnTypeMismatch {
                column: name.to_string(),
                details: format!("expected a numeric column, found {}", other.kind_name()),
            }),
        }
    }

    /// Timestamp values of a column
    pub fn timestamps(&self, name: &str) -> Result<&[Timestamp]> {
        match self.column(name)? {
            Column::Timestamp(v) => Ok(v),
            other => Err(Error::ColumnTypeMismatch {
                column: name.to_string(),
                details: format!("expected a timestamp column, found {}", other.kind_name()),
            }),
        }
    }

    /// New frame containing the named columns, in the given order
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let mut out = Self::new();
        for name in names {
            out.add_column(name.clone(), self.column(name)?.clone())?;
        }
        Ok(out)
    }

    /// Append another frame's rows to this one's columns
    ///
    /// Every column of `other` must exist here; columns missing from `other`
    /// are filled with empty values. Integer columns widen to float when the
    /// two sides disagree.
    pub fn concat_rows(&self, other: &TimeSeriesFrame) -> Result<Self> {
        for name in other.column_names() {
            if !self.has_column(name) {
                return Err(Error::ColumnNotFound(name.clone()));
            }
        }
        let extra = other.num_rows();
        let mut out = self.clone();
        for (name, column) in out.names.iter().zip(out.columns.iter_mut()) {
            match other.column_index(name) {
                Some(j) => append_column(column, &other.columns[j], name)?,
                None => fill_missing(column, extra, name)?,
            }
        }
        Ok(out)
    }

    /// Group rows by the given columns, first-appearance order
    ///
    /// Within each group, rows are sorted by the `sort_by` timestamp column
    /// when given. An empty grouping yields a single group over all rows.
    pub fn sorted_group_indices(
        &self,
        grouping: &[String],
        sort_by: Option<&str>,
    ) -> Result<Vec<RowGroup>> {
        let key_columns: Vec<&Column> = grouping
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<_>>()?;

        let mut groups: Vec<RowGroup> = Vec::new();
        if grouping.is_empty() {
            groups.push(RowGroup {
                key: Vec::new(),
                rows: (0..self.num_rows()).collect(),
            });
        } else {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for row in 0..self.num_rows() {
                let key: Vec<Cell> = key_columns.iter().map(|c| c.cell(row)).collect();
                let tag = format!("{key:?}");
                match seen.get(&tag) {
                    Some(&i) => groups[i].rows.push(row),
                    None => {
                        seen.insert(tag, groups.len());
                        groups.push(RowGroup {
                            key,
                            rows: vec![row],
                        });
                    }
                }
            }
        }

        if let Some(name) = sort_by {
            let stamps = self.timestamps(name)?;
            for group in &mut groups {
                group.rows.sort_by_key(|&row| stamps[row]);
            }
        }
        Ok(groups)
    }

    /// Read a frame from a CSV file with a header row
    ///
    /// Column types are inferred from the data: all-integer columns become
    /// integer, numeric columns become float, and everything else is kept as
    /// strings. The named timestamp column, when given, is parsed into
    /// timestamps and fails loudly on malformed values.
    pub fn read_csv<P: AsRef<Path>>(path: P, timestamp_column: Option<&str>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut records: Vec<csv::StringRecord> = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        let mut frame = Self::new();
        for (j, name) in names.iter().enumerate() {
            let values: Vec<&str> = records.iter().map(|r| r.get(j).unwrap_or("").trim()).collect();
            let column = if timestamp_column == Some(name.as_str()) {
                let mut stamps = Vec::with_capacity(values.len());
                for v in &values {
                    stamps.push(Timestamp::parse(v)?);
                }
                Column::Timestamp(stamps)
            } else {
                infer_column(&values)
            };
            frame.add_column(name.clone(), column)?;
        }
        Ok(frame)
    }

    /// Write the frame to a CSV file with a header row
    ///
    /// Missing values are written as empty fields; list cells are written in
    /// bracketed form.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.names)?;
        for row in 0..self.num_rows() {
            let record: Vec<String> = self.columns.iter().map(|c| c.cell(row).to_string()).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn infer_column(values: &[&str]) -> Column {
    let mut all_int = true;
    let mut all_float = true;
    let mut has_empty = false;
    for v in values {
        if v.is_empty() {
            has_empty = true;
            continue;
        }
        if v.parse::<i64>().is_err() {
            all_int = false;
        }
        if v.parse::<f64>().is_err() {
            all_float = false;
        }
    }

    if all_int && !has_empty && !values.is_empty() {
        Column::Int(
            values
                .iter()
                .map(|v| v.parse::<i64>().ok())
                .collect(),
        )
    } else if all_float && !values.is_empty() {
        Column::Float(
            values
                .iter()
                .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
                .collect(),
        )
    } else {
        Column::Str(
            values
                .iter()
                .map(|v| {
                    if v.is_empty() {
                        None
                    } else {
                        Some((*v).to_string())
                    }
                })
                .collect(),
        )
    }
}

fn append_column(dest: &mut Column, src: &Column, name: &str) -> Result<()> {
    match (&mut *dest, src) {
        (Column::Float(d), Column::Float(s)) => d.extend_from_slice(s),
        (Column::Float(d), Column::Int(s)) => {
            d.extend(s.iter().map(|n| n.map_or(f64::NAN, |n| n as f64)));
        }
        (Column::Int(d), Column::Int(s)) => d.extend_from_slice(s),
        (Column::Int(d), Column::Float(s)) => {
            let mut widened: Vec<f64> = d.iter().map(|n| n.map_or(f64::NAN, |n| n as f64)).collect();
            widened.extend_from_slice(s);
            *dest = Column::Float(widened);
        }
        (Column::Str(d), Column::Str(s)) => d.extend_from_slice(s),
        (Column::Timestamp(d), Column::Timestamp(s)) => d.extend_from_slice(s),
        (Column::FloatList(d), Column::FloatList(s)) => d.extend_from_slice(s),
        (d, s) => {
            return Err(Error::ColumnTypeMismatch {
                column: name.to_string(),
                details: format!(
                    "cannot append a {} column to a {} column",
                    s.kind_name(),
                    d.kind_name()
                ),
            })
        }
    }
    Ok(())
}

fn fill_missing(dest: &mut Column, rows: usize, name: &str) -> Result<()> {
    match dest {
        Column::Float(d) => d.extend(std::iter::repeat(f64::NAN).take(rows)),
        Column::Int(d) => d.extend(std::iter::repeat(None).take(rows)),
        Column::Str(d) => d.extend(std::iter::repeat(None).take(rows)),
        other => {
            return Err(Error::ColumnTypeMismatch {
                column: name.to_string(),
                details: format!(
                    "cannot extend a {} column with empty rows",
                    other.kind_name()
                ),
            })
        }
    }
    Ok(())
}
