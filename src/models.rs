//! Core data structures and types for ODV export.
//!
//! Defines the observation table handed over by the query layer, the ODV
//! column type tokens, resolved metadata sources and per-column descriptors.

use crate::error::Result;
use crate::format::OutputFormat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key/value attribute map, as attached to a table or to one of its columns
pub type Attributes = HashMap<String, String>;

/// In-memory observation table with its global and per-column attributes
#[derive(Debug, Clone)]
pub struct ObservationTable {
    frame: DataFrame,
    global_attributes: Attributes,
    column_attributes: HashMap<String, Attributes>,
}

impl ObservationTable {
    pub fn new(frame: DataFrame) -> Self {
        Self {
            frame,
            global_attributes: Attributes::new(),
            column_attributes: HashMap::new(),
        }
    }

    /// Add or replace a global attribute
    pub fn with_global_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_global_attribute(key, value);
        self
    }

    /// Add or replace an attribute of the named column
    pub fn with_column_attribute(
        mut self,
        column: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_column_attribute(column, key, value);
        self
    }

    pub fn set_global_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global_attributes.insert(key.into(), value.into());
    }

    pub fn set_column_attribute(
        &mut self,
        column: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.column_attributes
            .entry(column.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn global_attributes(&self) -> &Attributes {
        &self.global_attributes
    }

    pub fn global_attribute(&self, key: &str) -> Option<&str> {
        self.global_attributes.get(key).map(String::as_str)
    }

    pub fn column_attribute(&self, column: usize, key: &str) -> Option<&str> {
        self.column_attributes
            .get(self.column_name(column))
            .and_then(|attrs| attrs.get(key))
            .map(String::as_str)
    }

    pub fn n_columns(&self) -> usize {
        self.frame.width()
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn column(&self, column: usize) -> &Column {
        &self.frame.get_columns()[column]
    }

    pub fn column_name(&self, column: usize) -> &str {
        self.column(column).name().as_str()
    }

    /// Index of the column with exactly this name
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.frame.get_column_index(name)
    }

    /// Tab-safe text of a cell; nulls and non-finite numbers are empty
    pub fn cell_text(&self, column: usize, row: usize) -> Result<String> {
        let value = self.column(column).get(row)?;
        Ok(any_value_text(&value))
    }

    /// Numeric value of a cell in epoch seconds for time columns, else as-is
    pub fn cell_seconds(&self, column: usize, row: usize) -> Result<Option<f64>> {
        let value = self.column(column).get(row)?;
        Ok(any_value_seconds(&value))
    }

    /// Stable in-place sort by the given columns, in priority order
    pub fn sort_by(&mut self, columns: &[usize]) -> Result<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let names: Vec<PlSmallStr> = columns
            .iter()
            .map(|&col| self.column(col).name().clone())
            .collect();
        self.frame = self
            .frame
            .sort(names, SortMultipleOptions::default().with_maintain_order(true))?;
        Ok(())
    }
}

/// Render a value the way a tab-separated file expects it
fn any_value_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::String(s) => escape_text(s),
        AnyValue::StringOwned(s) => escape_text(s.as_str()),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) if v.is_finite() => v.to_string(),
        AnyValue::Float64(v) if v.is_finite() => v.to_string(),
        AnyValue::Float32(_) | AnyValue::Float64(_) => String::new(),
        other => any_value_seconds(other)
            .map(|seconds| seconds.to_string())
            .unwrap_or_else(|| escape_text(&other.to_string())),
    }
}

fn any_value_seconds(value: &AnyValue) -> Option<f64> {
    let seconds = match value {
        AnyValue::Int8(v) => *v as f64,
        AnyValue::Int16(v) => *v as f64,
        AnyValue::Int32(v) => *v as f64,
        AnyValue::Int64(v) => *v as f64,
        AnyValue::UInt8(v) => *v as f64,
        AnyValue::UInt16(v) => *v as f64,
        AnyValue::UInt32(v) => *v as f64,
        AnyValue::UInt64(v) => *v as f64,
        AnyValue::Float32(v) => *v as f64,
        AnyValue::Float64(v) => *v,
        AnyValue::Datetime(v, unit, _) => datetime_seconds(*v, *unit),
        AnyValue::DatetimeOwned(v, unit, _) => datetime_seconds(*v, *unit),
        AnyValue::String(s) => s.trim().parse().ok()?,
        AnyValue::StringOwned(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    seconds.is_finite().then_some(seconds)
}

fn datetime_seconds(value: i64, unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Nanoseconds => value as f64 / 1e9,
        TimeUnit::Microseconds => value as f64 / 1e6,
        TimeUnit::Milliseconds => value as f64 / 1e3,
    }
}

/// JSON-quote strings that would otherwise break the line/field structure
pub fn escape_text(text: &str) -> String {
    if !text
        .chars()
        .any(|c| matches!(c, '\t' | '\r' | '\n' | '\\' | '"') || c.is_control())
    {
        return text.to_string();
    }

    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        match c {
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

/// ODV column type token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OdvType {
    Byte,
    Short,
    Integer,
    Float,
    Double,
    /// Text of the given width, length byte included
    Text(usize),
}

impl OdvType {
    pub fn is_text(&self) -> bool {
        matches!(self, OdvType::Text(_))
    }
}

impl fmt::Display for OdvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OdvType::Byte => write!(f, "BYTE"),
            OdvType::Short => write!(f, "SHORT"),
            OdvType::Integer => write!(f, "INTEGER"),
            OdvType::Float => write!(f, "FLOAT"),
            OdvType::Double => write!(f, "DOUBLE"),
            OdvType::Text(width) => write!(f, "TEXT:{}", width),
        }
    }
}

/// Where a metadata field takes its value from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSource {
    /// Same text for every row
    Constant(String),
    /// Cell of the given column
    Column(usize),
}

/// Everything the header and the renderers need to know about one column
#[derive(Debug, Clone, Default)]
pub struct ColumnDescriptor {
    pub name: String,
    /// long_name, else standard_name, else the column name
    pub local_name: String,
    /// " [units]" with brackets normalized, or empty
    pub units: String,
    pub label: Option<String>,
    /// Time mask for timestamps, numeric mask otherwise
    pub output_format: Option<OutputFormat>,
    pub is_timestamp: bool,
    pub parameter_urn: Option<String>,
    pub units_urn: Option<String>,
    pub instrument_urn: Option<String>,
    pub fall_rate_urn: Option<String>,
    pub qc_column: Option<usize>,
    pub qc_value: String,
    /// Referenced by another column's sdn_qc_variable
    pub is_quality_check: bool,
}

impl ColumnDescriptor {
    /// P01 and P06 are both known
    pub fn has_vocabulary(&self) -> bool {
        self.parameter_urn.is_some() && self.units_urn.is_some()
    }
}

/// Export statistics
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    pub rows_written: usize,
    pub data_columns: usize,
    pub references: usize,
    pub warnings: usize,
    pub primary_variable: Option<String>,
    pub processing_time_ms: u128,
}
