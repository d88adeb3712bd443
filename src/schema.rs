//! Column classification.
//!
//! Maps polars element types onto ODV column type tokens. ODV has no 64-bit
//! integer type, so Int64 columns are declared DOUBLE; text columns are
//! sized from their longest value plus one byte for the length prefix.

use crate::constants::MAX_TEXT_WIDTH;
use crate::error::{OdvError, Result};
use crate::models::OdvType;
use polars::prelude::*;
use tracing::debug;

/// Classify a column into its ODV type token
pub fn odv_type(column: &Column) -> Result<OdvType> {
    let odv_type = match column.dtype() {
        DataType::Int8 | DataType::UInt8 => OdvType::Byte,
        DataType::Int16 | DataType::UInt16 => OdvType::Short,
        DataType::Int32 | DataType::UInt32 => OdvType::Integer,
        DataType::Int64 | DataType::UInt64 => OdvType::Double,
        DataType::Float32 => OdvType::Float,
        DataType::Float64 => OdvType::Double,
        DataType::Datetime(_, _) => OdvType::Double,
        DataType::String => text_type(max_string_length(column)?),
        other => {
            return Err(OdvError::UnsupportedColumnType {
                column: column.name().to_string(),
                dtype: other.to_string(),
            });
        }
    };

    debug!("Classified column {} as {}", column.name(), odv_type);
    Ok(odv_type)
}

/// Text type for a column whose longest value has `max_length` characters
pub fn text_type(max_length: usize) -> OdvType {
    OdvType::Text(MAX_TEXT_WIDTH.min(max_length + 1))
}

/// Longest value of a string column, in characters
pub fn max_string_length(column: &Column) -> Result<usize> {
    let values = column.as_materialized_series().str()?;
    Ok(values
        .into_iter()
        .flatten()
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0))
}
