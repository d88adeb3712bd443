//! ODV Exporter Library
//!
//! A Rust library for writing in-memory oceanographic observation tables in
//! the SeaDataNet flavour of the Ocean Data View (ODV) spreadsheet format.
//!
//! This library provides tools for:
//! - Resolving the ODV station metadata (cruise, station, local CDI ID,
//!   EDMO code, bottom depth) from global attributes or columns
//! - Mapping columns onto the SeaDataNet P01/P06 vocabularies
//! - Ordering rows so that each station forms one contiguous group
//! - Blanking repeated station metadata on consecutive rows
//! - Writing the ODV header preamble and Latin-1 encoded data lines
//!
//! # Example
//!
//! ```no_run
//! use odv_exporter::{ObservationTable, OdvConfig, OdvExporter};
//! use polars::prelude::*;
//!
//! # fn main() -> odv_exporter::Result<()> {
//! let frame = df!(
//!     "longitude" => [4.5],
//!     "latitude" => [52.1],
//!     "time" => [1_300_000_000.0],
//!     "depth" => [5.0],
//! )?;
//! let mut table = ObservationTable::new(frame)
//!     .with_global_attribute("SDN_EDMO_CODE", "486")
//!     .with_column_attribute("depth", "sdn_parameter_urn", "SDN:P01::ADEPZZ01")
//!     .with_column_attribute("depth", "sdn_units_urn", "SDN:P06::ULAA");
//!
//! let mut output = Vec::new();
//! let stats = OdvExporter::new(OdvConfig::default()).export(&mut table, &mut output)?;
//! assert_eq!(stats.rows_written, 1);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod exporter;
pub mod format;
pub mod models;
pub mod schema;

// Re-export commonly used types
pub use config::OdvConfig;
pub use error::{OdvError, Result};
pub use exporter::OdvExporter;
pub use models::{ColumnDescriptor, ExportStats, FieldSource, ObservationTable, OdvType};
