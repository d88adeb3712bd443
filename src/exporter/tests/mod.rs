//! Tests for the export engine
//!
//! Exercise complete exports of small in-memory tables and inspect the
//! produced ODV text.

pub mod basic_export;
pub mod error_handling;

use crate::config::OdvConfig;
use crate::exporter::OdvExporter;
use crate::models::{ExportStats, ObservationTable};
use polars::prelude::*;

/// Two CTD casts of two depths each, deliberately out of order
pub fn ctd_profile_table() -> ObservationTable {
    let frame = df!(
        "station" => ["ST2", "ST1", "ST1", "ST2"],
        "longitude" => [4.5, 4.0, 4.0, 4.5],
        "latitude" => [52.0, 51.5, 51.5, 52.0],
        "time" => [1_300_000_000.0, 1_200_000_000.0, 1_200_000_000.0, 1_300_000_000.0],
        "depth" => [10.0, 5.0, 1.0, 2.0],
        "TEMP" => [Some(12.5), Some(13.0), Some(14.0), None],
    )
    .unwrap();

    ObservationTable::new(frame)
        .with_global_attribute("SDN_EDMO_CODE", "486")
        .with_global_attribute("SDN_CRUISE", "64PE")
        .with_global_attribute("SDN_LOCAL_CDI_ID", "CTD_2011")
        .with_global_attribute("SDN_primary_variable", "depth")
        .with_column_attribute("depth", "units", "m")
        .with_column_attribute("depth", "sdn_parameter_urn", "SDN:P01::ADEPZZ01")
        .with_column_attribute("depth", "sdn_units_urn", "SDN:P06::ULAA")
        .with_column_attribute("TEMP", "long_name", "Temperature")
        .with_column_attribute("TEMP", "units", "degC")
        .with_column_attribute("TEMP", "sdn_parameter_urn", "SDN:P01::TEMPPR01")
        .with_column_attribute("TEMP", "sdn_units_urn", "SDN:P06::UPAA")
        .with_column_attribute("TEMP", "sdn_odv_format", "%5.2f")
}

/// Run an export into memory and decode the Latin-1 output
pub fn export_text(table: &mut ObservationTable, config: OdvConfig) -> (String, ExportStats) {
    let mut output = Vec::new();
    let stats = OdvExporter::new(config).export(table, &mut output).unwrap();
    let text = output.iter().map(|&b| b as char).collect();
    (text, stats)
}

/// Lines of the output, without their CRLF terminators
pub fn lines(text: &str) -> Vec<&str> {
    text.strip_suffix("\r\n").unwrap_or(text).split("\r\n").collect()
}

/// The column header line and the data lines that follow it
pub fn body(text: &str) -> (&str, Vec<&str>) {
    let all = lines(text);
    let header_index = all
        .iter()
        .position(|line| line.starts_with("Cruise\tStation\tType\t"))
        .unwrap();
    (all[header_index], all[header_index + 1..].to_vec())
}
