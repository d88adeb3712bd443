//! Fatal error tests: nothing may be written before a configuration or
//! query error is raised

use super::ctd_profile_table;
use crate::error::OdvError;
use crate::exporter::OdvExporter;
use crate::models::ObservationTable;
use polars::prelude::*;
use std::io::{self, Write};

#[test]
fn test_missing_edmo_code() {
    let frame = ctd_profile_table().frame().clone();
    let mut table = ObservationTable::new(frame);

    let mut output = Vec::new();
    let err = OdvExporter::default()
        .export(&mut table, &mut output)
        .unwrap_err();

    assert!(matches!(err, OdvError::Configuration { .. }));
    assert!(err.to_string().contains("SDN_EDMO_CODE"));
    assert!(output.is_empty());
}

#[test]
fn test_missing_position_or_time_columns() {
    for dropped in ["longitude", "latitude", "time"] {
        let mut table = ctd_profile_table();
        let frame = table.frame().drop(dropped).unwrap();
        let attributes = table.global_attributes().clone();
        table = ObservationTable::new(frame);
        for (key, value) in attributes {
            table.set_global_attribute(key, value);
        }

        let mut output = Vec::new();
        let err = OdvExporter::default()
            .export(&mut table, &mut output)
            .unwrap_err();

        assert!(
            matches!(err, OdvError::QueryValidation { .. }),
            "dropped {dropped}: {err}"
        );
        assert!(output.is_empty());
    }
}

#[test]
fn test_time_column_name_is_exact() {
    let frame = df!(
        "longitude" => [4.0],
        "latitude" => [51.0],
        "Time" => [0.0],
    )
    .unwrap();
    let mut table = ObservationTable::new(frame).with_global_attribute("SDN_EDMO_CODE", "486");

    let err = OdvExporter::default()
        .export(&mut table, Vec::new())
        .unwrap_err();
    assert!(matches!(err, OdvError::QueryValidation { .. }));
}

#[test]
fn test_unsupported_column_type_fails_before_output() {
    let frame = df!(
        "longitude" => [4.0],
        "latitude" => [51.0],
        "time" => [0.0],
        "flagged" => [true],
    )
    .unwrap();
    let mut table = ObservationTable::new(frame)
        .with_global_attribute("SDN_EDMO_CODE", "486")
        .with_column_attribute("flagged", "sdn_parameter_urn", "SDN:P01::FLAG")
        .with_column_attribute("flagged", "sdn_units_urn", "SDN:P06::XXXX");

    let mut output = Vec::new();
    let err = OdvExporter::default()
        .export(&mut table, &mut output)
        .unwrap_err();

    match err {
        OdvError::UnsupportedColumnType { column, .. } => assert_eq!(column, "flagged"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(output.is_empty());
}

#[test]
fn test_sink_failure_aborts_export() {
    struct FailingSink {
        accepted: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.accepted > 0 {
                return Err(io::Error::other("connection reset"));
            }
            self.accepted += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut table = ctd_profile_table();
    let err = OdvExporter::default()
        .export(&mut table, FailingSink { accepted: 0 })
        .unwrap_err();

    assert!(matches!(err, OdvError::Io(_)));
}
