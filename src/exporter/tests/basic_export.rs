//! Basic export tests

use super::{body, ctd_profile_table, export_text, lines};
use crate::config::OdvConfig;
use crate::exporter::OdvExporter;
use crate::models::ObservationTable;
use polars::prelude::*;

#[test]
fn test_complete_profile_export() {
    let mut table = ctd_profile_table();
    let (text, stats) = export_text(&mut table, OdvConfig::default());

    let expected = [
        "//<sdn_reference xlink:type=\"SDN:L23::CDI\" xlink:role=\"isDescribedBy\" xlink:href=\"https://cdi.seadatanet.org/report/edmo/486/ctd_2011\" sdn:scope=\"486:CTD_2011\"/>",
        "// warning: no value found for global attribute SDN_BOT_DEPTH nor SDN_BOT_DEPTH_variable",
        "//SDN_parameter_mapping",
        "//<subject>SDN:LOCAL:depth</subject><object>SDN:P01::ADEPZZ01</object><units>SDN:P06::ULAA</units>",
        "//<subject>SDN:LOCAL:Temperature</subject><object>SDN:P01::TEMPPR01</object><units>SDN:P06::UPAA</units>",
        "//",
        "Cruise\tStation\tType\tYYYY-MM-DDThh:mm:ss.sss\tLongitude [degrees_east]\tLatitude [degrees_north]\tLOCAL_CDI_ID\tEDMO_code\tBot. Depth [m]\tdepth [m]:PRIMARYVAR:DOUBLE\tQV:SEADATANET\tTemperature [degC]:DOUBLE\tQV:SEADATANET",
        "64PE\tST1\t*\t2008-01-10T21:20:00.000\t4\t51.5\tCTD_2011\t486\tMissing SDN_BOT_DEPTH\t1\t0\t14.00\t0",
        "\t\t\t\t\t\t\t\t\t5\t0\t13.00\t0",
        "64PE\tST2\t*\t2011-03-13T07:06:40.000\t4.5\t52\tCTD_2011\t486\tMissing SDN_BOT_DEPTH\t2\t0\t\t9",
        "\t\t\t\t\t\t\t\t\t10\t0\t12.50\t0",
    ];
    assert_eq!(lines(&text), expected);
    assert!(text.ends_with("\r\n"));

    assert_eq!(stats.rows_written, 4);
    assert_eq!(stats.data_columns, 2);
    assert_eq!(stats.references, 1);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.primary_variable.as_deref(), Some("depth"));
}

#[test]
fn test_every_line_has_the_header_field_count() {
    let mut table = ctd_profile_table();
    let (text, stats) = export_text(&mut table, OdvConfig::default());
    let (header, rows) = body(&text);

    let fields = header.split('\t').count();
    assert_eq!(rows.len(), stats.rows_written);
    for row in rows {
        assert_eq!(row.split('\t').count(), fields, "row: {row:?}");
    }
}

#[test]
fn test_rows_are_grouped_by_station() {
    let frame = df!(
        "station" => ["B", "A", "B", "A", "C", "A"],
        "longitude" => [1.0, 2.0, 1.0, 2.0, 3.0, 2.0],
        "latitude" => [1.0, 2.0, 1.0, 2.0, 3.0, 2.0],
        "time" => [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "depth" => [3.0, 2.0, 1.0, 3.0, 1.0, 1.0],
    )
    .unwrap();
    let mut table = ObservationTable::new(frame)
        .with_global_attribute("SDN_EDMO_CODE", "486")
        .with_column_attribute("depth", "sdn_parameter_urn", "SDN:P01::ADEPZZ01")
        .with_column_attribute("depth", "sdn_units_urn", "SDN:P06::ULAA");

    OdvExporter::default().export(&mut table, Vec::new()).unwrap();

    let stations: Vec<String> = (0..table.n_rows())
        .map(|row| table.cell_text(0, row).unwrap())
        .collect();
    assert_eq!(stations, ["A", "A", "A", "B", "B", "C"]);

    let depths: Vec<String> = (0..table.n_rows())
        .map(|row| table.cell_text(4, row).unwrap())
        .collect();
    assert_eq!(depths, ["1", "2", "3", "1", "3", "1"]);
}

#[test]
fn test_invalid_number_format_keeps_raw_values() {
    let mut table = ctd_profile_table().with_column_attribute("TEMP", "sdn_odv_format", "%d");
    let (text, _) = export_text(&mut table, OdvConfig::default());

    assert!(lines(&text).contains(&"// WARNING: invalid sdn_odv_format [%d] for TEMP"));
    let (_, rows) = body(&text);
    assert!(rows[0].ends_with("\t1\t0\t14\t0"));
    assert!(rows[3].ends_with("\t10\t0\t12.5\t0"));
}

#[test]
fn test_quality_flags_from_companion_column() {
    let frame = df!(
        "longitude" => [4.0, 4.0, 4.0],
        "latitude" => [51.0, 51.0, 51.0],
        "time" => [0.0, 0.0, 0.0],
        "depth" => [1.0, 2.0, 3.0],
        "TEMP_QC" => [Some("1"), None, Some("4")],
    )
    .unwrap();
    let mut table = ObservationTable::new(frame)
        .with_global_attribute("SDN_EDMO_CODE", "486")
        .with_column_attribute("depth", "sdn_parameter_urn", "SDN:P01::ADEPZZ01")
        .with_column_attribute("depth", "sdn_units_urn", "SDN:P06::ULAA")
        .with_column_attribute("depth", "sdn_qc_variable", "TEMP_QC");

    let (text, stats) = export_text(&mut table, OdvConfig::default());
    let (header, rows) = body(&text);

    // the QC column is consumed by its data column, not reported or emitted
    assert!(!header.contains("TEMP_QC"));
    assert!(!text.contains("Dataset variable"));
    assert_eq!(stats.data_columns, 1);
    assert!(rows[0].ends_with("\t1\t1"));
    assert!(rows[1].ends_with("\t2\t0"));
    assert!(rows[2].ends_with("\t3\t4"));
}

#[test]
fn test_default_quality_flag_attribute() {
    let mut table = ctd_profile_table().with_column_attribute("TEMP", "sdn_qc", "1");
    let (text, _) = export_text(&mut table, OdvConfig::default());
    let (_, rows) = body(&text);

    assert!(rows[0].ends_with("\t14.00\t1"));
    // missing values are always flagged 9
    assert!(rows[2].ends_with("\t\t9"));
}

#[test]
fn test_output_is_latin1() {
    let mut table = ctd_profile_table()
        .with_column_attribute("TEMP", "long_name", "Température Δ")
        .with_column_attribute("TEMP", "units", "°C");

    let mut output = Vec::new();
    OdvExporter::default().export(&mut table, &mut output).unwrap();

    let label = b"Temp\xe9rature ? [\xb0C]:DOUBLE";
    assert!(output.windows(label.len()).any(|window| window == label));
    assert!(std::str::from_utf8(&output).is_err());
}

#[test]
fn test_text_with_tabs_keeps_field_structure() {
    let frame = df!(
        "longitude" => [4.0],
        "latitude" => [51.0],
        "time" => [0.0],
        "depth" => [1.0],
        "comment" => ["a\tb"],
    )
    .unwrap();
    let mut table = ObservationTable::new(frame)
        .with_global_attribute("SDN_EDMO_CODE", "486")
        .with_column_attribute("depth", "sdn_parameter_urn", "SDN:P01::ADEPZZ01")
        .with_column_attribute("depth", "sdn_units_urn", "SDN:P06::ULAA")
        .with_column_attribute("comment", "sdn_parameter_urn", "SDN:P01::COMMENT")
        .with_column_attribute("comment", "sdn_units_urn", "SDN:P06::XXXX");

    let (text, _) = export_text(&mut table, OdvConfig::default());
    let (header, rows) = body(&text);

    assert!(header.contains("\tcomment:TEXT:4\tQV:SEADATANET"));
    assert_eq!(rows[0].split('\t').count(), header.split('\t').count());
    assert!(rows[0].ends_with("\t\"a\\tb\"\t0"));
}

#[test]
fn test_constant_metadata_with_control_characters_keeps_field_structure() {
    let mut table = ctd_profile_table()
        .with_global_attribute("SDN_STATION", "ST\t1")
        .with_global_attribute("SDN_CRUISE", "64\r\nPE");

    let (text, stats) = export_text(&mut table, OdvConfig::default());
    let (header, rows) = body(&text);

    assert_eq!(rows.len(), stats.rows_written);
    let fields = header.split('\t').count();
    for row in &rows {
        assert_eq!(row.split('\t').count(), fields, "row: {row:?}");
    }
    assert!(rows[0].starts_with("\"64\\r\\nPE\"\t\"ST\\t1\"\t*\t"));
}
