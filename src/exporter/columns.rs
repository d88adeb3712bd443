//! Column descriptors.
//!
//! Gathers, for every column of the table, the attributes that drive the
//! ODV header and the value renderers: display name, units, label, output
//! mask, vocabulary URNs and quality-flag linkage.

use crate::config::OdvConfig;
use crate::constants::{self, column_attrs, global_attrs};
use crate::format::{NumberFormat, OutputFormat, TimeMask};
use crate::models::{ColumnDescriptor, ObservationTable};
use tracing::{debug, warn};

/// Describe every column of the table.
///
/// Invalid masks and dangling QC references are reported through
/// `warnings` as header lines; the affected column keeps its default
/// rendering.
pub fn describe_columns(
    table: &ObservationTable,
    time_col: usize,
    config: &OdvConfig,
    warnings: &mut Vec<String>,
) -> Vec<ColumnDescriptor> {
    let time_mask = table
        .global_attribute(global_attrs::ISO8601_FORMAT)
        .unwrap_or(config.default_time_mask.as_str());
    let time_p01 = table
        .global_attribute(global_attrs::ISO8601_PARAMETER_URN)
        .unwrap_or(constants::DEFAULT_TIME_PARAMETER_URN);
    let time_p06 = table
        .global_attribute(global_attrs::ISO8601_UNITS_URN)
        .unwrap_or(constants::DEFAULT_TIME_UNITS_URN);

    let mut descriptors: Vec<ColumnDescriptor> = (0..table.n_columns())
        .map(|col| {
            let attr = |key: &str| table.column_attribute(col, key).map(str::to_string);
            let name = table.column_name(col).to_string();
            let units_attr = attr(column_attrs::UNITS);
            let is_timestamp =
                col == time_col || units_attr.as_deref() == Some(constants::TIME_UNITS);
            let odv_format = attr(column_attrs::ODV_FORMAT);

            let mut descriptor = ColumnDescriptor {
                local_name: attr(column_attrs::LONG_NAME)
                    .or_else(|| attr(column_attrs::STANDARD_NAME))
                    .unwrap_or_else(|| name.clone()),
                units: odv_units(units_attr.as_deref()),
                label: attr(column_attrs::LABEL),
                is_timestamp,
                parameter_urn: attr(column_attrs::ODV_PARAMETER_URN)
                    .or_else(|| attr(column_attrs::PARAMETER_URN)),
                units_urn: attr(column_attrs::ODV_UNITS_URN)
                    .or_else(|| attr(column_attrs::UNITS_URN)),
                instrument_urn: attr(column_attrs::INSTRUMENT_URN),
                fall_rate_urn: attr(column_attrs::FALL_RATE_URN),
                qc_value: constants::quality_flags::NO_QC.to_string(),
                ..Default::default()
            };

            if is_timestamp {
                let mask = odv_format.as_deref().unwrap_or(time_mask);
                let parsed = TimeMask::parse(mask).or_else(|| {
                    warnings.push(invalid_format_warning(mask, &name));
                    warn!("Invalid time mask [{}] for {}", mask, name);
                    TimeMask::parse(constants::DEFAULT_TIME_MASK)
                });
                descriptor.output_format = parsed.map(OutputFormat::Time);
                descriptor.parameter_urn = Some(
                    attr(column_attrs::ODV_PARAMETER_URN).unwrap_or_else(|| time_p01.to_string()),
                );
                descriptor.units_urn = Some(
                    attr(column_attrs::ODV_UNITS_URN).unwrap_or_else(|| time_p06.to_string()),
                );
            } else if let Some(mask) = odv_format.as_deref() {
                match NumberFormat::parse(mask) {
                    Some(format) => descriptor.output_format = Some(OutputFormat::Number(format)),
                    None => {
                        warnings.push(invalid_format_warning(mask, &name));
                        warn!("Invalid number format [{}] for {}", mask, name);
                    }
                }
            }

            descriptor.name = name;
            descriptor
        })
        .collect();

    link_quality_columns(table, &mut descriptors, warnings);
    descriptors
}

/// Resolve `sdn_qc_variable` / `sdn_qc` for the columns that carry a vocabulary
fn link_quality_columns(
    table: &ObservationTable,
    descriptors: &mut [ColumnDescriptor],
    warnings: &mut Vec<String>,
) {
    for col in 0..descriptors.len() {
        if !descriptors[col].has_vocabulary() {
            continue;
        }

        if let Some(qc_name) = table.column_attribute(col, column_attrs::QC_VARIABLE) {
            match table.find_column(qc_name) {
                Some(qc_col) => {
                    debug!("Column {} takes its QC flags from {}", descriptors[col].name, qc_name);
                    descriptors[qc_col].is_quality_check = true;
                    descriptors[col].qc_column = Some(qc_col);
                }
                None => {
                    warnings.push(format!(
                        "// WARNING: a qc column for {}.{}={} was not found in the data",
                        descriptors[col].name,
                        column_attrs::QC_VARIABLE,
                        qc_name
                    ));
                    warn!("QC column {} for {} not found", qc_name, descriptors[col].name);
                }
            }
        }

        if let Some(qc_value) = table.column_attribute(col, column_attrs::QC_VALUE) {
            descriptors[col].qc_value = qc_value.to_string();
        }
    }
}

fn invalid_format_warning(mask: &str, column: &str) -> String {
    format!(
        "// WARNING: invalid {} [{}] for {}",
        column_attrs::ODV_FORMAT,
        mask,
        column
    )
}

/// ODV units suffix: brackets are reserved by ODV, so they become parentheses
pub fn odv_units(units: Option<&str>) -> String {
    match units {
        Some(units) if !units.is_empty() => {
            format!(" [{}]", units.replace('[', "(").replace(']', ")"))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table() -> ObservationTable {
        let frame = df!(
            "time" => [0.0],
            "TEMP" => [12.5],
            "TEMP_QC" => ["1"],
            "PSAL" => [35.0],
        )
        .unwrap();
        ObservationTable::new(frame)
            .with_column_attribute("TEMP", "long_name", "Sea temperature")
            .with_column_attribute("TEMP", "units", "degrees_C")
            .with_column_attribute("TEMP", "sdn_parameter_urn", "SDN:P01::TEMPPR01")
            .with_column_attribute("TEMP", "sdn_units_urn", "SDN:P06::UPAA")
            .with_column_attribute("TEMP", "sdn_qc_variable", "TEMP_QC")
            .with_column_attribute("TEMP", "sdn_odv_format", "%5.2f")
            .with_column_attribute("PSAL", "standard_name", "sea_water_salinity")
            .with_column_attribute("PSAL", "units", "[PSU]")
            .with_column_attribute("PSAL", "sdn_odv_format", "%s")
    }

    #[test]
    fn test_descriptor_attributes() {
        let mut warnings = Vec::new();
        let descriptors = describe_columns(&table(), 0, &OdvConfig::default(), &mut warnings);

        let temp = &descriptors[1];
        assert_eq!(temp.local_name, "Sea temperature");
        assert_eq!(temp.units, " [degrees_C]");
        assert_eq!(temp.qc_column, Some(2));
        assert_eq!(temp.qc_value, "0");
        assert_eq!(temp.output_format.as_ref().unwrap().as_str(), "%5.2f");
        assert!(temp.has_vocabulary());
        assert!(descriptors[2].is_quality_check);

        let psal = &descriptors[3];
        assert_eq!(psal.local_name, "sea_water_salinity");
        assert_eq!(psal.units, " [(PSU)]");
        assert!(psal.output_format.is_none());
        assert!(!psal.has_vocabulary());

        assert_eq!(warnings, vec!["// WARNING: invalid sdn_odv_format [%s] for PSAL"]);
    }

    #[test]
    fn test_time_column_defaults() {
        let mut warnings = Vec::new();
        let descriptors = describe_columns(&table(), 0, &OdvConfig::default(), &mut warnings);

        let time = &descriptors[0];
        assert!(time.is_timestamp);
        assert_eq!(time.local_name, "time");
        assert_eq!(
            time.output_format.as_ref().unwrap().as_str(),
            "YYYY-MM-DDThh:mm:ss.sss"
        );
        assert_eq!(time.parameter_urn.as_deref(), Some("SDN:P01::DTUT8601"));
        assert_eq!(time.units_urn.as_deref(), Some("SDN:P06::TISO"));
    }

    #[test]
    fn test_invalid_time_mask_falls_back() {
        let table = table().with_global_attribute("SDN_ISO8601_format", "%Y");
        let mut warnings = Vec::new();
        let descriptors = describe_columns(&table, 0, &OdvConfig::default(), &mut warnings);

        assert_eq!(
            descriptors[0].output_format.as_ref().unwrap().as_str(),
            "YYYY-MM-DDThh:mm:ss.sss"
        );
        assert!(warnings.contains(&"// WARNING: invalid sdn_odv_format [%Y] for time".to_string()));
    }

    #[test]
    fn test_missing_qc_column_warns() {
        let table = table().with_column_attribute("TEMP", "sdn_qc_variable", "TEMP_FLAGS");
        let mut warnings = Vec::new();
        let descriptors = describe_columns(&table, 0, &OdvConfig::default(), &mut warnings);

        assert_eq!(descriptors[1].qc_column, None);
        assert!(!descriptors[2].is_quality_check);
        assert!(warnings.contains(
            &"// WARNING: a qc column for TEMP.sdn_qc_variable=TEMP_FLAGS was not found in the data"
                .to_string()
        ));
    }

    #[test]
    fn test_odv_units() {
        assert_eq!(odv_units(None), "");
        assert_eq!(odv_units(Some("")), "");
        assert_eq!(odv_units(Some("m")), " [m]");
        assert_eq!(odv_units(Some("mg/m[3]")), " [mg/m(3)]");
    }
}
