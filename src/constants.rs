//! Application constants for the ODV exporter
//!
//! Attribute names recognized on the source table, canonical column names,
//! default literals and the fixed fragments of the ODV header.

// =============================================================================
// Canonical Column Names
// =============================================================================

pub const LONGITUDE_NAME: &str = "longitude";
pub const LATITUDE_NAME: &str = "latitude";
pub const TIME_NAME: &str = "time";
pub const ALTITUDE_NAME: &str = "altitude";

/// Units string that marks a column as epoch-seconds timestamps
pub const TIME_UNITS: &str = "seconds since 1970-01-01T00:00:00Z";

// =============================================================================
// Global Attributes
// =============================================================================

/// Global attribute names read from the table
pub mod global_attrs {
    pub const EDMO_CODE: &str = "SDN_EDMO_CODE";
    pub const EDMO_VARIABLE: &str = "SDN_EDMO_variable";
    pub const LOCAL_CDI_ID: &str = "SDN_LOCAL_CDI_ID";
    pub const LOCAL_CDI_ID_VARIABLE: &str = "SDN_LOCAL_CDI_ID_variable";
    pub const CRUISE: &str = "SDN_CRUISE";
    pub const CRUISE_VARIABLE: &str = "SDN_CRUISE_variable";
    pub const STATION: &str = "SDN_STATION";
    pub const STATION_VARIABLE: &str = "SDN_STATION_variable";
    pub const BOT_DEPTH: &str = "SDN_BOT_DEPTH";
    pub const BOT_DEPTH_VARIABLE: &str = "SDN_BOT_DEPTH_variable";
    pub const PRIMARY_VARIABLE: &str = "SDN_primary_variable";
    pub const ISO8601_FORMAT: &str = "SDN_ISO8601_format";
    pub const ISO8601_PARAMETER_URN: &str = "SDN_ISO8601_parameter_urn";
    pub const ISO8601_UNITS_URN: &str = "SDN_ISO8601_units_urn";
    pub const LICENSE_URL: &str = "licenseUrl";
    pub const FEATURE_TYPE: &str = "featureType";
    pub const CDM_DATA_TYPE: &str = "cdm_data_type";
}

// =============================================================================
// Column Attributes
// =============================================================================

/// Per-column attribute names read from the table
pub mod column_attrs {
    pub const LONG_NAME: &str = "long_name";
    pub const STANDARD_NAME: &str = "standard_name";
    pub const UNITS: &str = "units";
    pub const PARAMETER_URN: &str = "sdn_parameter_urn";
    pub const UNITS_URN: &str = "sdn_units_urn";
    pub const INSTRUMENT_URN: &str = "sdn_instrument_urn";
    pub const FALL_RATE_URN: &str = "sdn_fall_rate_urn";
    pub const ODV_FORMAT: &str = "sdn_odv_format";
    pub const ODV_PARAMETER_URN: &str = "sdn_odv_parameter_urn";
    pub const ODV_UNITS_URN: &str = "sdn_odv_units_urn";
    pub const LABEL: &str = "sdn_label";
    pub const QC_VARIABLE: &str = "sdn_qc_variable";
    pub const QC_VALUE: &str = "sdn_qc";
}

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_TIME_MASK: &str = "YYYY-MM-DDThh:mm:ss.sss";
pub const DEFAULT_TIME_PARAMETER_URN: &str = "SDN:P01::DTUT8601";
pub const DEFAULT_TIME_UNITS_URN: &str = "SDN:P06::TISO";

pub const MISSING_CRUISE: &str = "Missing SDN_CRUISE";
pub const MISSING_STATION: &str = "Missing SDN_STATION";
pub const MISSING_LOCAL_CDI_ID: &str = "Missing_SDN_LOCAL_CDI_ID";
pub const MISSING_EDMO_CODE: &str = "Missing_SDN_EDMO_CODE";
pub const MISSING_BOT_DEPTH: &str = "Missing SDN_BOT_DEPTH";

pub const MISSING_PARAMETER_URN: &str = "Missing sdn_parameter_urn attribute";
pub const MISSING_UNITS_URN: &str = "Missing sdn_units_urn attribute";

/// Quality flags as defined by the SeaDataNet L20 vocabulary
pub mod quality_flags {
    /// No quality control applied
    pub const NO_QC: &str = "0";

    /// Value is missing
    pub const MISSING: &str = "9";
}

/// Feature type that makes time the primary variable
pub const TIME_SERIES_FEATURE: &str = "TimeSeries";

/// Candidate names for the primary variable, after any explicit override
pub const PRIMARY_VARIABLE_CANDIDATES: &[&str] = &[
    ALTITUDE_NAME,
    "depth",
    "altitude",
    "position",
    "pressure",
    "sigma",
];

/// Last-resort candidates for the primary variable
pub const PRIMARY_VARIABLE_FALLBACKS: &[&str] = &["ship", "station"];

// =============================================================================
// Output Fragments
// =============================================================================

pub const LINE_END: &str = "\r\n";

pub const CDI_REPORT_URL: &str = "https://cdi.seadatanet.org/report/edmo/";

pub const METADATA_HEADER_PREFIX: &str = "Cruise\tStation\tType\t";
pub const METADATA_HEADER_SUFFIX: &str =
    "\tLongitude [degrees_east]\tLatitude [degrees_north]\tLOCAL_CDI_ID\tEDMO_code\tBot. Depth [m]";

/// Station type marker; other types exist only for backward compatibility
pub const STATION_TYPE: &str = "*";

pub const QUALITY_HEADER: &str = "QV:SEADATANET";
pub const PRIMARY_VARIABLE_MARKER: &str = ":PRIMARYVAR";
pub const METAVAR_MARKER: &str = ":METAVAR:";
pub const PARAMETER_MAPPING_HEADER: &str = "//SDN_parameter_mapping";

/// Index of the timestamp within the metadata block's tab-separated fields
pub const METADATA_TIME_FIELD: usize = 3;

/// Maximum ODV text width, one byte being reserved for the length prefix
pub const MAX_TEXT_WIDTH: usize = 255;
