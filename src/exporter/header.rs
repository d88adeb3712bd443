//! ODV header preamble.
//!
//! Collects the `//` comment lines (bibliographic references, license,
//! deferred warnings, parameter mapping) and the column header line, and
//! renders them in the fixed order ODV expects.

use crate::constants::{
    self, CDI_REPORT_URL, LINE_END, METADATA_HEADER_PREFIX, METADATA_HEADER_SUFFIX,
    METAVAR_MARKER, PARAMETER_MAPPING_HEADER, PRIMARY_VARIABLE_MARKER, QUALITY_HEADER,
};
use crate::error::Result;
use crate::models::{ColumnDescriptor, FieldSource, ObservationTable, OdvType};

use super::chain::FieldRenderer;

/// Collect one reference line per distinct (EDMO, local CDI) rendering,
/// in first-seen row order
pub fn collect_references(
    table: &ObservationTable,
    edmo_code: &FieldSource,
    local_cdi_id: &FieldSource,
) -> Result<Vec<String>> {
    let edmo = FieldRenderer::Metadata(edmo_code.clone());
    let cdi = FieldRenderer::Metadata(local_cdi_id.clone());
    let lower_cdi = FieldRenderer::LowerCase(Box::new(cdi.clone()));
    let scoped = table.n_rows() > 1;

    let mut references: Vec<String> = Vec::new();
    let mut line = String::new();
    for row in 0..table.n_rows() {
        line.clear();
        line.push_str(
            "//<sdn_reference xlink:type=\"SDN:L23::CDI\" xlink:role=\"isDescribedBy\" xlink:href=\"",
        );
        line.push_str(CDI_REPORT_URL);
        edmo.render(table, row, &mut line)?;
        line.push('/');
        lower_cdi.render(table, row, &mut line)?;
        if scoped {
            line.push_str("\" sdn:scope=\"");
            edmo.render(table, row, &mut line)?;
            line.push(':');
            cdi.render(table, row, &mut line)?;
        }
        line.push_str("\"/>");

        if !references.contains(&line) {
            references.push(line.clone());
        }
    }

    Ok(references)
}

/// Report listing the columns left out for lack of P01/P06 vocabulary
pub fn missing_configuration_report(columns: &[&str], dataset_url: Option<&str>) -> String {
    let plural = columns.len() > 1;
    let (have, they) = if plural { ("have", "they") } else { ("has", "it") };

    let names = match columns.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        _ => columns.join(""),
    };

    let mut lines = vec![
        "//".to_string(),
        format!(
            "// Dataset variable{} {} {} not been included in the output because",
            if plural { "s" } else { "" },
            names,
            have
        ),
    ];
    match dataset_url {
        Some(url) => {
            lines.push(format!(
                "// {they} {have} no SeaDataNet P01/P06 attributes in the dataset configuration; {they} can be downloaded in another format option from:"
            ));
            lines.push(format!("// {}", url));
        }
        None => lines.push(format!(
            "// {they} {have} no SeaDataNet P01/P06 attributes in the dataset configuration; {they} can be downloaded in another format option."
        )),
    }
    lines.push("//".to_string());

    lines.join(LINE_END)
}

/// `//SDN_parameter_mapping` entry of a data column
pub fn parameter_mapping_line(descriptor: &ColumnDescriptor) -> String {
    let mut line = format!(
        "//<subject>SDN:LOCAL:{}</subject><object>{}</object><units>{}</units>",
        descriptor.local_name,
        descriptor
            .parameter_urn
            .as_deref()
            .unwrap_or(constants::MISSING_PARAMETER_URN),
        descriptor
            .units_urn
            .as_deref()
            .unwrap_or(constants::MISSING_UNITS_URN),
    );
    if let Some(instrument) = &descriptor.instrument_urn {
        line.push_str(&format!("<instrument>{}</instrument>", instrument));
    }
    if let Some(fall_rate) = &descriptor.fall_rate_urn {
        line.push_str(&format!("<fall_rate>{}</fall_rate>", fall_rate));
    }
    line
}

/// Column header label of a data column
pub fn data_column_label(descriptor: &ColumnDescriptor, odv_type: OdvType, primary: bool) -> String {
    if let Some(label) = &descriptor.label {
        return label.clone();
    }

    if descriptor.is_timestamp {
        let mask = descriptor
            .output_format
            .as_ref()
            .map(|format| format.as_str())
            .unwrap_or(constants::DEFAULT_TIME_MASK);
        return format!("{} [{}]", descriptor.local_name, mask);
    }

    format!(
        "{}{}{}:{}",
        descriptor.local_name,
        descriptor.units,
        if primary { PRIMARY_VARIABLE_MARKER } else { "" },
        odv_type
    )
}

/// Accumulates the header while the exporter inspects the table
#[derive(Debug, Clone, Default)]
pub struct HeaderBuilder {
    time_mask: String,
    references: Vec<String>,
    license: Option<String>,
    warnings: Vec<String>,
    mappings: Vec<String>,
    columns: String,
}

impl HeaderBuilder {
    /// Start a header whose time column is rendered with `time_mask`
    pub fn new(time_mask: impl Into<String>) -> Self {
        Self {
            time_mask: time_mask.into(),
            ..Default::default()
        }
    }

    /// Add reference lines, dropping exact duplicates
    pub fn add_references(&mut self, references: impl IntoIterator<Item = String>) {
        for reference in references {
            if !self.references.contains(&reference) {
                self.references.push(reference);
            }
        }
    }

    pub fn set_license(&mut self, url: &str) {
        self.license = Some(format!(
            "//<sdn_reference xlink:type=\"SDN:L23::DTLCNC\" xlink:role=\"isDescribedBy\" xlink:href=\"{}\"/>",
            url
        ));
    }

    /// Add a warning entry; multi-line entries are already CRLF joined
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_metavar(&mut self, descriptor: &ColumnDescriptor, odv_type: OdvType) {
        self.columns.push('\t');
        self.columns.push_str(&descriptor.local_name);
        self.columns.push_str(METAVAR_MARKER);
        self.columns.push_str(&odv_type.to_string());
    }

    pub fn add_data_column(&mut self, descriptor: &ColumnDescriptor, odv_type: OdvType, primary: bool) {
        self.mappings.push(parameter_mapping_line(descriptor));
        self.columns.push('\t');
        self.columns
            .push_str(&data_column_label(descriptor, odv_type, primary));
        self.columns.push('\t');
        self.columns.push_str(QUALITY_HEADER);
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// The column header line, without terminator
    pub fn column_header(&self) -> String {
        format!(
            "{}{}{}{}",
            METADATA_HEADER_PREFIX, self.time_mask, METADATA_HEADER_SUFFIX, self.columns
        )
    }

    /// Complete header text, every line CRLF terminated
    pub fn build(&self) -> String {
        let mut header = String::new();
        let mut push_line = |line: &str| {
            header.push_str(line);
            header.push_str(LINE_END);
        };

        self.references.iter().for_each(|line| push_line(line));
        if let Some(license) = &self.license {
            push_line(license);
        }
        self.warnings.iter().for_each(|line| push_line(line));
        push_line(PARAMETER_MAPPING_HEADER);
        self.mappings.iter().for_each(|line| push_line(line));
        push_line("//");
        push_line(&self.column_header());

        header
    }
}
