//! Row rendering chain.
//!
//! The chain is assembled once per export from the table schema and the
//! resolved metadata, then replayed for every row. Each renderer appends its
//! contribution to a shared line buffer; the chain as a whole produces the
//! same number of tab-separated fields for every row.

use crate::constants::{STATION_TYPE, quality_flags};
use crate::error::Result;
use crate::format::{OutputFormat, TimeMask, parse_number};
use crate::models::{ColumnDescriptor, FieldSource, ObservationTable};

use super::dedup::DeduplicationState;

/// Value and quality flag source for one data column
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub column: usize,
    pub format: Option<OutputFormat>,
    pub qc_column: Option<usize>,
    pub qc_value: String,
}

impl DataField {
    pub fn new(column: usize, descriptor: &ColumnDescriptor) -> Self {
        Self {
            column,
            format: descriptor.output_format.clone(),
            qc_column: descriptor.qc_column,
            qc_value: descriptor.qc_value.clone(),
        }
    }

    /// Text of the value, formatted with the column mask when it applies
    pub fn value_text(&self, table: &ObservationTable, row: usize) -> Result<String> {
        match &self.format {
            Some(OutputFormat::Time(mask)) => {
                Ok(mask.format_seconds(table.cell_seconds(self.column, row)?))
            }
            Some(OutputFormat::Number(format)) => {
                let text = table.cell_text(self.column, row)?;
                Ok(parse_number(&text).map_or(text, |value| format.format(value)))
            }
            None => table.cell_text(self.column, row),
        }
    }

    /// Quality flag for an already rendered value: 9 when it is empty, else
    /// the linked QC column or the column default
    pub fn quality_flag(
        &self,
        table: &ObservationTable,
        row: usize,
        value: &str,
    ) -> Result<String> {
        if value.is_empty() {
            return Ok(quality_flags::MISSING.to_string());
        }

        let flag = match self.qc_column {
            Some(qc_col) => table.cell_text(qc_col, row)?,
            None => self.qc_value.clone(),
        };

        if flag.is_empty() {
            Ok(quality_flags::NO_QC.to_string())
        } else {
            Ok(flag)
        }
    }
}

/// One unit of row output
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRenderer {
    /// Fixed text
    Literal(String),
    /// A single tab
    Separator,
    /// Resolved metadata value
    Metadata(FieldSource),
    /// Another renderer's output, lower-cased
    LowerCase(Box<FieldRenderer>),
    /// Time column formatted with its mask
    Timestamp { column: usize, mask: TimeMask },
    /// Cell text, not reformatted
    RawValue(usize),
    /// Data value formatted with its column mask, a tab, then its quality flag
    Data(DataField),
}

impl FieldRenderer {
    pub fn render(&self, table: &ObservationTable, row: usize, out: &mut String) -> Result<()> {
        match self {
            FieldRenderer::Literal(text) => out.push_str(text),
            FieldRenderer::Separator => out.push('\t'),
            FieldRenderer::Metadata(FieldSource::Constant(value)) => out.push_str(value),
            FieldRenderer::Metadata(FieldSource::Column(col)) => {
                out.push_str(&table.cell_text(*col, row)?)
            }
            FieldRenderer::LowerCase(inner) => {
                let mut text = String::new();
                inner.render(table, row, &mut text)?;
                out.push_str(&text.to_lowercase());
            }
            FieldRenderer::Timestamp { column, mask } => {
                out.push_str(&mask.format_seconds(table.cell_seconds(*column, row)?))
            }
            FieldRenderer::RawValue(col) => out.push_str(&table.cell_text(*col, row)?),
            FieldRenderer::Data(field) => {
                let value = field.value_text(table, row)?;
                let flag = field.quality_flag(table, row, &value)?;
                out.push_str(&value);
                out.push('\t');
                out.push_str(&flag);
            }
        }
        Ok(())
    }
}

/// Render a sequence of renderers in order
pub fn render_all(
    renderers: &[FieldRenderer],
    table: &ObservationTable,
    row: usize,
    out: &mut String,
) -> Result<()> {
    for renderer in renderers {
        renderer.render(table, row, out)?;
    }
    Ok(())
}

/// Resolved sources of the station identity fields
#[derive(Debug, Clone)]
pub struct MetadataSources {
    pub cruise: FieldSource,
    pub station: FieldSource,
    pub local_cdi_id: FieldSource,
    pub edmo_code: FieldSource,
    pub bot_depth: FieldSource,
}

/// The complete, replayable row layout
#[derive(Debug, Clone, Default)]
pub struct RowChain {
    metadata: Vec<FieldRenderer>,
    data: Vec<FieldRenderer>,
}

impl RowChain {
    /// Start a chain with the fixed metadata block:
    /// cruise, station, type, time, lon, lat, local CDI, EDMO, bottom depth
    pub fn new(
        sources: &MetadataSources,
        time_col: usize,
        time_mask: TimeMask,
        lon_col: usize,
        lat_col: usize,
    ) -> Self {
        let metadata = vec![
            FieldRenderer::Metadata(sources.cruise.clone()),
            FieldRenderer::Separator,
            FieldRenderer::Metadata(sources.station.clone()),
            FieldRenderer::Separator,
            FieldRenderer::Literal(STATION_TYPE.to_string()),
            FieldRenderer::Separator,
            FieldRenderer::Timestamp {
                column: time_col,
                mask: time_mask,
            },
            FieldRenderer::Separator,
            FieldRenderer::RawValue(lon_col),
            FieldRenderer::Separator,
            FieldRenderer::RawValue(lat_col),
            FieldRenderer::Separator,
            FieldRenderer::Metadata(sources.local_cdi_id.clone()),
            FieldRenderer::Separator,
            FieldRenderer::Metadata(sources.edmo_code.clone()),
            FieldRenderer::Separator,
            FieldRenderer::Metadata(sources.bot_depth.clone()),
        ];

        Self {
            metadata,
            data: Vec::new(),
        }
    }

    /// Text column emitted as part of the metadata block
    pub fn push_metavar(&mut self, column: usize) {
        self.metadata.push(FieldRenderer::Separator);
        self.metadata.push(FieldRenderer::RawValue(column));
    }

    /// Value/flag pair for a data column
    pub fn push_data(&mut self, field: DataField) {
        self.data.push(FieldRenderer::Separator);
        self.data.push(FieldRenderer::Data(field));
    }

    pub fn metadata(&self) -> &[FieldRenderer] {
        &self.metadata
    }

    /// Number of tab-separated fields each rendered row has
    pub fn field_count(&self) -> usize {
        1 + self
            .metadata
            .iter()
            .chain(&self.data)
            .filter(|renderer| {
                matches!(renderer, FieldRenderer::Separator | FieldRenderer::Data(_))
            })
            .count()
    }

    /// Render one row into `out`, replacing its previous content
    pub fn render_row(
        &self,
        table: &ObservationTable,
        row: usize,
        dedup: &mut DeduplicationState,
        out: &mut String,
    ) -> Result<()> {
        out.clear();
        dedup.render_metadata(&self.metadata, table, row, out)?;
        render_all(&self.data, table, row, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NumberFormat;
    use polars::prelude::*;

    fn table() -> ObservationTable {
        let frame = df!(
            "station" => ["S1", "S1"],
            "longitude" => [4.25, 4.25],
            "latitude" => [52.0, 52.0],
            "time" => [0.0, 0.0],
            "TEMP" => [Some(3.14159), None],
            "TEMP_QC" => ["2", "4"],
        )
        .unwrap();
        ObservationTable::new(frame)
    }

    fn sources() -> MetadataSources {
        MetadataSources {
            cruise: FieldSource::Constant("C1".to_string()),
            station: FieldSource::Column(0),
            local_cdi_id: FieldSource::Constant("CDI".to_string()),
            edmo_code: FieldSource::Constant("486".to_string()),
            bot_depth: FieldSource::Constant("Missing SDN_BOT_DEPTH".to_string()),
        }
    }

    fn temperature() -> DataField {
        DataField {
            column: 4,
            format: NumberFormat::parse("%.2f").map(OutputFormat::Number),
            qc_column: Some(5),
            qc_value: "0".to_string(),
        }
    }

    fn chain() -> RowChain {
        let mask = TimeMask::parse("YYYY-MM-DD").unwrap();
        let mut chain = RowChain::new(&sources(), 3, mask, 1, 2);
        chain.push_data(temperature());
        chain
    }

    #[test]
    fn test_metadata_block_layout() {
        let chain = chain();
        let mut out = String::new();
        render_all(chain.metadata(), &table(), 0, &mut out).unwrap();

        assert_eq!(
            out,
            "C1\tS1\t*\t1970-01-01\t4.25\t52\tCDI\t486\tMissing SDN_BOT_DEPTH"
        );
    }

    #[test]
    fn test_field_count() {
        let mut chain = chain();
        assert_eq!(chain.field_count(), 11);

        chain.push_metavar(0);
        assert_eq!(chain.field_count(), 12);
    }

    #[test]
    fn test_render_row_replaces_buffer() {
        let chain = chain();
        let table = table();
        let mut dedup = DeduplicationState::new(false);
        let mut out = String::from("stale");

        chain.render_row(&table, 0, &mut dedup, &mut out).unwrap();
        assert!(out.starts_with("C1\tS1\t"));
        assert!(out.ends_with("\t3.14\t2"));

        chain.render_row(&table, 1, &mut dedup, &mut out).unwrap();
        assert_eq!(out, "\t\t\t\t\t\t\t\t\t\t9");
        assert_eq!(out.split('\t').count(), chain.field_count());
    }

    #[test]
    fn test_lower_case_renderer() {
        let renderer = FieldRenderer::LowerCase(Box::new(FieldRenderer::Metadata(
            FieldSource::Constant("CTD_A".to_string()),
        )));
        let mut out = String::new();
        renderer.render(&table(), 0, &mut out).unwrap();
        assert_eq!(out, "ctd_a");
    }

    #[test]
    fn test_quality_flag_defaults() {
        let table = table();
        let mut field = temperature();
        field.qc_column = None;
        assert_eq!(field.quality_flag(&table, 0, "3.14").unwrap(), "0");
        assert_eq!(field.quality_flag(&table, 1, "").unwrap(), "9");

        field.qc_value = "1".to_string();
        assert_eq!(field.quality_flag(&table, 0, "3.14").unwrap(), "1");
    }

    #[test]
    fn test_data_renderer_writes_value_and_flag() {
        let table = table();
        let renderer = FieldRenderer::Data(temperature());

        let mut present = String::new();
        renderer.render(&table, 0, &mut present).unwrap();
        assert_eq!(present, "3.14\t2");

        let mut missing = String::new();
        renderer.render(&table, 1, &mut missing).unwrap();
        assert_eq!(missing, "\t9");
    }
}
