//! ODV spreadsheet export engine.
//!
//! Turns an observation table into a SeaDataNet ODV text file: resolves
//! the station metadata, orders the rows so that each station forms one
//! contiguous group, writes the header preamble and then streams one line
//! per row through the renderer chain.

pub mod chain;
pub mod columns;
pub mod dedup;
pub mod header;
pub mod resolver;
pub mod sink;

#[cfg(test)]
pub mod tests;

pub use self::chain::{DataField, FieldRenderer, MetadataSources, RowChain};
pub use self::dedup::DeduplicationState;
pub use self::header::HeaderBuilder;
pub use self::resolver::{
    MetadataField, MetadataResolver, find_or_guess_column, find_or_guess_column_excluding,
};
pub use self::sink::Latin1Writer;

use crate::config::OdvConfig;
use crate::constants::{self, LINE_END, global_attrs};
use crate::error::{OdvError, Result};
use crate::format::{OutputFormat, TimeMask};
use crate::models::{ExportStats, ObservationTable, OdvType};
use crate::schema;

use indicatif::ProgressBar;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Exports observation tables in SeaDataNet ODV format
#[derive(Debug, Clone, Default)]
pub struct OdvExporter {
    config: OdvConfig,
}

/// Outcome of the primary-variable lookup
struct PrimaryVariable {
    column: Option<usize>,
    warnings: Vec<String>,
}

impl OdvExporter {
    pub fn new(config: OdvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OdvConfig {
        &self.config
    }

    /// Export `table` to `sink`. The table is sorted in place.
    pub fn export<W: Write>(&self, table: &mut ObservationTable, sink: W) -> Result<ExportStats> {
        self.export_with_progress(table, sink, None)
    }

    /// Export `table` to `sink`, ticking `progress` once per data row
    pub fn export_with_progress<W: Write>(
        &self,
        table: &mut ObservationTable,
        sink: W,
        progress: Option<&ProgressBar>,
    ) -> Result<ExportStats> {
        let start_time = Instant::now();
        let (lon_col, lat_col, time_col) = validate(table)?;
        info!(
            "Exporting {} rows x {} columns as ODV",
            table.n_rows(),
            table.n_columns()
        );

        // Identity fields, then the first ordering pass
        let mut resolver = MetadataResolver::new();
        let local_cdi_id = resolver.resolve(table, &resolver::LOCAL_CDI_ID);
        let edmo_code = resolver.resolve(table, &resolver::EDMO_CODE);
        let cruise = resolver.resolve(table, &resolver::CRUISE);
        let station = resolver.resolve(table, &resolver::STATION);
        let bot_depth = resolver.resolve(table, &resolver::BOT_DEPTH);
        let sources = MetadataSources {
            cruise,
            station,
            local_cdi_id,
            edmo_code,
            bot_depth,
        };

        resolver.add_key(time_col);
        debug!("Sorting by columns {:?}", resolver.key_columns());
        table.sort_by(resolver.key_columns())?;

        let references =
            header::collect_references(table, &sources.edmo_code, &sources.local_cdi_id)?;
        debug!("Collected {} reference line(s)", references.len());

        let mut column_warnings = Vec::new();
        let descriptors =
            columns::describe_columns(table, time_col, &self.config, &mut column_warnings);

        for col in [lon_col, lat_col, time_col] {
            resolver.mark_used(col);
        }

        let primary = select_primary_variable(table, time_col, &[lon_col, lat_col]);
        if let Some(col) = primary.column {
            info!("Primary variable: {}", table.column_name(col));
            resolver.mark_used(col);
            resolver.add_key(col);
            table.sort_by(resolver.key_columns())?;
        }

        // Columns that cannot be mapped onto the SeaDataNet vocabularies
        let missing_configs: Vec<usize> = (0..table.n_columns())
            .filter(|&col| {
                !descriptors[col].has_vocabulary()
                    && !descriptors[col].is_quality_check
                    && !resolver.is_used(col)
            })
            .collect();
        for &col in &missing_configs {
            resolver.mark_used(col);
        }

        // Remaining columns, classified before anything is written
        let mut data_columns: Vec<(usize, OdvType)> = Vec::new();
        if let Some(col) = primary.column {
            data_columns.push((col, schema::odv_type(table.column(col))?));
        }
        let mut metavars: Vec<(usize, OdvType)> = Vec::new();
        for col in 0..table.n_columns() {
            if resolver.is_used(col) || descriptors[col].is_quality_check {
                continue;
            }
            let odv_type = schema::odv_type(table.column(col))?;
            if self.config.emit_text_metavars && odv_type.is_text() {
                metavars.push((col, odv_type));
            } else {
                data_columns.push((col, odv_type));
            }
        }

        let time_mask = match &descriptors[time_col].output_format {
            Some(OutputFormat::Time(mask)) => mask.clone(),
            _ => TimeMask::parse(constants::DEFAULT_TIME_MASK).ok_or_else(|| {
                OdvError::configuration("no usable time mask for the time column")
            })?,
        };

        let mut preamble = HeaderBuilder::new(time_mask.as_str());
        let mut chain = RowChain::new(&sources, time_col, time_mask, lon_col, lat_col);

        preamble.add_references(references);
        if let Some(url) = table.global_attribute(global_attrs::LICENSE_URL) {
            preamble.set_license(url);
        }
        for warning in resolver.warnings().iter().chain(&column_warnings) {
            preamble.add_warning(warning.as_str());
        }
        if !missing_configs.is_empty() {
            let names: Vec<&str> = missing_configs
                .iter()
                .map(|&col| table.column_name(col))
                .collect();
            warn!("Columns without P01/P06 vocabulary left out: {}", names.join(", "));
            preamble.add_warning(header::missing_configuration_report(
                &names,
                self.config.dataset_url.as_deref(),
            ));
        }
        for warning in primary.warnings {
            preamble.add_warning(warning);
        }

        for &(col, odv_type) in &metavars {
            preamble.add_metavar(&descriptors[col], odv_type);
            chain.push_metavar(col);
        }
        for &(col, odv_type) in &data_columns {
            preamble.add_data_column(&descriptors[col], odv_type, primary.column == Some(col));
            chain.push_data(DataField::new(col, &descriptors[col]));
        }

        debug!("Each row has {} fields", chain.field_count());

        let mut writer = Latin1Writer::new(sink);
        writer.write_str(&preamble.build())?;

        let mut dedup = DeduplicationState::new(primary.column == Some(time_col));
        let mut line = String::new();
        for row in 0..table.n_rows() {
            chain.render_row(table, row, &mut dedup, &mut line)?;
            line.push_str(LINE_END);
            writer.write_str(&line)?;
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
        writer.flush()?;

        debug!(
            "Metadata blanked on {} of {} rows",
            dedup.blanked_rows(),
            table.n_rows()
        );

        let stats = ExportStats {
            rows_written: table.n_rows(),
            data_columns: data_columns.len(),
            references: preamble.reference_count(),
            warnings: preamble.warning_count(),
            primary_variable: primary
                .column
                .map(|col| table.column_name(col).to_string()),
            processing_time_ms: start_time.elapsed().as_millis(),
        };
        info!(
            "ODV export complete: {} rows, {} data columns, {} bytes in {}ms",
            stats.rows_written,
            stats.data_columns,
            writer.bytes_written(),
            stats.processing_time_ms
        );

        Ok(stats)
    }
}

/// Check the mandatory attribute and columns; returns the lon, lat and time
/// column indices
fn validate(table: &ObservationTable) -> Result<(usize, usize, usize)> {
    if table.global_attribute(global_attrs::EDMO_CODE).is_none() {
        return Err(OdvError::configuration(format!(
            "{} is not defined as a global attribute",
            global_attrs::EDMO_CODE
        )));
    }

    match (
        table.find_column(constants::LONGITUDE_NAME),
        table.find_column(constants::LATITUDE_NAME),
        table.find_column(constants::TIME_NAME),
    ) {
        (Some(lon), Some(lat), Some(time)) => Ok((lon, lat, time)),
        _ => Err(OdvError::query_validation(format!(
            "ODV output requires {}, {} and {} in the request",
            constants::LONGITUDE_NAME,
            constants::LATITUDE_NAME,
            constants::TIME_NAME
        ))),
    }
}

fn is_time_series(table: &ObservationTable) -> bool {
    [global_attrs::FEATURE_TYPE, global_attrs::CDM_DATA_TYPE]
        .iter()
        .filter_map(|key| table.global_attribute(key))
        .any(|value| value.eq_ignore_ascii_case(constants::TIME_SERIES_FEATURE))
}

/// Pick the primary variable; the position columns are never candidates
fn select_primary_variable(
    table: &ObservationTable,
    time_col: usize,
    position_cols: &[usize],
) -> PrimaryVariable {
    let mut warnings = Vec::new();

    let requested = match table.global_attribute(global_attrs::PRIMARY_VARIABLE) {
        Some(name) => Some(name.to_string()),
        None if is_time_series(table) => Some(table.column_name(time_col).to_string()),
        None => {
            warn!("Global attribute {} is not defined", global_attrs::PRIMARY_VARIABLE);
            warnings.push(format!(
                "// warning: global attribute {} is not defined",
                global_attrs::PRIMARY_VARIABLE
            ));
            None
        }
    };

    let candidates: Vec<&str> = requested
        .as_deref()
        .into_iter()
        .chain(constants::PRIMARY_VARIABLE_CANDIDATES.iter().copied())
        .collect();
    let column = find_or_guess_column_excluding(table, &candidates, position_cols).or_else(|| {
        find_or_guess_column_excluding(table, constants::PRIMARY_VARIABLE_FALLBACKS, position_cols)
    });

    if column.is_none() {
        if let Some(name) = &requested {
            warn!("Primary variable {} is not in the table", name);
            warnings.push(format!(
                "// warning:  {} {} not in query",
                global_attrs::PRIMARY_VARIABLE,
                name
            ));
        }
    }

    PrimaryVariable { column, warnings }
}
