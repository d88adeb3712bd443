//! Metadata resolution.
//!
//! Every ODV identity field (cruise, station, local CDI ID, EDMO code,
//! bottom depth) is taken either from a global attribute holding a fixed
//! value, or from a column named by another global attribute or guessed from
//! a list of candidate names. Columns claimed this way are not emitted again
//! as data columns.

use crate::constants::{self, global_attrs};
use crate::models::{FieldSource, ObservationTable, escape_text};
use tracing::{debug, warn};

/// How one ODV metadata field is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataField {
    /// Global attribute holding a fixed value for every row
    pub constant_attribute: &'static str,
    /// Global attribute naming the column to use
    pub variable_attribute: &'static str,
    /// Value used when nothing resolves
    pub default_literal: &'static str,
    /// Column names to try after the declared one
    pub candidates: &'static [&'static str],
    /// Whether a bound column takes part in the row ordering
    pub sort_key: bool,
}

pub const CRUISE: MetadataField = MetadataField {
    constant_attribute: global_attrs::CRUISE,
    variable_attribute: global_attrs::CRUISE_VARIABLE,
    default_literal: constants::MISSING_CRUISE,
    candidates: &["cruise"],
    sort_key: true,
};

pub const STATION: MetadataField = MetadataField {
    constant_attribute: global_attrs::STATION,
    variable_attribute: global_attrs::STATION_VARIABLE,
    default_literal: constants::MISSING_STATION,
    candidates: &["station_id", "station"],
    sort_key: true,
};

pub const LOCAL_CDI_ID: MetadataField = MetadataField {
    constant_attribute: global_attrs::LOCAL_CDI_ID,
    variable_attribute: global_attrs::LOCAL_CDI_ID_VARIABLE,
    default_literal: constants::MISSING_LOCAL_CDI_ID,
    candidates: &[],
    sort_key: true,
};

pub const EDMO_CODE: MetadataField = MetadataField {
    constant_attribute: global_attrs::EDMO_CODE,
    variable_attribute: global_attrs::EDMO_VARIABLE,
    default_literal: constants::MISSING_EDMO_CODE,
    candidates: &[],
    sort_key: false,
};

pub const BOT_DEPTH: MetadataField = MetadataField {
    constant_attribute: global_attrs::BOT_DEPTH,
    variable_attribute: global_attrs::BOT_DEPTH_VARIABLE,
    default_literal: constants::MISSING_BOT_DEPTH,
    candidates: &[],
    sort_key: false,
};

/// Find a column by exact name, then ignoring case, then by substring.
///
/// The exact pass honours the order of `names`; the two relaxed passes
/// return the first column in table order that matches any name.
pub fn find_or_guess_column(table: &ObservationTable, names: &[&str]) -> Option<usize> {
    find_or_guess_column_excluding(table, names, &[])
}

/// As [`find_or_guess_column`], never returning one of `excluded`
pub fn find_or_guess_column_excluding(
    table: &ObservationTable,
    names: &[&str],
    excluded: &[usize],
) -> Option<usize> {
    let allowed = |col: &usize| !excluded.contains(col);

    if let Some(col) = names
        .iter()
        .filter_map(|name| table.find_column(name))
        .find(allowed)
    {
        return Some(col);
    }

    let lowered: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
    let column_names: Vec<(usize, String)> = (0..table.n_columns())
        .filter(allowed)
        .map(|col| (col, table.column_name(col).to_lowercase()))
        .collect();

    column_names
        .iter()
        .find(|(_, col_name)| lowered.iter().any(|name| col_name == name))
        .or_else(|| {
            column_names
                .iter()
                .find(|(_, col_name)| lowered.iter().any(|name| col_name.contains(name.as_str())))
        })
        .map(|(col, _)| *col)
}

/// Resolves metadata fields and tracks which columns they claim
#[derive(Debug, Default, Clone)]
pub struct MetadataResolver {
    used_columns: Vec<usize>,
    key_columns: Vec<usize>,
    warnings: Vec<String>,
}

impl MetadataResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one field against the table
    pub fn resolve(&mut self, table: &ObservationTable, field: &MetadataField) -> FieldSource {
        if let Some(value) = table.global_attribute(field.constant_attribute) {
            debug!(
                "Metadata {} is the constant '{}'",
                field.constant_attribute, value
            );
            return FieldSource::Constant(escape_text(value));
        }

        let declared = table.global_attribute(field.variable_attribute);
        let names: Vec<&str> = declared
            .into_iter()
            .chain(field.candidates.iter().copied())
            .collect();

        match find_or_guess_column(table, &names) {
            Some(col) => {
                debug!(
                    "Metadata {} taken from column {}",
                    field.constant_attribute,
                    table.column_name(col)
                );
                self.mark_used(col);
                if field.sort_key {
                    self.add_key(col);
                }
                FieldSource::Column(col)
            }
            None => {
                let warning = format!(
                    "// warning: no value found for global attribute {} nor {}",
                    field.constant_attribute, field.variable_attribute
                );
                warn!("{}", warning.trim_start_matches("// "));
                if !self.warnings.contains(&warning) {
                    self.warnings.push(warning);
                }
                FieldSource::Constant(field.default_literal.to_string())
            }
        }
    }

    /// Exclude a column from the ordinary data columns
    pub fn mark_used(&mut self, col: usize) {
        if !self.used_columns.contains(&col) {
            self.used_columns.push(col);
        }
    }

    /// Append a column to the sort keys
    pub fn add_key(&mut self, col: usize) {
        if !self.key_columns.contains(&col) {
            self.key_columns.push(col);
        }
    }

    pub fn is_used(&self, col: usize) -> bool {
        self.used_columns.contains(&col)
    }

    pub fn used_columns(&self) -> &[usize] {
        &self.used_columns
    }

    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
