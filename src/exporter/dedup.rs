//! Metadata deduplication across consecutive rows.
//!
//! ODV only needs station metadata on the first line of a run of rows that
//! share it. The metadata block of each row is rendered into a side buffer
//! and compared with the previous row's; a repeat is written as tabs only,
//! so the field count of the line is unchanged.

use crate::constants::METADATA_TIME_FIELD;
use crate::error::Result;
use crate::models::ObservationTable;
use tracing::debug;

use super::chain::{FieldRenderer, render_all};

/// Comparison key for a rendered metadata block.
///
/// When time is the primary variable every row has its own timestamp, so
/// the timestamp field is left out of the comparison.
pub fn metadata_signature(metadata: &str, time_is_primary: bool) -> String {
    if !time_is_primary {
        return metadata.to_string();
    }

    metadata
        .split('\t')
        .enumerate()
        .filter(|(index, _)| *index != METADATA_TIME_FIELD)
        .map(|(_, field)| field)
        .collect::<Vec<_>>()
        .join("\t")
}

/// Per-export state of the deduplication filter
#[derive(Debug, Default)]
pub struct DeduplicationState {
    previous_signature: Option<String>,
    time_is_primary: bool,
    side_buffer: String,
    blanked_rows: usize,
}

impl DeduplicationState {
    pub fn new(time_is_primary: bool) -> Self {
        Self {
            time_is_primary,
            ..Default::default()
        }
    }

    /// Render the metadata block of `row` and append it to `out`, blanked
    /// when it repeats the previous row's metadata
    pub fn render_metadata(
        &mut self,
        renderers: &[FieldRenderer],
        table: &ObservationTable,
        row: usize,
        out: &mut String,
    ) -> Result<()> {
        self.side_buffer.clear();
        render_all(renderers, table, row, &mut self.side_buffer)?;
        let signature = metadata_signature(&self.side_buffer, self.time_is_primary);

        let repeated = match &self.previous_signature {
            None => false,
            Some(previous) if *previous == signature => true,
            Some(previous) => {
                // Re-render from the table before treating the metadata as new
                let mut fresh = String::new();
                render_all(renderers, table, row, &mut fresh)?;
                *previous == metadata_signature(&fresh, self.time_is_primary)
            }
        };

        if repeated {
            out.extend(self.side_buffer.chars().filter(|&c| c == '\t'));
            self.blanked_rows += 1;
        } else {
            debug!("New metadata at row {}", row);
            out.push_str(&self.side_buffer);
        }

        self.previous_signature = Some(signature);
        Ok(())
    }

    /// Rows whose metadata was blanked so far
    pub fn blanked_rows(&self) -> usize {
        self.blanked_rows
    }
}
