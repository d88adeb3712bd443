//! Export configuration.
//!
//! Settings that are not carried by the table's own attributes: output
//! toggles and the link given to users for variables that cannot be
//! represented in ODV.

use crate::constants::DEFAULT_TIME_MASK;
use serde::{Deserialize, Serialize};

/// Configuration for one ODV export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdvConfig {
    /// Emit unclaimed text columns as METAVAR columns ahead of the primary
    /// variable. Off by default: the SeaDataNet validation tools reject them.
    pub emit_text_metavars: bool,

    /// Where excluded variables can be downloaded in another format
    pub dataset_url: Option<String>,

    /// Time mask used when neither the column nor the table declares one
    pub default_time_mask: String,
}

impl Default for OdvConfig {
    fn default() -> Self {
        Self {
            emit_text_metavars: false,
            dataset_url: None,
            default_time_mask: DEFAULT_TIME_MASK.to_string(),
        }
    }
}

impl OdvConfig {
    /// Enable METAVAR output for text columns
    pub fn with_text_metavars(mut self) -> Self {
        self.emit_text_metavars = true;
        self
    }

    /// Set the download link for excluded variables
    pub fn with_dataset_url(mut self, url: impl Into<String>) -> Self {
        self.dataset_url = Some(url.into());
        self
    }

    /// Set the fallback time mask
    pub fn with_default_time_mask(mut self, mask: impl Into<String>) -> Self {
        self.default_time_mask = mask.into();
        self
    }
}
