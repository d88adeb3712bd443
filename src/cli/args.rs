//! Command-line arguments for the ODV exporter

use crate::config::OdvConfig;
use crate::error::{OdvError, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "odv-export")]
#[command(about = "Export tabular ocean observations as SeaDataNet ODV spreadsheets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Input table (.csv or .parquet)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to INPUT with a .txt extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Global attribute, e.g. -g SDN_EDMO_CODE=486 (repeatable)
    #[arg(short = 'g', long = "global", value_name = "KEY=VALUE", value_parser = parse_global_attribute)]
    pub global_attributes: Vec<(String, String)>,

    /// Column attribute, e.g. -a TEMP:sdn_parameter_urn=SDN:P01::TEMPPR01 (repeatable)
    #[arg(short = 'a', long = "attribute", value_name = "COLUMN:KEY=VALUE", value_parser = parse_column_attribute)]
    pub column_attributes: Vec<ColumnAttribute>,

    /// Emit text columns as METAVAR columns before the primary variable
    #[arg(long)]
    pub emit_text_metavars: bool,

    /// Where variables left out of the ODV file can be downloaded
    #[arg(long, value_name = "URL")]
    pub dataset_url: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors and skip the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

/// One `COLUMN:KEY=VALUE` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAttribute {
    pub column: String,
    pub key: String,
    pub value: String,
}

impl Args {
    /// Get log level based on verbosity
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Output path, defaulting to the input path with a .txt extension
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("txt"))
    }

    /// Export configuration from the flags
    pub fn to_config(&self) -> OdvConfig {
        let mut config = OdvConfig::default();
        if self.emit_text_metavars {
            config = config.with_text_metavars();
        }
        if let Some(url) = &self.dataset_url {
            config = config.with_dataset_url(url);
        }
        config
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Parse `KEY=VALUE`; the value may itself contain `=`
pub fn parse_global_attribute(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(OdvError::invalid_argument(format!(
            "expected KEY=VALUE, got '{}'",
            arg
        ))),
    }
}

/// Parse `COLUMN:KEY=VALUE`
pub fn parse_column_attribute(arg: &str) -> Result<ColumnAttribute> {
    let (column, rest) = arg
        .split_once(':')
        .filter(|(column, _)| !column.trim().is_empty())
        .ok_or_else(|| {
            OdvError::invalid_argument(format!("expected COLUMN:KEY=VALUE, got '{}'", arg))
        })?;
    let (key, value) = parse_global_attribute(rest)?;

    Ok(ColumnAttribute {
        column: column.trim().to_string(),
        key,
        value,
    })
}
