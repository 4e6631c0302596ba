//! Run configuration parsed from `--key=value` command-line arguments.

use std::path::PathBuf;

use crate::residues::ResidueVariant;
use crate::stats::{AggregatorConfig, DiffThreshold};

pub const DEFAULT_BOUND: u64 = 100;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PLOT_DIR: &str = "plots";

/// Errors from argument parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for --{key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("unrecognized argument '{0}'")]
    UnknownArgument(String),
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Inclusive upper limit on enumerated primes.
    pub bound: u64,
    /// Storage root for cache artifacts.
    pub data_dir: PathBuf,
    /// Output directory for SVG plots.
    pub plot_dir: PathBuf,
    pub aggregator: AggregatorConfig,
    /// Print the residue-set text dump.
    pub dump: bool,
    pub plots: bool,
    /// Drop cached artifacts for `bound` before running.
    pub refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bound: DEFAULT_BOUND,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            plot_dir: PathBuf::from(DEFAULT_PLOT_DIR),
            aggregator: AggregatorConfig::default(),
            dump: false,
            plots: true,
            refresh: false,
        }
    }
}

impl Config {
    /// Parse arguments, excluding the program name. The option list lives
    /// in the binary's module docs.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Config::default();

        for arg in args {
            let arg = arg.as_ref();
            if let Some(value) = arg.strip_prefix("--bound=") {
                config.bound = value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    key: "bound",
                    message: format!("'{}': {}", value, e),
                })?;
            } else if let Some(value) = arg.strip_prefix("--data-dir=") {
                config.data_dir = PathBuf::from(value);
            } else if let Some(value) = arg.strip_prefix("--plot-dir=") {
                config.plot_dir = PathBuf::from(value);
            } else if let Some(value) = arg.strip_prefix("--variant=") {
                config.aggregator.variant =
                    value
                        .parse::<ResidueVariant>()
                        .map_err(|e| ConfigError::InvalidValue {
                            key: "variant",
                            message: e.to_string(),
                        })?;
            } else if let Some(value) = arg.strip_prefix("--threshold=") {
                config.aggregator.threshold =
                    value.parse::<DiffThreshold>().map_err(|message| ConfigError::InvalidValue {
                        key: "threshold",
                        message,
                    })?;
            } else if arg == "--dump" {
                config.dump = true;
            } else if arg == "--no-plots" {
                config.plots = false;
            } else if arg == "--refresh" {
                config.refresh = true;
            } else {
                return Err(ConfigError::UnknownArgument(arg.to_string()));
            }
        }

        Ok(config)
    }
}
