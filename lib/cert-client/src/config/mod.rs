use std::path::PathBuf;

use thiserror::Error;

pub mod core_config;

#[derive(Debug, Error)]
pub enum ConfigParsingError {
    #[error("Unsupported config file `{}`", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}
