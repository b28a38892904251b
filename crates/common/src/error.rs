//! Configuration and file errors shared by the console and its libraries

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration or touching local files.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("config file not found: {}", .0.display())]
    MissingConfig(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
