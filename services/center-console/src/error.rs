//! Console command errors
//!
//! Startup failures (config, session path, HTTP client) go through `anyhow`
//! in `main`. The errors here are per-command outcomes that map to exit
//! code 2: the command ran but was refused or failed at the backend.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not signed in; redirected to {0}")]
    Redirected(String),

    #[error("{0}")]
    Login(#[from] center_auth::Error),

    #[error("{0}")]
    Api(#[from] center_api::ApiError),

    #[error("failed to read {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    InvalidInput(String),
}

/// Result alias using console Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Input { .. } | Error::InvalidJson { .. } | Error::InvalidInput(_) => 1,
            Error::Redirected(_) | Error::Login(_) | Error::Api(_) => 2,
        }
    }
}
