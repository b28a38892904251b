//! Shared types for the center admin workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
