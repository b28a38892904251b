//! Typed access to the center's REST resources
//!
//! Every content view, public or admin, goes through `ApiClient` for data
//! and through `BoundView` for the load/refresh contract. Authorization
//! errors from any call end the admin session via the auth gateway.

pub mod client;
pub mod error;
pub mod filters;
pub mod models;
pub mod notice;
pub mod view;

pub use client::{ApiClient, BlogScope};
pub use error::{ApiError, Result};
pub use filters::{BlogFilter, ProgramCategory};
pub use models::*;
pub use notice::{Notice, NoticeLevel, Notices};
pub use view::{BoundView, LoadOutcome, ViewLifetime, ViewState};
