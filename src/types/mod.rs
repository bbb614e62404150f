//! Shared types

pub mod error;

pub use error::{ApiError, Result};
