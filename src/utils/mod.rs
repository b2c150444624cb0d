//! The `utils` module provides definitions shared across the `wsrelay` crate:
//! the crate-wide error type and logging setup.

pub mod error;
pub mod logging;

pub use error::{RelayError, Result};
