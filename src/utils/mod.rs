//! The `utils` module holds the pieces shared across the crate: the error
//! types and the logging setup.

pub mod error;
pub mod logging;
