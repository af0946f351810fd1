//! Utility types and functions.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Identifier grammar checks for names and path segments

mod error;
mod identifier;

pub use error::*;
pub use identifier::*;
