//! Shared types for the candor pipeline.
//!
//! This crate holds the pieces every other candor crate depends on:
//!
//! - [`CandorError`] -- the top-level error taxonomy and [`Result`] alias
//! - [`Config`] -- the configuration surface, loaded once at startup and
//!   passed by reference to every component that needs it
//! - [`CallRecord`] -- one row of the question/answer table with all
//!   accumulated classification columns
//!
//! It deliberately has no async or network dependencies.

pub mod config;
pub mod error;
pub mod record;

pub use config::{Config, DictionaryVariant};
pub use error::{CandorError, Result};
pub use record::CallRecord;
