//! Streaming chat client for the Spark classification service.
//!
//! This crate covers one network call end to end:
//!
//! - [`auth`] builds the signed connection URL from a shared secret
//! - [`protocol`] defines the request envelope and streamed reply frames
//! - [`SparkClient`] opens one connection per call and reassembles the
//!   multi-chunk reply into a single text result
//! - [`parse`] salvages a structured verdict from possibly malformed
//!   model output
//!
//! Retry is deliberately NOT handled here -- a failed call propagates as
//! a [`SparkError`] and the caller decides whether to try again.

pub mod auth;
pub mod backend;
pub mod client;
pub mod error;
pub mod parse;
pub mod protocol;

pub use auth::SignedUrl;
pub use backend::ChatBackend;
pub use client::SparkClient;
pub use error::{Result, SparkError};
pub use parse::{ModelVerdict, ParseFailure};
