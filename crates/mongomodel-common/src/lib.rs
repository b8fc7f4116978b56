//! Common utilities for mongomodel
//!
//! This crate provides the error type shared by the façade, the migration
//! tooling and the CLI.

pub mod error;

pub use error::{ErrorSignal, ModelError, Result};
