//! Core types for the Bodhi Guide chat relay
//!
//! This crate provides conversation sessions, the response formatter,
//! configuration loading and logging setup shared by the other crates.

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
pub use format::format_response;
