//! Stripcut Common Utilities
//!
//! Shared infrastructure for all stripcut crates:
//! - Error types and result aliases
//! - Clock scaling between the video frame clock and the audio sample clock
//! - Tracing/logging initialization
//! - Compiler configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
