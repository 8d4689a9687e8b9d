//! Glint Common - Shared types and utilities for the Glint workspace.
//!
//! This crate provides:
//! - Runtime configuration with JSON load/save
//! - The error taxonomy shared by the core and the dispatcher
//! - Logging setup (structured, with noise filtering)
//! - Small text utilities

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub use config::GlintConfig;
pub use error::{Error, Result};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::GlintConfig;
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
}
