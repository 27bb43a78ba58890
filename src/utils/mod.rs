//! Utility Functions
//!
//! ## Error Formatting
//!
//! The [`errors`] module turns an [`anyhow::Error`] into a boxed message with
//! troubleshooting steps picked from the error text:
//!
//! ```rust
//! use recoil_playback::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Pattern not found: ak47");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - Pattern lookup errors → list available names, empty records
//! - Pattern file errors → directory, permissions, JSON shape
//! - Pointer backend errors → build feature, display access
//! - Config errors → syntax, value ranges

pub mod errors;

pub use errors::format_user_error;
