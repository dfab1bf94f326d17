//! # formal-core
//!
//! Core types shared by the formal crates: error types, settings, logging
//! and small utilities. This crate has no dependency on the rest of the
//! workspace.
//!
//! ## Modules
//!
//! - [`error`] - Fatal error type, validation errors and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`, text helpers)
//! - [`settings`] - Settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{
    CallbackError, FieldError, FormError, FormalError, FormalResult, ValidationError,
};
pub use settings::{Settings, SETTINGS};
