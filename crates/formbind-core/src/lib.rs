//! # formbind-core
//!
//! Errors, settings and logging shared by the formbind crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Messages, CSS classes and formset texts
//! - [`settings_loader`] - TOML/JSON/environment loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{FormError, FormResult, ValidationError};
pub use settings::{Settings, SETTINGS};
