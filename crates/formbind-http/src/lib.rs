//! # formbind-http
//!
//! Request-side data for formbind: url-encoded bodies, multipart uploads
//! and the [`Submission`] handed to a form when it is loaded.
//!
//! ## Modules
//!
//! - [`querydict`] - Submitted controls keyed by name
//! - [`upload`] - Multipart parsing and uploaded files
//! - [`submission`] - Values and files posted for one form

pub mod querydict;
pub mod submission;
pub mod upload;

pub use querydict::QueryDict;
pub use submission::Submission;
pub use upload::{FileDict, UploadedFile};
