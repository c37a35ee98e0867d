//! # formbind
//!
//! Model-bound HTML forms for Rust.
//!
//! This is the meta-crate that re-exports the formbind crates. Depend on
//! `formbind` to get everything, or on the individual crates for
//! finer-grained control.
//!
//! ```
//! use std::sync::Arc;
//! use formbind::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store: Arc<dyn ObjectStore> = Arc::new(
//!     MemoryStore::new()
//!         .register(ModelMeta::new("article").field(FieldDef::new("title"))),
//! );
//! let schema = FormSchema::new("ArticleForm")
//!     .field("title", InputField::text().required())
//!     .build();
//!
//! let mut form = Form::open(schema, store.instantiate("article")?, store).await?;
//! form.load(&Submission::from_query("title=")).await?;
//! assert!(!form.is_valid().await);
//! assert_eq!(form.field_errors("title"), ["Field title is required"]);
//! # Ok::<(), FormError>(())
//! # }).unwrap();
//! ```

/// Errors, settings, settings loading and logging.
pub use formbind_core as core;

/// Query dictionaries, multipart parsing and submissions.
#[cfg(feature = "http")]
pub use formbind_http as http;

/// Values, model metadata, instances and object stores.
#[cfg(feature = "db")]
pub use formbind_db as db;

/// Fields, forms, renderers, nested forms and formsets.
#[cfg(feature = "forms")]
pub use formbind_forms as forms;

/// Third-party crates re-exported for convenience.
pub use async_trait;
pub use tracing;
pub use tracing_subscriber;

/// The most commonly used types.
pub mod prelude {
    pub use formbind_core::logging::setup_logging;
    pub use formbind_core::settings::{self, Settings, SETTINGS};
    pub use formbind_core::{FormError, FormResult, ValidationError};

    #[cfg(feature = "http")]
    pub use formbind_http::{QueryDict, Submission, UploadedFile};

    #[cfg(feature = "db")]
    pub use formbind_db::{
        DynamicObject, FieldDef, Instance, MemoryStore, ModelMeta, ObjectStore, RelationKind, Value,
    };

    #[cfg(feature = "forms")]
    pub use formbind_forms::{
        BooleanField, BootstrapRenderer, CheckBoxField, CheckBoxListField, Field, FieldExt,
        FileField, Form, FormHooks, FormRenderer, FormSchema, FormsetField, HiddenIdField,
        InputField, IntegerField, ManyToOneField, NestedFormField, SelectField, TableRenderer,
        TemporalField, TextAreaField,
    };
}
