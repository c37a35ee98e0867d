//! # formbind-forms
//!
//! HTML forms bound to model instances. A [`FormSchema`] declares fields by
//! attribute; a [`Form`] opened over an [`Instance`](formbind_db::Instance)
//! drives them through `fetch → load → validate → save` and renders them.
//! Related rows are edited in place through nested and formset fields.
//!
//! ## Modules
//!
//! - [`html`] - HTML string helpers and attribute maps
//! - [`field`] - The [`Field`] trait and shared [`FieldCore`] state
//! - [`fields`] - Input, integer, date/time, select, checkbox, hidden id and file fields
//! - [`form`] - [`FormSchema`], [`Form`] and [`FormHooks`]
//! - [`renderer`] - Bootstrap and table renderers
//! - [`relations`] - Nested forms and many-to-many checkbox lists
//! - [`formset`] - Repeatable child forms over one-to-many relations
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use formbind_db::{FieldDef, MemoryStore, ModelMeta, ObjectStore};
//! use formbind_forms::{FieldExt, Form, FormSchema, InputField};
//! use formbind_http::Submission;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store: Arc<dyn ObjectStore> =
//!     Arc::new(MemoryStore::new().register(ModelMeta::new("person").field(FieldDef::new("name"))));
//! let schema = FormSchema::new("PersonForm")
//!     .field("name", InputField::text().required())
//!     .build();
//!
//! let mut form = Form::open(schema, store.instantiate("person")?, Arc::clone(&store)).await?;
//! form.load(&Submission::from_query("name=Misha")).await?;
//! assert!(form.is_valid().await);
//! form.save().await?;
//! assert_eq!(store.all("person").await?.len(), 1);
//! # Ok::<(), formbind_core::FormError>(())
//! # }).unwrap();
//! ```

pub mod field;
pub mod fields;
pub mod form;
pub mod formset;
pub mod html;
pub mod relations;
pub mod renderer;

// Re-export the most commonly used types at the crate root.
pub use field::{Field, FieldCore, FieldExt};
pub use fields::{
    BooleanField, CheckBoxField, FileField, HiddenIdField, InputField, IntegerField, SelectField,
    TemporalField, TextAreaField,
};
pub use form::{Form, FormHooks, FormSchema};
pub use formset::{FormsetField, FormsetLayout, ManyToOneField};
pub use relations::{CheckBoxListField, NestedFormField};
pub use renderer::{BootstrapRenderer, FormRenderer, TableRenderer};
