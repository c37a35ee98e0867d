//! # formbind-db
//!
//! The model side of formbind. Forms bind to anything implementing
//! [`Instance`](model::Instance) and persist through an
//! [`ObjectStore`](store::ObjectStore).
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`fields`] - Model metadata ([`ModelMeta`](fields::ModelMeta)) and relations
//! - [`model`] - The [`Instance`](model::Instance) trait and [`DynamicObject`](model::DynamicObject)
//! - [`store`] - The async [`ObjectStore`](store::ObjectStore) trait
//! - [`memory`] - The in-memory [`MemoryStore`](memory::MemoryStore)

pub mod fields;
pub mod memory;
pub mod model;
pub mod store;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use fields::{FieldDef, ModelMeta, Relation, RelationKind};
pub use memory::MemoryStore;
pub use model::{DynamicObject, Instance};
pub use store::ObjectStore;
pub use value::{TemporalKind, Value};
