//! The persistence seam between forms and storage.
//!
//! Forms never talk to a database directly. Saving an instance, walking a
//! relation or storing an upload all go through an [`ObjectStore`], which
//! backends implement. [`MemoryStore`](crate::memory::MemoryStore) is the
//! bundled implementation.

use formbind_core::FormResult;

use crate::model::Instance;
use crate::value::Value;

/// Minimal async persistence interface required by forms.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates a fresh, unsaved instance of a registered model.
    ///
    /// Returns `NotFound` for unknown model names.
    fn instantiate(&self, model: &str) -> FormResult<Box<dyn Instance>>;

    /// Inserts the instance (assigning its pk) or updates the stored row.
    async fn save(&self, instance: &mut dyn Instance) -> FormResult<()>;

    /// Deletes the stored row together with its many-to-many links.
    ///
    /// Returns `Integrity` when the instance has no pk.
    async fn delete(&self, instance: &dyn Instance) -> FormResult<()>;

    /// Loads one row by pk.
    async fn get(&self, model: &str, pk: &Value) -> FormResult<Box<dyn Instance>>;

    /// Loads every row of a model, ordered by pk.
    async fn all(&self, model: &str) -> FormResult<Vec<Box<dyn Instance>>>;

    /// Loads the rows linked to `owner` through the relational attribute
    /// `field`. An unsaved owner has no related rows.
    async fn related(&self, owner: &dyn Instance, field: &str)
        -> FormResult<Vec<Box<dyn Instance>>>;

    /// Replaces the many-to-many links of `owner` through `field`.
    async fn set_related(&self, owner: &dyn Instance, field: &str, pks: &[Value])
        -> FormResult<()>;

    /// Persists an uploaded file and returns the URL it is served from.
    /// A name already in use is stored under a new name, never overwritten.
    async fn store_file(&self, name: &str, content: &[u8]) -> FormResult<String>;
}
