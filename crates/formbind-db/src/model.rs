//! The [`Instance`] trait and the bundled [`DynamicObject`].
//!
//! An instance is the object a form reads from and writes to. Forms only
//! ever go through attribute access, so any type can back a form by
//! implementing [`Instance`]; persistence is the
//! [`ObjectStore`](crate::store::ObjectStore)'s job.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::fields::ModelMeta;
use crate::value::Value;

/// Attribute access on one model object.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use formbind_db::fields::{FieldDef, ModelMeta};
/// use formbind_db::model::{DynamicObject, Instance};
/// use formbind_db::value::Value;
///
/// let meta = Arc::new(ModelMeta::new("person").field(FieldDef::new("name")));
/// let mut person = DynamicObject::new(meta);
/// assert!(person.pk().is_none());
///
/// person.set("name", Value::from("Misha"));
/// assert_eq!(person.get("name"), Some(Value::from("Misha")));
/// ```
pub trait Instance: Send + Sync + fmt::Debug {
    /// Returns the model metadata.
    fn meta(&self) -> &ModelMeta;

    /// Reads an attribute, `None` when the instance has no such attribute.
    fn get(&self, attr: &str) -> Option<Value>;

    /// Writes an attribute.
    fn set(&mut self, attr: &str, value: Value);

    /// Returns `true` if the attribute can be read from this instance.
    fn has_attribute(&self, attr: &str) -> bool {
        self.get(attr).is_some()
    }

    /// Returns every stored `(attribute, value)` pair.
    fn field_values(&self) -> Vec<(String, Value)>;

    /// Clones the instance behind a fresh box.
    fn clone_box(&self) -> Box<dyn Instance>;

    /// Returns the model name.
    fn model_name(&self) -> &str {
        &self.meta().model_name
    }

    /// Returns the primary key, `None` while unsaved.
    fn pk(&self) -> Option<Value> {
        self.get(&self.meta().pk_field).filter(|pk| !pk.is_null())
    }

    /// Sets the primary key.
    fn set_pk(&mut self, pk: Value) {
        let pk_field = self.meta().pk_field.clone();
        self.set(&pk_field, pk);
    }
}

impl Clone for Box<dyn Instance> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A model object whose attributes live in a map.
///
/// Every attribute declared in the metadata exists and reads as
/// [`Value::Null`] until set; unknown attributes read as `None` until set.
#[derive(Clone)]
pub struct DynamicObject {
    meta: Arc<ModelMeta>,
    attributes: BTreeMap<String, Value>,
}

impl DynamicObject {
    /// Creates an unsaved object of the given model.
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        Self {
            meta,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates an object with the given attribute values.
    pub fn with_values<I, K>(meta: Arc<ModelMeta>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            meta,
            attributes: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Returns the shared metadata handle.
    pub fn meta_handle(&self) -> Arc<ModelMeta> {
        Arc::clone(&self.meta)
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("model", &self.meta.model_name)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl Instance for DynamicObject {
    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn get(&self, attr: &str) -> Option<Value> {
        if let Some(value) = self.attributes.get(attr) {
            return Some(value.clone());
        }
        let declared = attr == self.meta.pk_field || self.meta.get_field(attr).is_some();
        declared.then_some(Value::Null)
    }

    fn set(&mut self, attr: &str, value: Value) {
        self.attributes.insert(attr.to_string(), value);
    }

    fn field_values(&self) -> Vec<(String, Value)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn clone_box(&self) -> Box<dyn Instance> {
        Box::new(self.clone())
    }
}
