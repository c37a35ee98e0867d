//! An in-memory [`ObjectStore`].
//!
//! [`MemoryStore`] keeps rows as attribute maps per model, hands out
//! auto-incrementing integer pks and records many-to-many links in a link
//! table. It backs the test suites and works for prototyping forms without a
//! database.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use formbind_core::{FormError, FormResult};
use tokio::sync::Mutex;

use crate::fields::{ModelMeta, RelationKind};
use crate::model::{DynamicObject, Instance};
use crate::store::ObjectStore;
use crate::value::Value;

type Row = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct StoreState {
    rows: HashMap<String, Vec<Row>>,
    next_pk: HashMap<String, i64>,
    /// `(owner model, attribute)` -> `(owner pk, related pk)` pairs.
    links: HashMap<(String, String), Vec<(Value, Value)>>,
    files: BTreeMap<String, Vec<u8>>,
}

/// An in-memory object store.
///
/// # Examples
///
/// ```
/// use formbind_db::fields::{FieldDef, ModelMeta};
/// use formbind_db::memory::MemoryStore;
/// use formbind_db::store::ObjectStore;
/// use formbind_db::value::Value;
///
/// # block_on(async {
/// let store = MemoryStore::new().register(ModelMeta::new("tag").field(FieldDef::new("name")));
///
/// let mut tag = store.instantiate("tag").unwrap();
/// tag.set("name", Value::from("rust"));
/// store.save(tag.as_mut()).await.unwrap();
///
/// assert_eq!(tag.pk(), Some(Value::Int(1)));
/// assert_eq!(store.all("tag").await.unwrap().len(), 1);
/// # });
/// # fn block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    models: HashMap<String, Arc<ModelMeta>>,
    media_url: String,
    state: Mutex<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store serving files from the configured `media_url`.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            media_url: formbind_core::settings::current().media_url.clone(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Registers a model.
    #[must_use]
    pub fn register(mut self, meta: ModelMeta) -> Self {
        self.models.insert(meta.model_name.clone(), Arc::new(meta));
        self
    }

    /// Serves stored files from a different URL prefix.
    #[must_use]
    pub fn with_media_url(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = media_url.into();
        self
    }

    /// Returns the metadata of a registered model.
    pub fn meta(&self, model: &str) -> FormResult<Arc<ModelMeta>> {
        self.models
            .get(model)
            .cloned()
            .ok_or_else(|| FormError::NotFound(format!("Unknown model '{model}'")))
    }

    /// Returns the content of a stored file.
    pub async fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().await.files.get(name).cloned()
    }

    fn build(&self, meta: &Arc<ModelMeta>, row: &Row) -> Box<dyn Instance> {
        Box::new(DynamicObject::with_values(
            Arc::clone(meta),
            row.iter().map(|(k, v)| (k.clone(), v.clone())),
        ))
    }

    fn rows_where<F>(
        &self,
        state: &StoreState,
        model: &str,
        predicate: F,
    ) -> FormResult<Vec<Box<dyn Instance>>>
    where
        F: Fn(&Row) -> bool,
    {
        let meta = self.meta(model)?;
        let mut rows: Vec<&Row> = state
            .rows
            .get(model)
            .map(|rows| rows.iter().filter(|row| predicate(*row)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| compare_pks(a.get(&meta.pk_field), b.get(&meta.pk_field)));
        Ok(rows.into_iter().map(|row| self.build(&meta, row)).collect())
    }
}

fn compare_pks(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => a.cmp(b),
        (a, b) => a
            .map(Value::to_input_string)
            .cmp(&b.map(Value::to_input_string)),
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    fn instantiate(&self, model: &str) -> FormResult<Box<dyn Instance>> {
        let meta = self.meta(model)?;
        Ok(Box::new(DynamicObject::new(meta)))
    }

    async fn save(&self, instance: &mut dyn Instance) -> FormResult<()> {
        let meta = self.meta(instance.model_name())?;
        let mut state = self.state.lock().await;

        let pk = match instance.pk() {
            Some(pk) => pk,
            None => {
                let next = state.next_pk.entry(meta.model_name.clone()).or_insert(1);
                let pk = Value::Int(*next);
                *next += 1;
                instance.set_pk(pk.clone());
                pk
            }
        };
        if let Value::Int(explicit) = pk {
            let next = state.next_pk.entry(meta.model_name.clone()).or_insert(1);
            *next = (*next).max(explicit + 1);
        }

        let row: Row = instance.field_values().into_iter().collect();
        let rows = state.rows.entry(meta.model_name.clone()).or_default();
        match rows
            .iter_mut()
            .find(|existing| existing.get(&meta.pk_field) == Some(&pk))
        {
            Some(existing) => {
                tracing::debug!("Updating {} {pk}", meta.model_name);
                *existing = row;
            }
            None => {
                tracing::debug!("Inserting {} {pk}", meta.model_name);
                rows.push(row);
            }
        }
        Ok(())
    }

    async fn delete(&self, instance: &dyn Instance) -> FormResult<()> {
        let meta = self.meta(instance.model_name())?;
        let pk = instance.pk().ok_or_else(|| {
            FormError::Integrity(format!(
                "{} object can't be deleted because its pk is not set",
                meta.model_name
            ))
        })?;

        let mut state = self.state.lock().await;
        if let Some(rows) = state.rows.get_mut(&meta.model_name) {
            rows.retain(|row| row.get(&meta.pk_field) != Some(&pk));
        }

        for ((owner_model, attribute), links) in &mut state.links {
            if *owner_model == meta.model_name {
                links.retain(|(owner, _)| *owner != pk);
            }
            let points_here = self
                .models
                .get(owner_model)
                .and_then(|owner_meta| owner_meta.relation(attribute).ok())
                .is_some_and(|rel| rel.related_model == meta.model_name);
            if points_here {
                links.retain(|(_, related)| *related != pk);
            }
        }

        tracing::debug!("Deleted {} {pk}", meta.model_name);
        Ok(())
    }

    async fn get(&self, model: &str, pk: &Value) -> FormResult<Box<dyn Instance>> {
        let meta = self.meta(model)?;
        let state = self.state.lock().await;
        state
            .rows
            .get(model)
            .and_then(|rows| rows.iter().find(|row| row.get(&meta.pk_field) == Some(pk)))
            .map(|row| self.build(&meta, row))
            .ok_or_else(|| FormError::NotFound(format!("{model} matching pk {pk} does not exist")))
    }

    async fn all(&self, model: &str) -> FormResult<Vec<Box<dyn Instance>>> {
        let state = self.state.lock().await;
        self.rows_where(&state, model, |_| true)
    }

    async fn related(
        &self,
        owner: &dyn Instance,
        field: &str,
    ) -> FormResult<Vec<Box<dyn Instance>>> {
        let relation = owner.meta().relation(field)?.clone();
        let related_meta = self.meta(&relation.related_model)?;
        let state = self.state.lock().await;

        match relation.kind {
            RelationKind::ForeignKey => {
                let Some(target) = owner.get(field).filter(|v| !v.is_blank()) else {
                    return Ok(Vec::new());
                };
                self.rows_where(&state, &relation.related_model, |row| {
                    row.get(&related_meta.pk_field) == Some(&target)
                })
            }
            RelationKind::OneToOne | RelationKind::OneToMany => {
                let Some(owner_pk) = owner.pk() else {
                    return Ok(Vec::new());
                };
                let remote = relation.remote_field.as_deref().ok_or_else(|| {
                    FormError::Declaration(format!(
                        "Reverse relation '{}.{field}' has no remote field",
                        owner.model_name()
                    ))
                })?;
                self.rows_where(&state, &relation.related_model, |row| {
                    row.get(remote) == Some(&owner_pk)
                })
            }
            RelationKind::ManyToMany => {
                let Some(owner_pk) = owner.pk() else {
                    return Ok(Vec::new());
                };
                let key = (owner.model_name().to_string(), field.to_string());
                let linked: Vec<Value> = state
                    .links
                    .get(&key)
                    .map(|links| {
                        links
                            .iter()
                            .filter(|(o, _)| *o == owner_pk)
                            .map(|(_, r)| r.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                self.rows_where(&state, &relation.related_model, |row| {
                    row.get(&related_meta.pk_field)
                        .is_some_and(|pk| linked.contains(pk))
                })
            }
        }
    }

    async fn set_related(
        &self,
        owner: &dyn Instance,
        field: &str,
        pks: &[Value],
    ) -> FormResult<()> {
        let relation = owner.meta().relation(field)?;
        if relation.kind != RelationKind::ManyToMany {
            return Err(FormError::Declaration(format!(
                "'{}.{field}' is not a many-to-many attribute",
                owner.model_name()
            )));
        }
        let owner_pk = owner.pk().ok_or_else(|| {
            FormError::Integrity(format!(
                "{} must be saved before linking '{field}'",
                owner.model_name()
            ))
        })?;
        let related_meta = self.meta(&relation.related_model)?;

        let mut state = self.state.lock().await;
        let existing = state.rows.get(&relation.related_model);
        for pk in pks {
            let found = existing.is_some_and(|rows| {
                rows.iter().any(|row| row.get(&related_meta.pk_field) == Some(pk))
            });
            if !found {
                return Err(FormError::NotFound(format!(
                    "{} matching pk {pk} does not exist",
                    relation.related_model
                )));
            }
        }

        let links = state
            .links
            .entry((owner.model_name().to_string(), field.to_string()))
            .or_default();
        links.retain(|(o, _)| *o != owner_pk);
        links.extend(pks.iter().map(|pk| (owner_pk.clone(), pk.clone())));
        tracing::debug!(
            "Linked {} {owner_pk} '{field}' to {} row(s)",
            owner.model_name(),
            pks.len()
        );
        Ok(())
    }

    async fn store_file(&self, name: &str, content: &[u8]) -> FormResult<String> {
        if name.is_empty() || name.contains("..") {
            return Err(FormError::MalformedSubmission(format!(
                "Refusing to store file named '{name}'"
            )));
        }
        let mut state = self.state.lock().await;
        let mut stored = name.to_string();
        while state.files.contains_key(&stored) {
            stored = available_name(name);
        }
        if stored != name {
            tracing::debug!("File name '{name}' taken, storing as '{stored}'");
        }
        state.files.insert(stored.clone(), content.to_vec());
        Ok(format!("{}{stored}", self.media_url))
    }
}

/// `me.png` becomes `me_3f2a9c1.png`: a short random suffix before the
/// extension.
fn available_name(name: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..7];
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{suffix}.{extension}"),
        _ => format!("{name}_{suffix}"),
    }
}
