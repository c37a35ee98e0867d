//! Fields bound to related instances.
//!
//! [`NestedFormField`] embeds a child [`Form`] for a single related
//! instance. [`CheckBoxListField`] edits a many-to-many link set. Formset
//! fields live in [`crate::formset`].

use std::sync::Arc;

use async_trait::async_trait;

use formbind_core::settings::MessageSettings;
use formbind_core::{FormError, FormResult, ValidationError};
use formbind_db::{Instance, ObjectStore, Relation, RelationKind, Value};
use formbind_http::Submission;

use crate::field::{field_core_impl, Field, FieldCore};
use crate::form::{Form, FormSchema};
use crate::html::{self, Attrs};

/// Link attribute of a generic nested form when none is given.
pub const DEFAULT_GENERIC_LINK: &str = "item";

/// Looks up the relation behind `field`'s attribute on the owner model.
pub(crate) fn owner_relation(field: &FieldCore, owner: &dyn Instance) -> FormResult<Relation> {
    owner.meta().relation(&field.attribute).cloned()
}

pub(crate) fn not_fetched(field: &FieldCore) -> FormError {
    FormError::Declaration(format!("field '{}' was used before fetch", field.name()))
}

/// A child form over one related instance.
///
/// Where the link lives depends on the relation:
///
/// * `ForeignKey` – on the owner. The child is saved first and its pk
///   written into the owner attribute.
/// * `OneToOne` / `OneToMany` – on the child. After the owner is saved the
///   child's `remote_field` is pointed at it and the child is saved.
///
/// A generic nested form ([`NestedFormField::generic`]) always links
/// through a named attribute of the child.
#[derive(Debug, Clone)]
pub struct NestedFormField {
    core: FieldCore,
    schema: Arc<FormSchema>,
    link_attribute: Option<String>,
    relation: Option<Relation>,
    child: Option<Form>,
}

impl NestedFormField {
    /// Embeds forms of `schema`.
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self {
            core: FieldCore {
                can_apply: false,
                ..FieldCore::default()
            },
            schema,
            link_attribute: None,
            relation: None,
            child: None,
        }
    }

    /// A nested form linked through the child's `item` attribute.
    pub fn generic(schema: Arc<FormSchema>) -> Self {
        Self::new(schema).related_field(DEFAULT_GENERIC_LINK)
    }

    /// Links through the given attribute of the child.
    #[must_use]
    pub fn related_field(mut self, attribute: impl Into<String>) -> Self {
        self.link_attribute = Some(attribute.into());
        self
    }

    /// The child form, once fetched.
    pub const fn form(&self) -> Option<&Form> {
        self.child.as_ref()
    }

    fn links_on_owner(&self) -> bool {
        self.link_attribute.is_none()
            && self
                .relation
                .as_ref()
                .is_some_and(|r| r.kind == RelationKind::ForeignKey)
    }

    async fn find_related(
        &self,
        owner: &dyn Instance,
        relation: &Relation,
        store: &Arc<dyn ObjectStore>,
    ) -> FormResult<Option<Box<dyn Instance>>> {
        match &self.link_attribute {
            Some(link) => {
                let Some(pk) = owner.pk() else {
                    return Ok(None);
                };
                Ok(store
                    .all(&relation.related_model)
                    .await?
                    .into_iter()
                    .find(|row| row.get(link).as_ref() == Some(&pk)))
            }
            None => Ok(store
                .related(owner, &self.core.attribute)
                .await?
                .into_iter()
                .next()),
        }
    }
}

#[async_trait]
impl Field for NestedFormField {
    field_core_impl!();

    async fn fetch(&mut self, instance: &dyn Instance, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let relation = owner_relation(&self.core, instance)?;
        if relation.kind == RelationKind::ManyToMany {
            return Err(FormError::Declaration(format!(
                "nested form '{}' cannot bind a many-to-many relation",
                self.core.name()
            )));
        }

        let related = match self.find_related(instance, &relation, store).await? {
            Some(related) => related,
            None => store.instantiate(&relation.related_model)?,
        };
        tracing::debug!(
            "Nested form {} bound to {} {}",
            self.core.name(),
            relation.related_model,
            related.pk().map(|pk| pk.to_string()).unwrap_or_else(|| "(new)".to_string())
        );

        let prefix = format!("{}-", self.core.name());
        let child = Form::open_with_prefix(Arc::clone(&self.schema), related, Arc::clone(store), prefix).await?;
        self.child = Some(child);
        self.relation = Some(relation);
        Ok(())
    }

    async fn load(&mut self, submission: &Submission, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let child = self.child.as_mut().ok_or_else(|| not_fetched(&self.core))?;
        child.load(submission).await
    }

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };
        if child.is_valid().await {
            return Ok(());
        }
        Err(ValidationError::new(
            MessageSettings::format(&messages.nested_invalid, self.core.label()),
            "nested_invalid",
        ))
    }

    fn apply(&self, _instance: &mut dyn Instance) {}

    async fn before_save(
        &mut self,
        instance: &mut dyn Instance,
        _store: &Arc<dyn ObjectStore>,
    ) -> FormResult<()> {
        if !self.links_on_owner() {
            return Ok(());
        }
        let child = self.child.as_mut().ok_or_else(|| not_fetched(&self.core))?;
        child.save().await?;
        if let Some(pk) = child.instance().pk() {
            instance.set(&self.core.attribute, pk);
        }
        Ok(())
    }

    async fn after_save(&mut self, instance: &dyn Instance, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        if self.links_on_owner() {
            return Ok(());
        }
        let link = match (&self.link_attribute, &self.relation) {
            (Some(link), _) => link.clone(),
            (None, Some(Relation { remote_field: Some(remote), .. })) => remote.clone(),
            _ => {
                return Err(FormError::Declaration(format!(
                    "nested form '{}' has no link attribute",
                    self.core.name()
                )))
            }
        };
        let owner_pk = instance.pk().ok_or_else(|| {
            FormError::Integrity(format!("owner of '{}' has no primary key", self.core.name()))
        })?;

        let child = self.child.as_mut().ok_or_else(|| not_fetched(&self.core))?;
        child.instance_mut().set(&link, owner_pk);
        child.save().await
    }

    fn render_control(&self, _extra: &Attrs) -> String {
        self.child.as_ref().map(Form::render).unwrap_or_default()
    }

    fn script(&self) -> String {
        self.child.as_ref().map(Form::fields_script).unwrap_or_default()
    }

    fn has_changed(&self) -> bool {
        self.child
            .as_ref()
            .is_some_and(|child| !child.changed_fields().is_empty())
    }
}

/// Checkboxes over every row of a many-to-many related model.
///
/// The value is the list of checked pks as strings. Links are replaced
/// after the owner is saved; the owner attribute itself is never written.
#[derive(Debug, Clone)]
pub struct CheckBoxListField {
    core: FieldCore,
    label_attribute: String,
    options: Vec<(Value, String)>,
    checked: Vec<String>,
}

impl Default for CheckBoxListField {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckBoxListField {
    /// Labels options with the related rows' `name` attribute.
    pub fn new() -> Self {
        Self {
            core: FieldCore {
                can_apply: false,
                ..FieldCore::default()
            },
            label_attribute: "name".to_string(),
            options: Vec::new(),
            checked: Vec::new(),
        }
    }

    /// Labels options with a different attribute.
    #[must_use]
    pub fn label_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.label_attribute = attribute.into();
        self
    }

    /// `(pk, label)` of every related row.
    pub fn options(&self) -> &[(Value, String)] {
        &self.options
    }

    /// The checked pks.
    pub fn checked(&self) -> &[String] {
        &self.checked
    }

    fn set_checked(&mut self, checked: Vec<String>) {
        self.core.value = Value::List(checked.iter().map(|pk| Value::from(pk.as_str())).collect());
        self.checked = checked;
    }
}

#[async_trait]
impl Field for CheckBoxListField {
    field_core_impl!();

    async fn fetch(&mut self, instance: &dyn Instance, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let relation = owner_relation(&self.core, instance)?;
        if relation.kind != RelationKind::ManyToMany {
            return Err(FormError::Declaration(format!(
                "checkbox list '{}' needs a many-to-many relation",
                self.core.name()
            )));
        }

        self.options = store
            .all(&relation.related_model)
            .await?
            .iter()
            .filter_map(|row| {
                let pk = row.pk()?;
                let label = row
                    .get(&self.label_attribute)
                    .filter(|v| !v.is_null())
                    .unwrap_or_else(|| pk.clone())
                    .to_input_string();
                Some((pk, label))
            })
            .collect();

        let checked = store
            .related(instance, &self.core.attribute)
            .await?
            .iter()
            .filter_map(|row| row.pk())
            .map(|pk| pk.to_input_string())
            .collect();
        self.set_checked(checked);
        self.core.old_value = self.core.value.clone();
        Ok(())
    }

    async fn load(&mut self, submission: &Submission, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let checked = submission.values(&self.core.name()).to_vec();
        self.set_checked(checked);
        Ok(())
    }

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.core.required && self.checked.is_empty() {
            return Err(ValidationError::new(
                MessageSettings::format(&messages.required, self.core.label()),
                "required",
            ));
        }
        Ok(())
    }

    fn apply(&self, _instance: &mut dyn Instance) {}

    async fn after_save(&mut self, instance: &dyn Instance, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let mut pks = Vec::with_capacity(self.checked.len());
        for key in &self.checked {
            match self.options.iter().find(|(pk, _)| pk.to_input_string() == *key) {
                Some((pk, _)) => pks.push(pk.clone()),
                None => tracing::warn!("Ignoring unknown option {key} of {}", self.core.name()),
            }
        }
        store.set_related(instance, &self.core.attribute, &pks).await
    }

    fn render_control(&self, extra: &Attrs) -> String {
        let name = self.core.name();
        let items: String = self
            .options
            .iter()
            .enumerate()
            .map(|(i, (pk, label))| {
                let key = pk.to_input_string();
                let id = format!("{}-{i}", self.core.id());
                let checkbox = html::input(
                    &name,
                    &key,
                    &html::attrs([
                        ("type", html::AttrValue::from("checkbox")),
                        ("id", id.clone().into()),
                        ("checked", self.checked.contains(&key).into()),
                    ]),
                );
                let label = html::tag("label", Some(&html::escape(label)), &html::attrs([("for", id)]));
                html::div(&(checkbox + &label), &Attrs::new())
            })
            .collect();

        let mut extra = extra.clone();
        extra.remove("class");
        html::div(&items, &self.core.collect_attributes(Attrs::new(), &extra))
    }
}
