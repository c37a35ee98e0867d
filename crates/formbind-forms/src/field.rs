//! The base field protocol.
//!
//! Every form field owns a [`FieldCore`] (attribute, prefix, label, value)
//! and implements [`Field`], whose default methods give the plain text-input
//! behaviour. Specialised fields override only what differs: how the value
//! is parsed, rendered, applied or cascaded on save.
//!
//! The lifecycle a [`Form`](crate::form::Form) drives is
//! `fetch → load → validate → before_save → apply → after_save`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use formbind_core::settings::{self, MessageSettings};
use formbind_core::{FormResult, ValidationError};
use formbind_db::{Instance, ObjectStore, Value};
use formbind_http::Submission;

use crate::html::{self, AttrValue, Attrs};

/// State shared by every field.
#[derive(Debug, Clone)]
pub struct FieldCore {
    /// The instance attribute this field binds to. Assigned from the form
    /// declaration.
    pub attribute: String,
    /// The owning form's prefix.
    pub prefix: String,
    /// Display label, defaults to the attribute.
    pub label: Option<String>,
    /// Extra HTML attributes for the control; these win over everything.
    pub attributes: Attrs,
    /// Whether a blank value is rejected.
    pub required: bool,
    /// Whether the value is written back to the instance.
    pub can_apply: bool,
    /// Value used when the instance has none.
    pub default_value: Option<Value>,
    /// Client script run against the control, `el` being the jQuery element.
    pub script: Option<String>,
    /// The current value.
    pub value: Value,
    /// The value as fetched from the instance.
    pub old_value: Value,
}

impl Default for FieldCore {
    fn default() -> Self {
        Self {
            attribute: String::new(),
            prefix: String::new(),
            label: None,
            attributes: Attrs::new(),
            required: false,
            can_apply: true,
            default_value: None,
            script: None,
            value: Value::Null,
            old_value: Value::Null,
        }
    }
}

impl FieldCore {
    /// The control name: prefix followed by the attribute.
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.attribute)
    }

    /// The control id; identical to the name.
    pub fn id(&self) -> String {
        self.name()
    }

    /// The label, falling back to the attribute.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.attribute)
    }

    /// Reads the value from the instance, falling back to the default, and
    /// records it as the old value.
    pub fn fetch_from(&mut self, instance: &dyn Instance) {
        if let Some(value) = instance.get(&self.attribute) {
            self.value = value;
        }
        if self.value.is_null() {
            if let Some(default) = &self.default_value {
                self.value = default.clone();
            }
        }
        self.old_value = self.value.clone();
    }

    /// Takes the submitted string for this control, or null when absent.
    pub fn load_from(&mut self, submission: &Submission) {
        self.value = submission
            .value(&self.name())
            .map_or(Value::Null, Value::from);
    }

    /// Fails with the required message when required and blank.
    pub fn check_required(&self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.required && self.value.is_blank() {
            return Err(ValidationError::new(
                MessageSettings::format(&messages.required, self.label()),
                "required",
            ));
        }
        Ok(())
    }

    /// Merges control attributes: control defaults, then renderer extras,
    /// then the field's own attributes.
    pub fn collect_attributes(&self, control: Attrs, extra: &Attrs) -> Attrs {
        let mut attributes = control;
        attributes.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        attributes.extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        attributes
    }
}

/// A single bindable attribute of a form.
#[async_trait]
pub trait Field: Send + Sync + fmt::Debug {
    /// Returns the shared state.
    fn core(&self) -> &FieldCore;

    /// Returns the shared state mutably.
    fn core_mut(&mut self) -> &mut FieldCore;

    /// Clones the field behind a fresh box.
    fn clone_box(&self) -> Box<dyn Field>;

    /// Hidden fields render their control only.
    fn is_hidden(&self) -> bool {
        false
    }

    /// Reads the current value from the instance.
    async fn fetch(&mut self, instance: &dyn Instance, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        self.core_mut().fetch_from(instance);
        Ok(())
    }

    /// Reads the submitted value.
    async fn load(&mut self, submission: &Submission, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        self.core_mut().load_from(submission);
        Ok(())
    }

    /// Checks the loaded value.
    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        self.core().check_required(messages)
    }

    /// Writes the value back to the instance.
    fn apply(&self, instance: &mut dyn Instance) {
        let core = self.core();
        if core.can_apply {
            instance.set(&core.attribute, core.value.clone());
        }
    }

    /// Runs before the instance is applied and saved.
    async fn before_save(
        &mut self,
        _instance: &mut dyn Instance,
        _store: &Arc<dyn ObjectStore>,
    ) -> FormResult<()> {
        Ok(())
    }

    /// Runs after the instance is saved, so its pk is known.
    async fn after_save(&mut self, _instance: &dyn Instance, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        Ok(())
    }

    /// Attributes the control always carries before extras are merged.
    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", "text")])
    }

    /// Renders the control. `extra` carries renderer attributes such as the
    /// CSS class and id.
    fn render_control(&self, extra: &Attrs) -> String {
        let core = self.core();
        html::input(
            &core.name(),
            &core.value.to_input_string(),
            &core.collect_attributes(self.control_attributes(), extra),
        )
    }

    /// Renders the label, `None` for fields without one.
    fn render_label(&self) -> Option<String> {
        let class = AttrValue::from(settings::current().css.label_class.as_str());
        Some(html::tag(
            "label",
            Some(&html::escape(self.core().label())),
            &html::attrs([("class", class)]),
        ))
    }

    /// Client script snippet for this field.
    fn script(&self) -> String {
        self.core().script.clone().unwrap_or_default()
    }

    /// Whether the value differs from what was fetched.
    fn has_changed(&self) -> bool {
        let core = self.core();
        core.value != core.old_value
    }
}

impl Clone for Box<dyn Field> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Builder methods available on every concrete field.
///
/// # Examples
///
/// ```
/// use formbind_forms::field::{Field, FieldExt};
/// use formbind_forms::fields::InputField;
///
/// let field = InputField::text()
///     .with_label("Full name")
///     .required()
///     .with_attr("placeholder", "Your name");
/// assert_eq!(field.core().label(), "Full name");
/// assert!(field.core().required);
/// ```
pub trait FieldExt: Field + Sized {
    /// Sets the label.
    #[must_use]
    fn with_label(mut self, label: impl Into<String>) -> Self {
        self.core_mut().label = Some(label.into());
        self
    }

    /// Marks the field required.
    #[must_use]
    fn required(mut self) -> Self {
        self.core_mut().required = true;
        self
    }

    /// Adds an HTML attribute to the control.
    #[must_use]
    fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.core_mut().attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the value used when the instance has none.
    #[must_use]
    fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.core_mut().default_value = Some(value.into());
        self
    }

    /// Keeps the field from writing to the instance.
    #[must_use]
    fn no_apply(mut self) -> Self {
        self.core_mut().can_apply = false;
        self
    }

    /// Sets the client script.
    #[must_use]
    fn with_script(mut self, script: impl Into<String>) -> Self {
        self.core_mut().script = Some(script.into());
        self
    }
}

impl<F: Field> FieldExt for F {}

/// Implements the state accessors of [`Field`] for a struct with a `core`
/// field.
macro_rules! field_core_impl {
    () => {
        fn core(&self) -> &$crate::field::FieldCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::field::FieldCore {
            &mut self.core
        }

        fn clone_box(&self) -> Box<dyn $crate::field::Field> {
            Box::new(self.clone())
        }
    };
}

pub(crate) use field_core_impl;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::InputField;
    use formbind_db::{DynamicObject, FieldDef, MemoryStore, ModelMeta};

    fn person() -> DynamicObject {
        DynamicObject::new(Arc::new(
            ModelMeta::new("person")
                .field(FieldDef::new("name"))
                .field(FieldDef::new("city")),
        ))
    }

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(MemoryStore::new())
    }

    fn bound(attribute: &str, prefix: &str) -> InputField {
        let mut field = InputField::text();
        field.core_mut().attribute = attribute.to_string();
        field.core_mut().prefix = prefix.to_string();
        field
    }

    #[test]
    fn test_name_id_label() {
        let field = bound("name", "jobs-0-");
        assert_eq!(field.core().name(), "jobs-0-name");
        assert_eq!(field.core().id(), "jobs-0-name");
        assert_eq!(field.core().label(), "name");
        assert_eq!(field.with_label("Name").core().label(), "Name");
    }

    #[tokio::test]
    async fn test_fetch_uses_default_when_null() {
        let mut instance = person();
        let mut field = bound("city", "").with_default("Kyiv");
        field.fetch(&instance, &store()).await.unwrap();
        assert_eq!(field.core().value, Value::from("Kyiv"));
        assert!(!field.has_changed());

        instance.set("city", Value::from("Lviv"));
        field.fetch(&instance, &store()).await.unwrap();
        assert_eq!(field.core().value, Value::from("Lviv"));
    }

    #[tokio::test]
    async fn test_load_missing_key_is_null() {
        let mut field = bound("name", "");
        field.core_mut().value = Value::from("old");
        field
            .load(&Submission::from_query("other=1"), &store())
            .await
            .unwrap();
        assert_eq!(field.core().value, Value::Null);
        assert!(field.has_changed());
    }

    #[tokio::test]
    async fn test_required_validation_message() {
        let mut field = bound("name", "").required();
        field.load(&Submission::from_query("name="), &store()).await.unwrap();
        let err = field.validate(&MessageSettings::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Field name is required");
        assert_eq!(err.code, "required");

        field.load(&Submission::from_query("name=x"), &store()).await.unwrap();
        assert!(field.validate(&MessageSettings::default()).await.is_ok());
    }

    #[test]
    fn test_apply_respects_can_apply() {
        let mut instance = person();
        let mut field = bound("name", "");
        field.core_mut().value = Value::from("Misha");
        field.apply(&mut instance);
        assert_eq!(instance.get("name"), Some(Value::from("Misha")));

        let mut field = bound("city", "").no_apply();
        field.core_mut().value = Value::from("Kyiv");
        field.apply(&mut instance);
        assert_eq!(instance.get("city"), Some(Value::Null));
    }

    #[test]
    fn test_attribute_precedence() {
        let field = bound("name", "").with_attr("class", "wide");
        let html = field.render_control(&html::attrs([("class", "form-control"), ("id", "name")]));
        assert_eq!(html, r#"<input class="wide" id="name" name="name" type="text" value=""/>"#);
    }

    #[test]
    fn test_render_label_escapes() {
        let field = bound("name", "").with_label("<Name>");
        assert_eq!(
            field.render_label().unwrap(),
            r#"<label class="form-label">&lt;Name&gt;</label>"#
        );
    }
}
