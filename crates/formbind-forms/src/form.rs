//! [`FormSchema`] and [`Form`].
//!
//! A [`FormSchema`] is the declaration of a form: an ordered list of field
//! prototypes keyed by the instance attribute they bind to, the renderer and
//! optional lifecycle hooks. Opening a schema over an
//! [`Instance`](formbind_db::Instance) yields a [`Form`], which clones every
//! prototype and drives it through `fetch → load → validate → save`.
//!
//! Schemas are shared behind an `Arc` so nested and formset fields can open
//! child forms from the same declaration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use formbind_core::logging::form_span;
use formbind_core::settings::{self, MessageSettings};
use formbind_core::FormResult;
use formbind_db::{Instance, ObjectStore, Value};
use formbind_http::Submission;

use crate::field::Field;
use crate::renderer::{BootstrapRenderer, FormRenderer};

/// Lifecycle hooks of a form. Every hook defaults to a no-op.
///
/// `clean` runs at the end of [`Form::is_valid`] for cross-field checks;
/// the save hooks run between the field phases of [`Form::save`].
#[async_trait]
pub trait FormHooks: Send + Sync {
    /// Cross-field validation. Returned errors are keyed by attribute.
    async fn clean(&self, _form: &Form) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }

    /// Runs after every field's `before_save`, before anything is applied.
    async fn before_save(&self, _form: &mut Form) -> FormResult<()> {
        Ok(())
    }

    /// Runs after the fields were applied, before the instance is saved.
    async fn after_apply(&self, _form: &mut Form) -> FormResult<()> {
        Ok(())
    }

    /// Runs after the instance and every field were saved.
    async fn after_save(&self, _form: &mut Form) -> FormResult<()> {
        Ok(())
    }
}

/// The declaration of a form.
///
/// # Examples
///
/// ```
/// use formbind_forms::fields::{InputField, TextAreaField};
/// use formbind_forms::form::FormSchema;
///
/// let schema = FormSchema::new("Form1")
///     .field("name", InputField::text())
///     .field("description", TextAreaField::new())
///     .build();
///
/// assert_eq!(schema.attributes().collect::<Vec<_>>(), vec!["name", "description"]);
/// ```
pub struct FormSchema {
    name: String,
    fields: Vec<(String, Box<dyn Field>)>,
    renderer: Arc<dyn FormRenderer>,
    messages: Option<MessageSettings>,
    hooks: Option<Arc<dyn FormHooks>>,
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("fields", &self.attributes().collect::<Vec<_>>())
            .field("renderer", &self.renderer)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

impl FormSchema {
    /// Starts an empty schema rendered with [`BootstrapRenderer`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            renderer: Arc::new(BootstrapRenderer),
            messages: None,
            hooks: None,
        }
    }

    /// Declares a field bound to `attribute`. Redeclaring an attribute
    /// replaces the earlier field in place.
    #[must_use]
    pub fn field(mut self, attribute: impl Into<String>, field: impl Field + 'static) -> Self {
        let attribute = attribute.into();
        let field: Box<dyn Field> = Box::new(field);
        match self.fields.iter_mut().find(|(a, _)| *a == attribute) {
            Some(slot) => slot.1 = field,
            None => self.fields.push((attribute, field)),
        }
        self
    }

    /// Uses a different renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: impl FormRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Overrides the validation messages from settings.
    #[must_use]
    pub fn messages(mut self, messages: MessageSettings) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Installs lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: impl FormHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(a, _)| a.as_str())
    }
}

/// A schema bound to one instance.
#[derive(Clone)]
pub struct Form {
    schema: Arc<FormSchema>,
    prefix: String,
    instance: Box<dyn Instance>,
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn FormRenderer>,
    fields: Vec<Box<dyn Field>>,
    errors: BTreeMap<String, Vec<String>>,
    bound: bool,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("schema", &self.schema.name)
            .field("prefix", &self.prefix)
            .field("instance", &self.instance)
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Opens a form over `instance` and fetches every field.
    pub async fn open(
        schema: Arc<FormSchema>,
        instance: Box<dyn Instance>,
        store: Arc<dyn ObjectStore>,
    ) -> FormResult<Self> {
        Self::open_with_prefix(schema, instance, store, "").await
    }

    /// Opens a form whose control names start with `prefix`.
    pub async fn open_with_prefix(
        schema: Arc<FormSchema>,
        instance: Box<dyn Instance>,
        store: Arc<dyn ObjectStore>,
        prefix: impl Into<String>,
    ) -> FormResult<Self> {
        let prefix = prefix.into();
        let span = form_span(&schema.name, &prefix);

        async move {
            let mut fields = Vec::with_capacity(schema.fields.len());
            for (attribute, prototype) in &schema.fields {
                let mut field = prototype.clone_box();
                let core = field.core_mut();
                core.attribute.clone_from(attribute);
                core.prefix.clone_from(&prefix);
                field.fetch(instance.as_ref(), &store).await?;
                fields.push(field);
            }
            tracing::debug!("Opened {} with {} field(s)", schema.name, fields.len());

            Ok(Self {
                renderer: Arc::clone(&schema.renderer),
                schema,
                prefix,
                instance,
                store,
                fields,
                errors: BTreeMap::new(),
                bound: false,
            })
        }
        .instrument(span)
        .await
    }

    /// Renders with a different renderer than the schema's.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn FormRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Loads submitted data into every field.
    pub async fn load(&mut self, submission: &Submission) -> FormResult<()> {
        let span = form_span(&self.schema.name, &self.prefix);
        async {
            for field in &mut self.fields {
                field.load(submission, &self.store).await?;
            }
            self.bound = true;
            tracing::debug!("Loaded submission into {}", self.schema.name);
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Validates every field and runs the `clean` hook. Errors are keyed by
    /// attribute.
    pub async fn is_valid(&mut self) -> bool {
        self.errors.clear();
        let messages = self.messages();

        for field in &mut self.fields {
            if let Err(err) = field.validate(&messages).await {
                self.errors
                    .entry(field.core().attribute.clone())
                    .or_default()
                    .push(err.to_string());
            }
        }

        if let Some(hooks) = self.schema.hooks.clone() {
            if let Err(form_errors) = hooks.clean(self).await {
                for (key, msgs) in form_errors {
                    self.errors.entry(key).or_default().extend(msgs);
                }
            }
        }

        if !self.errors.is_empty() {
            tracing::debug!(
                "{} is invalid: {:?}",
                self.schema.name,
                self.errors.keys().collect::<Vec<_>>()
            );
        }
        self.errors.is_empty()
    }

    /// Records an error against an attribute.
    pub fn add_field_error(&mut self, attribute: impl Into<String>, error: impl Into<String>) {
        self.errors
            .entry(attribute.into())
            .or_default()
            .push(error.into());
    }

    /// All errors, keyed by attribute.
    pub const fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// The errors of one attribute.
    pub fn field_errors(&self, attribute: &str) -> &[String] {
        self.errors.get(attribute).map_or(&[], Vec::as_slice)
    }

    /// Applies the fields and saves the instance, cascading into sub-forms.
    ///
    /// Order: every field's `before_save`, the `before_save` hook, every
    /// field's `apply`, the `after_apply` hook, the store save, every
    /// field's `after_save`, the `after_save` hook.
    pub async fn save(&mut self) -> FormResult<()> {
        let span = form_span(&self.schema.name, &self.prefix);
        async {
            let hooks = self.schema.hooks.clone();

            for field in &mut self.fields {
                field.before_save(self.instance.as_mut(), &self.store).await?;
            }
            if let Some(hooks) = &hooks {
                hooks.before_save(self).await?;
            }

            for field in &self.fields {
                field.apply(self.instance.as_mut());
            }
            if let Some(hooks) = &hooks {
                hooks.after_apply(self).await?;
            }

            self.store.save(self.instance.as_mut()).await.inspect_err(|e| {
                tracing::warn!("Saving {} failed: {e}", self.schema.name);
            })?;

            for field in &mut self.fields {
                field.after_save(self.instance.as_ref(), &self.store).await?;
            }
            if let Some(hooks) = &hooks {
                hooks.after_save(self).await?;
            }

            tracing::debug!(
                "Saved {} as {}",
                self.schema.name,
                self.instance.pk().map(|pk| pk.to_string()).unwrap_or_default()
            );
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Renders the form.
    pub fn render(&self) -> String {
        self.renderer.render_form(self)
    }

    /// Per-field scripts, each invoked with its control as `el`.
    pub fn fields_script(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("(function (el) {{ {} }})($('#{}'));", f.script(), f.core().id()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The page script: every field script inside a document-ready handler.
    pub fn script(&self) -> String {
        format!(
            "\n            $(document).ready(function () {{\n                {}\n            }});\n        ",
            self.fields_script()
        )
    }

    /// The current value of every field, by attribute.
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.core().attribute.clone(), f.core().value.clone()))
            .collect()
    }

    /// Attributes whose value differs from the fetched one.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.has_changed())
            .map(|f| f.core().attribute.as_str())
            .collect()
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &dyn Field> {
        self.fields.iter().map(AsRef::as_ref)
    }

    /// Looks up a field by attribute.
    pub fn field(&self, attribute: &str) -> Option<&dyn Field> {
        self.fields()
            .find(|f| f.core().attribute == attribute)
    }

    /// Looks up a field by attribute, mutably.
    pub fn field_mut(&mut self, attribute: &str) -> Option<&mut Box<dyn Field>> {
        self.fields
            .iter_mut()
            .find(|f| f.core().attribute == attribute)
    }

    /// The bound instance.
    pub fn instance(&self) -> &dyn Instance {
        self.instance.as_ref()
    }

    /// The bound instance, mutably.
    pub fn instance_mut(&mut self) -> &mut dyn Instance {
        self.instance.as_mut()
    }

    /// Consumes the form, returning the instance.
    pub fn into_instance(self) -> Box<dyn Instance> {
        self.instance
    }

    /// The control name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The schema this form was opened from.
    pub const fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    /// The store the form persists through.
    pub const fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Whether a submission was loaded.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// The validation messages in effect: the schema's override, otherwise
    /// the configured ones.
    pub fn messages(&self) -> MessageSettings {
        self.schema
            .messages
            .clone()
            .unwrap_or_else(|| settings::current().messages.clone())
    }

    /// A JSON context for external templates.
    pub fn as_context(&self) -> serde_json::Value {
        let fields: Vec<serde_json::Value> = self
            .fields
            .iter()
            .map(|f| {
                let core = f.core();
                serde_json::json!({
                    "attribute": core.attribute,
                    "name": core.name(),
                    "id": core.id(),
                    "label": core.label(),
                    "value": core.value.to_json(),
                    "required": core.required,
                    "hidden": f.is_hidden(),
                    "errors": self.field_errors(&core.attribute),
                    "html": self.renderer.render_field(f.as_ref(), self.field_errors(&core.attribute)),
                })
            })
            .collect();

        serde_json::json!({
            "name": self.schema.name,
            "prefix": self.prefix,
            "fields": fields,
            "errors": self.errors,
            "is_bound": self.bound,
            "script": self.script(),
        })
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::field::FieldExt;
    use crate::fields::{HiddenIdField, InputField, IntegerField, TextAreaField};
    use formbind_db::{FieldDef, MemoryStore, ModelMeta};

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(
            MemoryStore::new().register(
                ModelMeta::new("person")
                    .field(FieldDef::new("name"))
                    .field(FieldDef::new("description"))
                    .field(FieldDef::new("age")),
            ),
        )
    }

    fn schema() -> Arc<FormSchema> {
        FormSchema::new("PersonForm")
            .field("id", HiddenIdField::new())
            .field("name", InputField::text().required())
            .field("description", TextAreaField::new())
            .field("age", IntegerField::new().with_label("Age"))
            .build()
    }

    async fn open(store: &Arc<dyn ObjectStore>) -> Form {
        let mut instance = store.instantiate("person").unwrap();
        instance.set("name", Value::from("Misha"));
        instance.set("description", Value::from("Best programmer ever"));
        Form::open(schema(), instance, Arc::clone(store)).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_fetches_values() {
        let store = store();
        let form = open(&store).await;
        assert_eq!(form.values().get("name"), Some(&Value::from("Misha")));
        assert_eq!(form.values().get("age"), Some(&Value::Null));
        assert!(form.changed_fields().is_empty());
        assert!(!form.is_bound());
    }

    #[tokio::test]
    async fn test_render_lists_fields_in_order() {
        let store = store();
        let form = open(&store).await;
        let html = form.render();
        assert!(html.starts_with(r#"<input name="id" type="hidden" value=""/>"#));
        let name_at = html.find(r#"name="name""#).unwrap();
        let description_at = html.find(r#"name="description""#).unwrap();
        assert!(name_at < description_at);
        assert!(html.contains("Best programmer ever</textarea>"));
        assert_eq!(form.to_string(), html);
    }

    #[tokio::test]
    async fn test_errors_keyed_by_attribute() {
        let store = store();
        let mut form = open(&store).await;
        form.load(&Submission::from_query("name=&age=abc")).await.unwrap();
        assert!(!form.is_valid().await);
        assert_eq!(form.field_errors("name"), ["Field name is required"]);
        assert_eq!(form.field_errors("age"), ["Value of Age must be numerical"]);
        assert!(form.render().contains(r#"<div class="form-error">Field name is required</div>"#));
    }

    #[tokio::test]
    async fn test_is_valid_clears_previous_errors() {
        let store = store();
        let mut form = open(&store).await;
        form.add_field_error("name", "custom");
        form.load(&Submission::from_query("name=Misha2&age=5")).await.unwrap();
        assert!(form.is_valid().await);
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_save_applies_and_persists() {
        let store = store();
        let mut form = open(&store).await;
        form.load(&Submission::from_query("name=Misha2&description=new+description&age=33"))
            .await
            .unwrap();
        assert!(form.is_valid().await);
        assert_eq!(form.changed_fields(), vec!["name", "description", "age"]);
        form.save().await.unwrap();

        let pk = form.instance().pk().unwrap();
        let saved = store.get("person", &pk).await.unwrap();
        assert_eq!(saved.get("name"), Some(Value::from("Misha2")));
        assert_eq!(saved.get("description"), Some(Value::from("new description")));
        assert_eq!(saved.get("age"), Some(Value::Int(33)));
    }

    #[tokio::test]
    async fn test_prefix_applies_to_names() {
        let store = store();
        let form = Form::open_with_prefix(
            schema(),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
            "jobs-0-",
        )
        .await
        .unwrap();
        assert!(form.render().contains(r#"id="jobs-0-name" name="jobs-0-name""#));
        assert_eq!(form.prefix(), "jobs-0-");
    }

    #[tokio::test]
    async fn test_script_wraps_field_scripts() {
        let store = store();
        let schema = FormSchema::new("Scripted")
            .field("name", InputField::text().with_script("el.css('background', 'black');"))
            .build();
        let form = Form::open(schema, store.instantiate("person").unwrap(), store)
            .await
            .unwrap();
        let script = form.script();
        assert!(script.contains("$(document).ready(function () {"));
        assert!(script.contains("(function (el) { el.css('background', 'black'); })($('#name'));"));
    }

    #[tokio::test]
    async fn test_as_context() {
        let store = store();
        let mut form = open(&store).await;
        form.load(&Submission::from_query("name=")).await.unwrap();
        form.is_valid().await;

        let ctx = form.as_context();
        assert_eq!(ctx["name"], "PersonForm");
        assert_eq!(ctx["fields"].as_array().map(Vec::len), Some(4));
        assert_eq!(ctx["fields"][1]["name"], "name");
        assert_eq!(ctx["errors"]["name"][0], "Field name is required");
        assert_eq!(ctx["is_bound"], true);
    }

    #[tokio::test]
    async fn test_messages_override() {
        let store = store();
        let schema = FormSchema::new("Custom")
            .field("name", InputField::text().required())
            .messages(MessageSettings {
                required: "{label}: please fill in".to_string(),
                ..MessageSettings::default()
            })
            .build();
        let mut form = Form::open(schema, store.instantiate("person").unwrap(), store)
            .await
            .unwrap();
        form.load(&Submission::default()).await.unwrap();
        assert!(!form.is_valid().await);
        assert_eq!(form.field_errors("name"), ["name: please fill in"]);
    }

    #[derive(Default)]
    struct RecordingHooks {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl FormHooks for Arc<RecordingHooks> {
        async fn clean(&self, form: &Form) -> Result<(), HashMap<String, Vec<String>>> {
            self.calls.lock().unwrap().push("clean");
            if form.values().get("name") == Some(&Value::from("admin")) {
                let mut errors = HashMap::new();
                errors.insert("name".to_string(), vec!["Reserved name".to_string()]);
                return Err(errors);
            }
            Ok(())
        }

        async fn before_save(&self, _form: &mut Form) -> FormResult<()> {
            self.calls.lock().unwrap().push("before_save");
            Ok(())
        }

        async fn after_apply(&self, form: &mut Form) -> FormResult<()> {
            self.calls.lock().unwrap().push("after_apply");
            form.instance_mut().set("description", Value::from("set by hook"));
            Ok(())
        }

        async fn after_save(&self, form: &mut Form) -> FormResult<()> {
            self.calls.lock().unwrap().push("after_save");
            assert!(form.instance().pk().is_some());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hooks_order_and_clean() {
        let store = store();
        let hooks = Arc::new(RecordingHooks::default());
        let schema = FormSchema::new("Hooked")
            .field("name", InputField::text())
            .hooks(Arc::clone(&hooks))
            .build();
        let mut form = Form::open(schema, store.instantiate("person").unwrap(), Arc::clone(&store))
            .await
            .unwrap();

        form.load(&Submission::from_query("name=admin")).await.unwrap();
        assert!(!form.is_valid().await);
        assert_eq!(form.field_errors("name"), ["Reserved name"]);

        form.load(&Submission::from_query("name=Misha")).await.unwrap();
        assert!(form.is_valid().await);
        form.save().await.unwrap();

        assert_eq!(
            *hooks.calls.lock().unwrap(),
            vec!["clean", "clean", "before_save", "after_apply", "after_save"]
        );
        let saved = store.all("person").await.unwrap();
        assert_eq!(saved[0].get("description"), Some(Value::from("set by hook")));
    }
}
