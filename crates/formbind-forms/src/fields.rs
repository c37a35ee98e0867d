//! The field catalogue.
//!
//! Plain value fields: inputs, numbers, dates, text areas, selects,
//! booleans, checkboxes, hidden ids and file uploads. Relational fields live in
//! [`relations`](crate::relations) and [`formset`](crate::formset).

use std::sync::Arc;

use async_trait::async_trait;

use formbind_core::settings::MessageSettings;
use formbind_core::{FormResult, ValidationError};
use formbind_db::value::TemporalKind;
use formbind_db::{Instance, ObjectStore, Value};
use formbind_http::{Submission, UploadedFile};

use crate::field::{field_core_impl, Field, FieldCore};
use crate::html::{self, AttrValue, Attrs};

/// Client script turning a text area into a rich text editor.
pub const EDITOR_SCRIPT: &str = "CKEDITOR.replace(el[0]);";

/// An `<input>` of a configurable type (text, email, password, url, color,
/// date, ...).
///
/// # Examples
///
/// ```
/// use formbind_forms::field::Field;
/// use formbind_forms::fields::InputField;
///
/// let field = InputField::new("email");
/// assert!(field.render_control(&Default::default()).contains(r#"type="email""#));
/// ```
#[derive(Debug, Clone)]
pub struct InputField {
    core: FieldCore,
    input_type: String,
}

impl InputField {
    /// Creates an input of the given type.
    pub fn new(input_type: impl Into<String>) -> Self {
        Self {
            core: FieldCore::default(),
            input_type: input_type.into(),
        }
    }

    /// A plain text input.
    pub fn text() -> Self {
        Self::new("text")
    }

    /// A `type="url"` input.
    pub fn url() -> Self {
        Self::new("url")
    }

    /// The configured input type.
    pub fn input_type(&self) -> &str {
        &self.input_type
    }
}

#[async_trait]
impl Field for InputField {
    field_core_impl!();

    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", self.input_type.as_str())])
    }

    fn render_control(&self, extra: &Attrs) -> String {
        let mut attributes = self
            .core
            .collect_attributes(self.control_attributes(), extra);
        attributes.insert("type".to_string(), self.input_type.as_str().into());
        html::input(&self.core.name(), &self.core.value.to_input_string(), &attributes)
    }
}

/// A numeric input whose value must parse as an integer.
#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    core: FieldCore,
}

impl IntegerField {
    /// Creates an integer field.
    pub fn new() -> Self {
        Self::default()
    }

    fn parsed(&self) -> Option<i64> {
        match &self.core.value {
            Value::Int(i) => Some(*i),
            other => other.to_input_string().trim().parse().ok(),
        }
    }
}

#[async_trait]
impl Field for IntegerField {
    field_core_impl!();

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.core.value.is_blank() {
            return self.core.check_required(messages);
        }
        if self.parsed().is_none() {
            return Err(ValidationError::new(
                MessageSettings::format(&messages.integer, self.core.label()),
                "integer",
            )
            .rejecting(self.core.value.to_input_string()));
        }
        Ok(())
    }

    fn apply(&self, instance: &mut dyn Instance) {
        if !self.core.can_apply {
            return;
        }
        if self.core.value.is_blank() {
            instance.set(&self.core.attribute, Value::Null);
        } else if let Some(parsed) = self.parsed() {
            instance.set(&self.core.attribute, Value::Int(parsed));
        }
    }

    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", "number")])
    }
}

/// A date, time or datetime input. Submitted text is parsed on validate
/// and written as the matching temporal value on apply.
///
/// # Examples
///
/// ```
/// use formbind_forms::field::Field;
/// use formbind_forms::fields::TemporalField;
///
/// let field = TemporalField::datetime();
/// assert!(field.render_control(&Default::default()).contains(r#"type="datetime-local""#));
/// ```
#[derive(Debug, Clone)]
pub struct TemporalField {
    core: FieldCore,
    kind: TemporalKind,
}

impl TemporalField {
    pub fn new(kind: TemporalKind) -> Self {
        Self {
            core: FieldCore::default(),
            kind,
        }
    }

    /// `<input type="date">`.
    pub fn date() -> Self {
        Self::new(TemporalKind::Date)
    }

    /// `<input type="datetime-local">`.
    pub fn datetime() -> Self {
        Self::new(TemporalKind::DateTime)
    }

    /// `<input type="time">`.
    pub fn time() -> Self {
        Self::new(TemporalKind::Time)
    }

    fn parsed(&self) -> Option<Value> {
        match (&self.core.value, self.kind) {
            (Value::Date(_), TemporalKind::Date)
            | (Value::DateTime(_), TemporalKind::DateTime)
            | (Value::Time(_), TemporalKind::Time) => Some(self.core.value.clone()),
            (other, kind) => Value::parse_temporal(kind, &other.to_input_string()),
        }
    }
}

#[async_trait]
impl Field for TemporalField {
    field_core_impl!();

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.core.value.is_blank() {
            return self.core.check_required(messages);
        }
        if self.parsed().is_none() {
            let message = MessageSettings::format(&messages.temporal, self.core.label())
                .replace("{kind}", &self.kind.to_string());
            return Err(ValidationError::new(message, "invalid")
                .rejecting(self.core.value.to_input_string()));
        }
        Ok(())
    }

    fn apply(&self, instance: &mut dyn Instance) {
        if !self.core.can_apply {
            return;
        }
        if self.core.value.is_blank() {
            instance.set(&self.core.attribute, Value::Null);
        } else if let Some(parsed) = self.parsed() {
            instance.set(&self.core.attribute, parsed);
        }
    }

    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", self.kind.input_type())])
    }
}

/// A `<textarea>`.
#[derive(Debug, Clone, Default)]
pub struct TextAreaField {
    core: FieldCore,
}

impl TextAreaField {
    /// Creates a text area.
    pub fn new() -> Self {
        Self::default()
    }

    /// A text area replaced by a rich text editor on the client.
    pub fn editor() -> Self {
        let mut field = Self::default();
        field.core.script = Some(EDITOR_SCRIPT.to_string());
        field
    }
}

#[async_trait]
impl Field for TextAreaField {
    field_core_impl!();

    fn control_attributes(&self) -> Attrs {
        Attrs::new()
    }

    fn render_control(&self, extra: &Attrs) -> String {
        html::textarea(
            &self.core.name(),
            &self.core.value.to_input_string(),
            &self.core.collect_attributes(self.control_attributes(), extra),
        )
    }
}

/// A `<select>` over fixed `(key, text)` options.
#[derive(Debug, Clone, Default)]
pub struct SelectField {
    core: FieldCore,
    options: Vec<(String, String)>,
}

impl SelectField {
    /// Creates a select over the given options.
    pub fn new<K, T, I>(options: I) -> Self
    where
        K: Into<String>,
        T: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        Self {
            core: FieldCore::default(),
            options: options
                .into_iter()
                .map(|(k, t)| (k.into(), t.into()))
                .collect(),
        }
    }

    /// The options in display order.
    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }
}

#[async_trait]
impl Field for SelectField {
    field_core_impl!();

    fn control_attributes(&self) -> Attrs {
        Attrs::new()
    }

    fn render_control(&self, extra: &Attrs) -> String {
        html::select(
            &self.core.name(),
            &self.core.value.to_input_string(),
            &self.options,
            &self.core.collect_attributes(self.control_attributes(), extra),
        )
    }
}

/// A Yes/No select writing a boolean.
#[derive(Debug, Clone, Default)]
pub struct BooleanField {
    core: FieldCore,
}

impl BooleanField {
    /// Creates a boolean field.
    pub fn new() -> Self {
        Self::default()
    }

    fn selected_key(&self) -> &'static str {
        let value = &self.core.value;
        let flag = value
            .as_bool()
            .or_else(|| match value.as_int()? {
                1 => Some(true),
                0 => Some(false),
                _ => None,
            })
            .or_else(|| match value.as_str()? {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            });
        match flag {
            Some(true) => "1",
            Some(false) => "0",
            None => "",
        }
    }
}

#[async_trait]
impl Field for BooleanField {
    field_core_impl!();

    fn apply(&self, instance: &mut dyn Instance) {
        if !self.core.can_apply {
            return;
        }
        let value = match self.selected_key() {
            "1" => Value::Bool(true),
            "0" => Value::Bool(false),
            _ => Value::Null,
        };
        instance.set(&self.core.attribute, value);
    }

    fn control_attributes(&self) -> Attrs {
        Attrs::new()
    }

    fn render_control(&self, extra: &Attrs) -> String {
        let options = [("1", "Yes"), ("0", "No")].map(|(k, t)| (k.to_string(), t.to_string()));
        html::select(
            &self.core.name(),
            self.selected_key(),
            &options,
            &self.core.collect_attributes(self.control_attributes(), extra),
        )
    }
}

/// A checkbox preceded by a hidden `0` input, so an unchecked box still
/// submits a value.
#[derive(Debug, Clone, Default)]
pub struct CheckBoxField {
    core: FieldCore,
}

impl CheckBoxField {
    /// Creates a checkbox field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current value counts as checked.
    pub fn is_checked(&self) -> bool {
        let value = &self.core.value;
        value
            .as_bool()
            .or_else(|| value.as_int().map(|i| i == 1))
            .or_else(|| value.as_str().map(|s| s == "1"))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Field for CheckBoxField {
    field_core_impl!();

    fn apply(&self, instance: &mut dyn Instance) {
        if self.core.can_apply {
            instance.set(&self.core.attribute, Value::Bool(self.is_checked()));
        }
    }

    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", "checkbox")])
    }

    fn render_control(&self, extra: &Attrs) -> String {
        let name = self.core.name();

        let hidden = html::input(&name, "0", &html::attrs([("type", "hidden")]));

        let mut attributes = self
            .core
            .collect_attributes(self.control_attributes(), extra);
        attributes.insert("checked".to_string(), AttrValue::Flag(self.is_checked()));
        let checkbox = html::input(&name, "1", &attributes);

        hidden + &checkbox
    }
}

/// A hidden input carrying the instance pk. Never written back.
#[derive(Debug, Clone)]
pub struct HiddenIdField {
    core: FieldCore,
}

impl Default for HiddenIdField {
    fn default() -> Self {
        Self::new()
    }
}

impl HiddenIdField {
    /// Creates a hidden id field.
    pub fn new() -> Self {
        Self {
            core: FieldCore {
                can_apply: false,
                ..FieldCore::default()
            },
        }
    }
}

#[async_trait]
impl Field for HiddenIdField {
    field_core_impl!();

    fn is_hidden(&self) -> bool {
        true
    }

    fn apply(&self, _instance: &mut dyn Instance) {}

    fn render_control(&self, _extra: &Attrs) -> String {
        html::input(
            &self.core.name(),
            &self.core.value.to_input_string(),
            &html::attrs([("type", "hidden")]),
        )
    }

    fn render_label(&self) -> Option<String> {
        None
    }
}

/// A file upload. The value is the URL of the stored file.
///
/// A new upload is persisted through
/// [`ObjectStore::store_file`](formbind_db::ObjectStore::store_file) before
/// the instance is applied; without one the attribute is left untouched.
#[derive(Debug, Clone, Default)]
pub struct FileField {
    core: FieldCore,
    upload: Option<UploadedFile>,
    stored: bool,
}

impl FileField {
    /// Creates a file field.
    pub fn new() -> Self {
        Self::default()
    }

    /// A file field accepting images only.
    pub fn image() -> Self {
        let mut field = Self::default();
        field
            .core
            .attributes
            .insert("accept".to_string(), "image/*".into());
        field
    }

    /// The file uploaded with the last submission.
    pub fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }
}

#[async_trait]
impl Field for FileField {
    field_core_impl!();

    async fn load(&mut self, submission: &Submission, _store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        self.upload = submission.file(&self.core.name()).cloned();
        self.stored = false;
        Ok(())
    }

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.upload.is_some() {
            return Ok(());
        }
        self.core.check_required(messages)
    }

    async fn before_save(
        &mut self,
        _instance: &mut dyn Instance,
        store: &Arc<dyn ObjectStore>,
    ) -> FormResult<()> {
        if let Some(upload) = self.upload.take() {
            let url = store.store_file(&upload.name, &upload.content).await?;
            tracing::debug!("Stored upload '{}' for {} at {url}", upload.name, self.core.name());
            self.core.value = Value::String(url);
            self.stored = true;
        }
        Ok(())
    }

    fn apply(&self, instance: &mut dyn Instance) {
        if self.core.can_apply && self.stored {
            instance.set(&self.core.attribute, self.core.value.clone());
        }
    }

    fn control_attributes(&self) -> Attrs {
        html::attrs([("type", "file")])
    }

    fn render_control(&self, extra: &Attrs) -> String {
        let url = self.core.value.to_input_string();
        let existing = html::link(&html::escape(&url), &url, &html::attrs([("target", "_blank")]));

        let mut attributes = self
            .core
            .collect_attributes(self.control_attributes(), extra);
        attributes.insert("type".to_string(), "file".into());
        attributes.insert("name".to_string(), self.core.name().into());
        let input = html::tag("input", None, &attributes);

        html::div(&(existing + &input), &Attrs::new())
    }

    fn has_changed(&self) -> bool {
        self.upload.is_some() || self.core.value != self.core.old_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldExt;
    use formbind_db::{DynamicObject, FieldDef, MemoryStore, ModelMeta};

    fn person() -> DynamicObject {
        DynamicObject::new(Arc::new(
            ModelMeta::new("person")
                .field(FieldDef::new("age"))
                .field(FieldDef::new("active"))
                .field(FieldDef::new("born"))
                .field(FieldDef::new("cv")),
        ))
    }

    fn bind<F: Field>(mut field: F, attribute: &str) -> F {
        field.core_mut().attribute = attribute.to_string();
        field
    }

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(MemoryStore::new().with_media_url("/media/"))
    }

    #[test]
    fn test_input_type_cannot_be_overridden() {
        let field = bind(InputField::url(), "site").with_attr("type", "text");
        assert!(field.render_control(&Attrs::new()).contains(r#"type="url""#));
    }

    #[tokio::test]
    async fn test_integer_validation() {
        let messages = MessageSettings::default();
        let mut field = bind(IntegerField::new(), "age");

        field.load(&Submission::from_query("age=abc"), &store()).await.unwrap();
        let err = field.validate(&messages).await.unwrap_err();
        assert_eq!(err.to_string(), "Value of age must be numerical");
        assert_eq!(err.rejected.as_deref(), Some("abc"));

        field.load(&Submission::from_query("age=+42"), &store()).await.unwrap();
        assert!(field.validate(&messages).await.is_ok());

        field.load(&Submission::from_query("age="), &store()).await.unwrap();
        assert!(field.validate(&messages).await.is_ok());
    }

    #[tokio::test]
    async fn test_required_integer_blank() {
        let mut field = bind(IntegerField::new(), "age").with_label("Age").required();
        field.load(&Submission::from_query(""), &store()).await.unwrap();
        let err = field.validate(&MessageSettings::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Field Age is required");
    }

    #[test]
    fn test_integer_apply() {
        let mut instance = person();
        let mut field = bind(IntegerField::new(), "age");
        field.core_mut().value = Value::from(" 7 ");
        field.apply(&mut instance);
        assert_eq!(instance.get("age"), Some(Value::Int(7)));
        assert!(field.render_control(&Attrs::new()).contains(r#"type="number""#));
    }

    #[tokio::test]
    async fn test_temporal_field() {
        let messages = MessageSettings::default();
        let mut instance = person();
        let mut field = bind(TemporalField::date(), "born").with_label("Birthday");

        field.load(&Submission::from_query("born=yesterday"), &store()).await.unwrap();
        let err = field.validate(&messages).await.unwrap_err();
        assert_eq!(err.to_string(), "Value of Birthday must be a valid date");

        field.load(&Submission::from_query("born=1990-05-17"), &store()).await.unwrap();
        assert!(field.validate(&messages).await.is_ok());
        field.apply(&mut instance);
        let born = instance.get("born").unwrap();
        assert_eq!(born.to_input_string(), "1990-05-17");
        assert!(matches!(born, Value::Date(_)));

        field.core_mut().value = born;
        assert!(field
            .render_control(&Attrs::new())
            .contains(r#"type="date" value="1990-05-17""#));
    }

    #[test]
    fn test_editor_script() {
        let field = TextAreaField::editor();
        assert_eq!(field.script(), EDITOR_SCRIPT);
        assert_eq!(TextAreaField::new().script(), "");
    }

    #[test]
    fn test_select_render() {
        let mut field = bind(SelectField::new([("a", "Alpha"), ("b", "Beta")]), "letter");
        field.core_mut().value = Value::from("b");
        assert_eq!(
            field.render_control(&Attrs::new()),
            r#"<select name="letter"><option value="a">Alpha</option><option selected value="b">Beta</option></select>"#
        );
    }

    #[test]
    fn test_boolean_field() {
        let mut instance = person();
        let mut field = bind(BooleanField::new(), "active");
        field.core_mut().value = Value::Bool(true);
        assert!(field
            .render_control(&Attrs::new())
            .contains(r#"<option selected value="1">Yes</option>"#));

        field.core_mut().value = Value::from("0");
        field.apply(&mut instance);
        assert_eq!(instance.get("active"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_checkbox_render_and_apply() {
        let mut instance = person();
        let mut field = bind(CheckBoxField::new(), "active");
        field.core_mut().value = Value::from("1");
        assert_eq!(
            field.render_control(&html::attrs([("id", "active")])),
            r#"<input name="active" type="hidden" value="0"/><input checked id="active" name="active" type="checkbox" value="1"/>"#
        );
        field.apply(&mut instance);
        assert_eq!(instance.get("active"), Some(Value::Bool(true)));

        field.core_mut().value = Value::from("0");
        assert!(!field.render_control(&Attrs::new()).contains("checked"));
        field.apply(&mut instance);
        assert_eq!(instance.get("active"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_stored_flags_of_every_shape() {
        let mut instance = person();
        let mut boolean = bind(BooleanField::new(), "active");
        let mut checkbox = bind(CheckBoxField::new(), "active");

        for (value, key, checked) in [
            (Value::Int(1), "1", true),
            (Value::Int(0), "0", false),
            (Value::Int(7), "", false),
            (Value::from("true"), "1", false),
            (Value::from("false"), "0", false),
            (Value::Null, "", false),
        ] {
            boolean.core_mut().value = value.clone();
            checkbox.core_mut().value = value;
            assert_eq!(boolean.selected_key(), key);
            assert_eq!(checkbox.is_checked(), checked);
        }

        boolean.apply(&mut instance);
        assert_eq!(instance.get("active"), Some(Value::Null));
    }

    #[test]
    fn test_hidden_id_field() {
        let mut instance = person();
        let mut field = bind(HiddenIdField::new(), "id");
        field.core_mut().value = Value::Int(3);
        assert!(field.is_hidden());
        assert!(field.render_label().is_none());
        assert_eq!(
            field.render_control(&html::attrs([("class", "form-control")])),
            r#"<input name="id" type="hidden" value="3"/>"#
        );
        field.apply(&mut instance);
        assert_eq!(instance.get("id"), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_file_field_without_upload_keeps_value() {
        let mut instance = person();
        instance.set("cv", Value::from("/media/old.txt"));
        let store = store();
        let mut field = bind(FileField::new(), "cv");
        field.fetch(&instance, &store).await.unwrap();
        field.load(&Submission::from_query(""), &store).await.unwrap();
        field.before_save(&mut instance, &store).await.unwrap();
        field.apply(&mut instance);
        assert_eq!(instance.get("cv"), Some(Value::from("/media/old.txt")));
        assert!(!field.has_changed());
    }

    #[tokio::test]
    async fn test_file_field_stores_upload() {
        let mut instance = person();
        let store = store();
        let mut field = bind(FileField::new(), "cv").required();
        let submission = Submission::from_query("")
            .with_file("cv", UploadedFile::new("cv.txt", "text/plain", b"hello".to_vec()));

        field.load(&submission, &store).await.unwrap();
        assert!(field.validate(&MessageSettings::default()).await.is_ok());
        assert!(field.has_changed());
        field.before_save(&mut instance, &store).await.unwrap();
        field.apply(&mut instance);
        assert_eq!(instance.get("cv"), Some(Value::from("/media/cv.txt")));
    }

    #[test]
    fn test_file_field_render() {
        let mut field = bind(FileField::image(), "photo");
        field.core_mut().value = Value::from("/media/a.png");
        assert_eq!(
            field.render_control(&Attrs::new()),
            r#"<div><a href="/media/a.png" target="_blank">/media/a.png</a><input accept="image/*" name="photo" type="file"/></div>"#
        );
    }
}
