//! Formset fields: a repeatable child form per related row.
//!
//! A [`FormsetField`] binds a one-to-many collection. Each related row gets
//! a child form whose control names carry the row index
//! (`<prefix><attribute>-<index>-<child attribute>`), and a hidden template
//! form using the `__index__` placeholder is rendered for the client script
//! to clone when a row is added.
//!
//! On load the indexes present in the submission decide which children
//! survive: known indexes keep their form (and instance), unknown indexes
//! get a fresh instance, missing ones are dropped and their rows deleted on
//! save.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use formbind_core::settings::{self, MessageSettings};
use formbind_core::{FormError, FormResult, ValidationError};
use formbind_db::{Instance, ObjectStore, Relation, RelationKind};
use formbind_http::Submission;

use crate::field::{field_core_impl, Field, FieldCore};
use crate::form::{Form, FormSchema};
use crate::html::{self, Attrs};
use crate::relations::{not_fetched, owner_relation};
use crate::renderer::TableRenderer;

/// Index placeholder of the template form.
pub const INDEX_PLACEHOLDER: &str = "__index__";

/// How child forms are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormsetLayout {
    /// Each child inside a `<div>`.
    Blocks,
    /// Each child as a table row rendered with [`TableRenderer`].
    Table,
}

/// A collection of child forms over a one-to-many relation.
///
/// # Examples
///
/// ```
/// use formbind_forms::fields::InputField;
/// use formbind_forms::form::FormSchema;
/// use formbind_forms::formset::{FormsetField, FormsetLayout};
///
/// let job = FormSchema::new("JobForm").field("name", InputField::text()).build();
/// let jobs = FormsetField::table(job).text_add("More");
/// assert_eq!(jobs.layout(), FormsetLayout::Table);
/// assert_eq!(jobs.max_index(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct FormsetField {
    core: FieldCore,
    schema: Arc<FormSchema>,
    layout: FormsetLayout,
    text_add: String,
    text_delete: String,
    max_forms: usize,
    relation: Option<Relation>,
    template: Option<Form>,
    forms: BTreeMap<usize, Form>,
    fetched: Vec<usize>,
}

/// Formsets are how many-to-one collections are edited.
pub type ManyToOneField = FormsetField;

impl FormsetField {
    /// Child forms of `schema` laid out as blocks.
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let texts = &settings::current().formset;
        Self {
            core: FieldCore {
                can_apply: false,
                ..FieldCore::default()
            },
            schema,
            layout: FormsetLayout::Blocks,
            text_add: texts.text_add.clone(),
            text_delete: texts.text_delete.clone(),
            max_forms: texts.max_forms,
            relation: None,
            template: None,
            forms: BTreeMap::new(),
            fetched: Vec::new(),
        }
    }

    /// Child forms of `schema` laid out as table rows.
    pub fn table(schema: Arc<FormSchema>) -> Self {
        Self {
            layout: FormsetLayout::Table,
            ..Self::new(schema)
        }
    }

    /// Sets the text of the "add row" link.
    #[must_use]
    pub fn text_add(mut self, text: impl Into<String>) -> Self {
        self.text_add = text.into();
        self
    }

    /// Sets the text of the per-row delete button.
    #[must_use]
    pub fn text_delete(mut self, text: impl Into<String>) -> Self {
        self.text_delete = text.into();
        self
    }

    /// Sets how many rows a submission may carry. Indexes at or above the
    /// limit fail the load.
    #[must_use]
    pub const fn max_forms(mut self, max_forms: usize) -> Self {
        self.max_forms = max_forms;
        self
    }

    pub const fn layout(&self) -> FormsetLayout {
        self.layout
    }

    /// The child forms by index.
    pub const fn forms(&self) -> &BTreeMap<usize, Form> {
        &self.forms
    }

    /// The `__index__` template form, once fetched.
    pub const fn template(&self) -> Option<&Form> {
        self.template.as_ref()
    }

    /// One past the highest child index, or 0 without children. The client
    /// script numbers new rows from here.
    pub fn max_index(&self) -> usize {
        self.forms.keys().next_back().map_or(0, |i| i.saturating_add(1))
    }

    fn child_prefix(&self, index: &str) -> String {
        format!("{}-{index}-", self.core.name())
    }

    async fn open_child(
        &self,
        index: &str,
        instance: Box<dyn Instance>,
        store: &Arc<dyn ObjectStore>,
    ) -> FormResult<Form> {
        let form = Form::open_with_prefix(
            Arc::clone(&self.schema),
            instance,
            Arc::clone(store),
            self.child_prefix(index),
        )
        .await?;
        Ok(match self.layout {
            FormsetLayout::Blocks => form,
            FormsetLayout::Table => form.with_renderer(Arc::new(TableRenderer)),
        })
    }

    /// Indexes present in the submission, ascending and unique. An index
    /// outside `0..max_forms` fails the whole submission.
    fn submitted_indexes(&self, submission: &Submission) -> FormResult<Vec<usize>> {
        let pattern = format!(r"^{}(\d+)-", regex::escape(&format!("{}-", self.core.name())));
        let pattern = Regex::new(&pattern).map_err(|e| FormError::Declaration(e.to_string()))?;

        let mut indexes = Vec::new();
        for caps in submission.keys().filter_map(|key| pattern.captures(key)) {
            let index = caps[1]
                .parse::<usize>()
                .ok()
                .filter(|index| *index < self.max_forms)
                .ok_or_else(|| {
                    FormError::MalformedSubmission(format!(
                        "formset '{}' row index {} is not below {}",
                        self.core.name(),
                        &caps[1],
                        self.max_forms
                    ))
                })?;
            indexes.push(index);
        }
        indexes.sort_unstable();
        indexes.dedup();
        Ok(indexes)
    }

    fn render_blocks(&self, template: &str) -> String {
        let css = &settings::current().css;
        let forms: String = self
            .forms
            .values()
            .map(|form| html::div(&form.render(), &Attrs::new()))
            .collect();

        let container = html::div(&forms, &html::attrs([("class", "container")]));
        let hidden = html::div(
            &html::div(template, &Attrs::new()),
            &html::attrs([("class", "hidden")]),
        );
        let add = html::link(
            &html::escape(&self.text_add),
            "#",
            &html::attrs([("class", css.add_button_class.as_str())]),
        );
        container + &hidden + &add
    }

    fn render_table(&self, template: &str) -> String {
        let rows: String = self
            .forms
            .values()
            .map(|form| html::tag("tr", Some(&form.render()), &Attrs::new()))
            .collect();

        let container = html::tag("table", Some(&rows), &html::attrs([("class", "container")]));
        let body = html::tag(
            "tbody",
            Some(&html::tag("tr", Some(template), &Attrs::new())),
            &Attrs::new(),
        );
        let hidden = html::tag("table", Some(&body), &html::attrs([("class", "hidden")]));
        let add = html::link(&html::escape(&self.text_add), "#", &html::attrs([("class", "add")]));
        container + &hidden + &add
    }
}

#[async_trait]
impl Field for FormsetField {
    field_core_impl!();

    async fn fetch(&mut self, instance: &dyn Instance, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let relation = owner_relation(&self.core, instance)?;
        if !matches!(relation.kind, RelationKind::OneToMany | RelationKind::OneToOne) {
            return Err(FormError::Declaration(format!(
                "formset '{}' needs a one-to-many relation",
                self.core.name()
            )));
        }

        let template = self
            .open_child(INDEX_PLACEHOLDER, store.instantiate(&relation.related_model)?, store)
            .await?;
        self.template = Some(template);

        self.forms.clear();
        for (index, row) in store.related(instance, &self.core.attribute).await?.into_iter().enumerate() {
            let form = self.open_child(&index.to_string(), row, store).await?;
            self.forms.insert(index, form);
        }
        self.fetched = self.forms.keys().copied().collect();
        self.relation = Some(relation);
        tracing::debug!("Formset {} fetched {} row(s)", self.core.name(), self.forms.len());
        Ok(())
    }

    async fn load(&mut self, submission: &Submission, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let related_model = self
            .relation
            .as_ref()
            .map(|r| r.related_model.clone())
            .ok_or_else(|| not_fetched(&self.core))?;
        let indexes = self.submitted_indexes(submission)?;
        tracing::debug!("Formset {} submitted indexes {indexes:?}", self.core.name());

        let mut previous = std::mem::take(&mut self.forms);
        for index in indexes {
            let mut form = match previous.remove(&index) {
                Some(form) => form,
                None => {
                    self.open_child(&index.to_string(), store.instantiate(&related_model)?, store)
                        .await?
                }
            };
            form.load(submission).await?;
            self.forms.insert(index, form);
        }
        Ok(())
    }

    async fn validate(&mut self, messages: &MessageSettings) -> Result<(), ValidationError> {
        if self.core.required && self.forms.is_empty() {
            return Err(ValidationError::new(
                MessageSettings::format(&messages.required, self.core.label()),
                "required",
            ));
        }

        let mut valid = true;
        for form in self.forms.values_mut() {
            valid &= form.is_valid().await;
        }
        if valid {
            return Ok(());
        }
        Err(ValidationError::new(
            MessageSettings::format(&messages.nested_invalid, self.core.label()),
            "nested_invalid",
        ))
    }

    fn apply(&self, _instance: &mut dyn Instance) {}

    async fn after_save(&mut self, instance: &dyn Instance, store: &Arc<dyn ObjectStore>) -> FormResult<()> {
        let remote = self
            .relation
            .as_ref()
            .ok_or_else(|| not_fetched(&self.core))?
            .remote_field
            .clone()
            .ok_or_else(|| {
                FormError::Declaration(format!(
                    "formset '{}' relation has no remote field",
                    self.core.name()
                ))
            })?;
        let owner_pk = instance.pk().ok_or_else(|| {
            FormError::Integrity(format!("owner of '{}' has no primary key", self.core.name()))
        })?;

        let previous = store.related(instance, &self.core.attribute).await?;

        let mut kept = Vec::with_capacity(self.forms.len());
        for form in self.forms.values_mut() {
            form.instance_mut().set(&remote, owner_pk.clone());
            form.save().await?;
            if let Some(pk) = form.instance().pk() {
                kept.push(pk);
            }
        }

        for row in previous {
            if row.pk().is_some_and(|pk| !kept.contains(&pk)) {
                tracing::debug!("Formset {} deleting {:?}", self.core.name(), row.pk());
                store.delete(row.as_ref()).await?;
            }
        }
        Ok(())
    }

    fn render_control(&self, _extra: &Attrs) -> String {
        let template = self.template.as_ref().map(Form::render).unwrap_or_default();
        let content = match self.layout {
            FormsetLayout::Blocks => self.render_blocks(&template),
            FormsetLayout::Table => self.render_table(&template),
        };
        let attributes = self
            .core
            .collect_attributes(html::attrs([("id", self.core.id())]), &Attrs::new());
        html::div(&content, &attributes)
    }

    fn script(&self) -> String {
        let css = &settings::current().css;
        let (row_selector, new_row_class) = match self.layout {
            FormsetLayout::Blocks => (" > div ", css.delete_button_class.clone()),
            FormsetLayout::Table => (" > tbody > tr ", format!("{} align-end", css.delete_button_class)),
        };
        let forms_js: String = self.forms.values().map(Form::fields_script).collect();
        let init_nested: String = self
            .template
            .iter()
            .flat_map(Form::fields)
            .map(|f| {
                format!(
                    "(function (el) {{ {} }})($('#{}'.replace('{INDEX_PLACEHOLDER}', i)));",
                    f.script(),
                    f.core().id()
                )
            })
            .collect();

        format!(
            r#"
            let i = {max_index};
            let container = $('#{id} > .container')
            let button = $('#{id} > .add');
            let hidden = $('#{id} > .hidden');

            {forms_js}

            hidden.hide()

            container.find('> *').each(function(indx, el){{
                let delBtn = $('<button type="button" class="{delete_class}">{text_delete}</button>');

                delBtn.on('click', () => {{
                    el.remove();
                }})

                $(el).append(delBtn);
            }})

            button.on('click', function(e) {{
                e.preventDefault();

                let newForm = hidden.find('{row_selector}').clone();

                newForm.find('[name], [id]').each((index, item) => {{
                    ['name', 'id'].forEach(attr => {{
                        if($(item).attr(attr)){{
                            $(item).attr(attr, $(item).attr(attr).replace(/{INDEX_PLACEHOLDER}/g, i))
                        }}
                    }})
                }})

                let delBtn = $('<button type="button" class="{new_row_class}">{text_delete}</button>');

                delBtn.on('click', () => {{
                    newForm.remove();
                }})

                newForm.append(delBtn);
                container.append(newForm);

                {init_nested}

                i++;
            }})
        "#,
            max_index = self.max_index(),
            id = self.core.id(),
            delete_class = css.delete_button_class,
            text_delete = html::escape(&self.text_delete),
        )
    }

    fn has_changed(&self) -> bool {
        !self.forms.keys().copied().eq(self.fetched.iter().copied())
            || self.forms.values().any(|form| !form.changed_fields().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldExt;
    use crate::fields::{FileField, HiddenIdField, InputField};
    use formbind_db::{FieldDef, MemoryStore, ModelMeta, Value};
    use formbind_http::UploadedFile;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(
            MemoryStore::new()
                .register(
                    ModelMeta::new("person")
                        .field(FieldDef::new("name"))
                        .field(FieldDef::one_to_many("jobs", "job", "person"))
                        .field(FieldDef::foreign_key("boss", "person")),
                )
                .register(
                    ModelMeta::new("job")
                        .field(FieldDef::new("name"))
                        .field(FieldDef::new("cv"))
                        .field(FieldDef::new("person")),
                ),
        )
    }

    fn job_schema() -> Arc<FormSchema> {
        FormSchema::new("JobForm")
            .field("id", HiddenIdField::new())
            .field("name", InputField::text().required())
            .build()
    }

    fn person_schema(jobs: FormsetField) -> Arc<FormSchema> {
        FormSchema::new("PersonForm")
            .field("name", InputField::text())
            .field("jobs", jobs)
            .build()
    }

    async fn saved_person(store: &Arc<dyn ObjectStore>, jobs: &[&str]) -> Box<dyn Instance> {
        let mut person = store.instantiate("person").unwrap();
        person.set("name", Value::from("Misha"));
        store.save(person.as_mut()).await.unwrap();
        for name in jobs {
            let mut job = store.instantiate("job").unwrap();
            job.set("name", Value::from(*name));
            job.set("person", person.pk().unwrap());
            store.save(job.as_mut()).await.unwrap();
        }
        person
    }

    fn formset(form: &Form) -> &dyn Field {
        form.field("jobs").unwrap()
    }

    async fn job_names(store: &Arc<dyn ObjectStore>) -> Vec<Value> {
        store
            .all("job")
            .await
            .unwrap()
            .iter()
            .filter_map(|job| job.get("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_one_child_per_row() {
        let store = store();
        let person = saved_person(&store, &["Dev", "Ops"]).await;
        let form = Form::open(person_schema(FormsetField::new(job_schema())), person, Arc::clone(&store))
            .await
            .unwrap();

        let html = formset(&form).render_control(&Attrs::new());
        assert!(html.starts_with(r#"<div id="jobs"><div class="container"><div>"#));
        assert!(html.contains(r#"name="jobs-0-name" type="text" value="Dev""#));
        assert!(html.contains(r#"name="jobs-1-name" type="text" value="Ops""#));
        assert!(html.contains(r#"<div class="hidden"><div>"#));
        assert!(html.contains(r#"id="jobs-__index__-name""#));
        assert!(html.ends_with(r##"<a class="add btn btn-success btn-sm mt-2" href="#">Add new row</a></div>"##));
    }

    #[tokio::test]
    async fn test_unsaved_owner_has_no_children() {
        let store = store();
        let form = Form::open(
            person_schema(FormsetField::new(job_schema())),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
        )
        .await
        .unwrap();
        let html = formset(&form).render_control(&Attrs::new());
        assert!(html.starts_with(r#"<div id="jobs"><div class="container"></div>"#));
        assert!(formset(&form).script().contains("let i = 0;"));
    }

    #[tokio::test]
    async fn test_load_orders_and_reconciles_indexes() {
        let store = store();
        let person = saved_person(&store, &["Dev", "Ops", "QA"]).await;
        let mut form = Form::open(person_schema(FormsetField::new(job_schema())), person, Arc::clone(&store))
            .await
            .unwrap();

        form.load(&Submission::from_pairs([
            ("name", "Misha"),
            ("jobs-10-name", "Support"),
            ("jobs-2-name", "QA lead"),
            ("jobs-0-name", "Dev"),
            ("jobsx-5-name", "ignored"),
            ("jobs-__index__-name", ""),
        ]))
        .await
        .unwrap();
        assert!(form.is_valid().await);
        assert!(form.field("jobs").unwrap().has_changed());

        let html = formset(&form).render_control(&Attrs::new());
        let zero = html.find("jobs-0-name").unwrap();
        let two = html.find("jobs-2-name").unwrap();
        let ten = html.find("jobs-10-name").unwrap();
        assert!(zero < two && two < ten);
        assert!(!html.contains("jobs-1-name"));
        assert!(formset(&form).script().contains("let i = 11;"));
    }

    #[tokio::test]
    async fn test_upload_alone_creates_row() {
        let store = store();
        let jobs = FormSchema::new("JobForm")
            .field("id", HiddenIdField::new())
            .field("name", InputField::text())
            .field("cv", FileField::new())
            .build();
        let mut form = Form::open(
            person_schema(FormsetField::new(jobs)),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
        )
        .await
        .unwrap();

        let submission = Submission::from_pairs([("name", "Misha"), ("jobs-0-name", "Dev")])
            .with_file("jobs-2-cv", UploadedFile::new("cv.txt", "text/plain", b"hello".to_vec()));
        form.load(&submission).await.unwrap();
        assert!(form.is_valid().await);

        let html = formset(&form).render_control(&Attrs::new());
        assert!(html.contains(r#"name="jobs-0-name""#));
        assert!(html.contains(r#"name="jobs-2-cv""#));
        assert!(!html.contains("jobs-1-"));
        assert!(formset(&form).script().contains("let i = 3;"));

        form.save().await.unwrap();
        let cvs: Vec<Option<Value>> = store
            .all("job")
            .await
            .unwrap()
            .iter()
            .map(|job| job.get("cv").filter(|cv| !cv.is_blank()))
            .collect();
        assert_eq!(cvs, vec![None, Some(Value::from("/media/cv.txt"))]);
    }

    #[tokio::test]
    async fn test_out_of_range_index_fails_load() {
        let store = store();
        let open = |jobs: FormsetField| {
            let store = Arc::clone(&store);
            async move {
                Form::open(person_schema(jobs), store.instantiate("person").unwrap(), store)
                    .await
                    .unwrap()
            }
        };

        let mut form = open(FormsetField::new(job_schema())).await;
        let result = form
            .load(&Submission::from_query(&format!("jobs-{}-name=x", usize::MAX)))
            .await;
        assert!(matches!(result, Err(FormError::MalformedSubmission(_))));

        let result = form
            .load(&Submission::from_query("jobs-99999999999999999999999-name=x"))
            .await;
        assert!(matches!(result, Err(FormError::MalformedSubmission(_))));

        let mut form = open(FormsetField::new(job_schema()).max_forms(3)).await;
        assert!(form.load(&Submission::from_query("jobs-2-name=x")).await.is_ok());
        let result = form.load(&Submission::from_query("jobs-3-name=x")).await;
        assert!(matches!(result, Err(FormError::MalformedSubmission(_))));
    }

    #[tokio::test]
    async fn test_highest_index_script_does_not_overflow() {
        let store = store();
        let mut form = Form::open(
            person_schema(FormsetField::new(job_schema()).max_forms(usize::MAX)),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
        )
        .await
        .unwrap();
        let last = usize::MAX - 1;
        form.load(&Submission::from_query(&format!("jobs-{last}-name=x")))
            .await
            .unwrap();

        assert!(formset(&form).script().contains(&format!("let i = {};", usize::MAX)));
        assert!(form.script().contains(&format!("let i = {};", usize::MAX)));
    }

    #[tokio::test]
    async fn test_save_updates_adds_and_deletes() {
        let store = store();
        let person = saved_person(&store, &["Dev", "Ops", "QA"]).await;
        let mut form = Form::open(person_schema(FormsetField::new(job_schema())), person, Arc::clone(&store))
            .await
            .unwrap();

        form.load(&Submission::from_pairs([
            ("name", "Misha"),
            ("jobs-0-name", "Developer"),
            ("jobs-2-name", "QA"),
            ("jobs-3-name", "Support"),
        ]))
        .await
        .unwrap();
        assert!(form.is_valid().await);
        form.save().await.unwrap();

        assert_eq!(
            job_names(&store).await,
            vec![Value::from("Developer"), Value::from("QA"), Value::from("Support")]
        );
        let owner = form.instance().pk().unwrap();
        for job in store.all("job").await.unwrap() {
            assert_eq!(job.get("person"), Some(owner.clone()));
        }
    }

    #[tokio::test]
    async fn test_invalid_child_fails_formset() {
        let store = store();
        let mut form = Form::open(
            person_schema(FormsetField::new(job_schema()).with_label("Jobs")),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
        )
        .await
        .unwrap();
        form.load(&Submission::from_query("name=Misha&jobs-0-name=Dev&jobs-1-name="))
            .await
            .unwrap();
        assert!(!form.is_valid().await);
        assert_eq!(form.field_errors("jobs"), ["Jobs contains invalid entries"]);

        let html = formset(&form).render_control(&Attrs::new());
        let second = html.find(r#"name="jobs-1-name""#).unwrap();
        let error = html.find(r#"<div class="form-error">Field name is required</div>"#).unwrap();
        assert!(second < error);
    }

    #[tokio::test]
    async fn test_required_formset_needs_a_row() {
        let store = store();
        let mut form = Form::open(
            person_schema(FormsetField::new(job_schema()).required()),
            store.instantiate("person").unwrap(),
            Arc::clone(&store),
        )
        .await
        .unwrap();
        form.load(&Submission::from_query("name=Misha")).await.unwrap();
        assert!(!form.is_valid().await);
        assert_eq!(form.field_errors("jobs"), ["Field jobs is required"]);
    }

    #[tokio::test]
    async fn test_table_layout() {
        let store = store();
        let person = saved_person(&store, &["Dev"]).await;
        let form = Form::open(
            person_schema(FormsetField::table(job_schema()).text_add("More").text_delete("Drop")),
            person,
            Arc::clone(&store),
        )
        .await
        .unwrap();

        let html = formset(&form).render_control(&Attrs::new());
        assert!(html.starts_with(r#"<div id="jobs"><table class="container"><tr><input name="jobs-0-id""#));
        assert!(html.contains(r#"<td><label class="form-label">name</label>"#));
        assert!(html.contains(r#"<table class="hidden"><tbody><tr>"#));
        assert!(html.ends_with(r##"<a class="add" href="#">More</a></div>"##));

        let script = formset(&form).script();
        assert!(script.contains("hidden.find(' > tbody > tr ').clone()"));
        assert!(script.contains(r#"class="btn btn-sm btn-danger align-end">Drop</button>"#));
    }

    #[tokio::test]
    async fn test_script_initialises_template_fields() {
        let store = store();
        let jobs = FormSchema::new("JobForm")
            .field("name", InputField::text().with_script("el.focus();"))
            .build();
        let person = saved_person(&store, &["Dev"]).await;
        let form = Form::open(person_schema(FormsetField::new(jobs)), person, Arc::clone(&store))
            .await
            .unwrap();

        let script = formset(&form).script();
        assert!(script.contains("let i = 1;"));
        assert!(script.contains("$('#jobs > .container')"));
        assert!(script.contains("(function (el) { el.focus(); })($('#jobs-0-name'));"));
        assert!(script.contains("(function (el) { el.focus(); })($('#jobs-__index__-name'.replace('__index__', i)));"));
        assert!(script.contains(r#"class="btn btn-sm btn-danger">Delete row</button>"#));
    }

    #[tokio::test]
    async fn test_formset_rejects_foreign_key() {
        let store = store();
        let schema = FormSchema::new("PersonForm")
            .field("boss", FormsetField::new(job_schema()))
            .build();
        let result = Form::open(schema, store.instantiate("person").unwrap(), store).await;
        assert!(matches!(result, Err(FormError::Declaration(_))));
    }
}
