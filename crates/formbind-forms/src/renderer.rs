//! Form renderers.
//!
//! A renderer decides the markup around each field: label, control and
//! error list. [`BootstrapRenderer`] wraps fields in form groups,
//! [`TableRenderer`] emits table cells for tabular formsets.

use std::fmt;

use formbind_core::settings;

use crate::field::Field;
use crate::form::Form;
use crate::html;

/// Turns a form's fields into HTML.
pub trait FormRenderer: Send + Sync + fmt::Debug {
    /// Renders a single field with its errors.
    fn render_field(&self, field: &dyn Field, errors: &[String]) -> String;

    /// Renders the whole form as the concatenation of its fields.
    fn render_form(&self, form: &Form) -> String {
        form.fields()
            .map(|field| self.render_field(field, form.field_errors(&field.core().attribute)))
            .collect()
    }

    /// Renders an error list, empty when there are no errors.
    fn render_errors(&self, errors: &[String]) -> String {
        if errors.is_empty() {
            return String::new();
        }
        let css = &settings::current().css;
        let text = errors
            .iter()
            .map(|e| html::escape(e))
            .collect::<Vec<_>>()
            .join(", ");
        html::div(&text, &html::attrs([("class", css.form_error_class.as_str())]))
    }
}

/// Extras every visible control receives: the control class and the id.
fn control_extras(field: &dyn Field) -> html::Attrs {
    let css = &settings::current().css;
    html::attrs([
        ("class", css.control_class.clone()),
        ("id", field.core().id()),
    ])
}

fn render_parts(renderer: &dyn FormRenderer, field: &dyn Field, errors: &[String]) -> String {
    format!(
        "{}{}{}",
        field.render_label().unwrap_or_default(),
        field.render_control(&control_extras(field)),
        renderer.render_errors(errors)
    )
}

/// Renders each field as `<div class="form-group">label control errors</div>`.
///
/// # Examples
///
/// ```
/// use formbind_forms::field::Field;
/// use formbind_forms::fields::InputField;
/// use formbind_forms::renderer::{BootstrapRenderer, FormRenderer};
///
/// let mut field = InputField::text();
/// field.core_mut().attribute = "name".to_string();
///
/// let html = BootstrapRenderer.render_field(&field, &["Field name is required".to_string()]);
/// assert_eq!(
///     html,
///     concat!(
///         r#"<div class="form-group"><label class="form-label">name</label>"#,
///         r#"<input class="form-control" id="name" name="name" type="text" value=""/>"#,
///         r#"<div class="form-error">Field name is required</div></div>"#
///     )
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapRenderer;

impl FormRenderer for BootstrapRenderer {
    fn render_field(&self, field: &dyn Field, errors: &[String]) -> String {
        if field.is_hidden() {
            return field.render_control(&html::Attrs::new());
        }
        let css = &settings::current().css;
        html::div(
            &render_parts(self, field, errors),
            &html::attrs([("class", css.form_group_class.as_str())]),
        )
    }
}

/// Renders each field as a `<td>` cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRenderer;

impl FormRenderer for TableRenderer {
    fn render_field(&self, field: &dyn Field, errors: &[String]) -> String {
        if field.is_hidden() {
            return field.render_control(&html::Attrs::new());
        }
        html::tag("td", Some(&render_parts(self, field, errors)), &html::Attrs::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{HiddenIdField, InputField};
    use formbind_db::Value;

    fn field(attribute: &str) -> InputField {
        let mut field = InputField::text();
        field.core_mut().attribute = attribute.to_string();
        field.core_mut().prefix = "jobs-0-".to_string();
        field
    }

    #[test]
    fn test_errors_joined_and_escaped() {
        let html = BootstrapRenderer.render_errors(&["a <b>".to_string(), "c".to_string()]);
        assert_eq!(html, r#"<div class="form-error">a &lt;b&gt;, c</div>"#);
        assert_eq!(BootstrapRenderer.render_errors(&[]), "");
    }

    #[test]
    fn test_table_cell() {
        let html = TableRenderer.render_field(&field("name"), &[]);
        assert_eq!(
            html,
            concat!(
                r#"<td><label class="form-label">name</label>"#,
                r#"<input class="form-control" id="jobs-0-name" name="jobs-0-name" type="text" value=""/></td>"#
            )
        );
    }

    #[test]
    fn test_hidden_field_renders_control_only() {
        let mut hidden = HiddenIdField::new();
        hidden.core_mut().attribute = "id".to_string();
        hidden.core_mut().value = Value::Int(4);
        let expected = r#"<input name="id" type="hidden" value="4"/>"#;
        assert_eq!(BootstrapRenderer.render_field(&hidden, &["ignored".to_string()]), expected);
        assert_eq!(TableRenderer.render_field(&hidden, &[]), expected);
    }
}
