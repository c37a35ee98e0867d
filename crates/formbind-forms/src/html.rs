//! HTML string emission.
//!
//! Fields render straight to strings through these helpers. Attribute
//! values are always escaped; tag content is emitted verbatim, so callers
//! escape text content themselves (see [`escape`]).

use std::collections::BTreeMap;

/// Tags rendered self-closing.
const VOID_TAGS: &[&str] = &["br", "img", "meta", "input"];

/// A single HTML attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `true` renders the bare attribute name, `false` omits the attribute.
    Flag(bool),
    /// Rendered as `key="escaped value"`.
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for AttrValue {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Text(v.to_string())
    }
}

/// HTML attributes, rendered in key order.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Builds an [`Attrs`] map from `(key, value)` pairs.
///
/// # Examples
///
/// ```
/// use formbind_forms::html;
///
/// let attrs = html::attrs([("class", "form-control")]);
/// assert_eq!(html::tag("span", Some("x"), &attrs), r#"<span class="form-control">x</span>"#);
/// ```
pub fn attrs<K, V, I>(pairs: I) -> Attrs
where
    K: Into<String>,
    V: Into<AttrValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Escapes HTML special characters.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their entity equivalents.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn render_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .filter_map(|(key, value)| match value {
            AttrValue::Flag(true) => Some(format!(" {key}")),
            AttrValue::Flag(false) => None,
            AttrValue::Text(text) => Some(format!(r#" {key}="{}""#, escape(text))),
        })
        .collect()
}

/// Renders a tag.
///
/// # Examples
///
/// ```
/// use formbind_forms::html::{self, AttrValue};
///
/// let mut attrs = html::Attrs::new();
/// attrs.insert("checked".into(), AttrValue::Flag(true));
/// attrs.insert("disabled".into(), AttrValue::Flag(false));
/// attrs.insert("type".into(), "checkbox".into());
/// assert_eq!(html::tag("input", None, &attrs), r#"<input checked type="checkbox"/>"#);
/// assert_eq!(html::tag("div", None, &html::Attrs::new()), "<div></div>");
/// ```
pub fn tag(name: &str, content: Option<&str>, attrs: &Attrs) -> String {
    let rendered = render_attrs(attrs);
    if VOID_TAGS.contains(&name) {
        format!("<{name}{rendered}/>")
    } else {
        format!("<{name}{rendered}>{}</{name}>", content.unwrap_or_default())
    }
}

/// Renders a `<div>`.
pub fn div(content: &str, attrs: &Attrs) -> String {
    tag("div", Some(content), attrs)
}

/// Renders an `<a href>` link.
pub fn link(label: &str, href: &str, attrs: &Attrs) -> String {
    let mut attrs = attrs.clone();
    attrs.insert("href".to_string(), href.into());
    tag("a", Some(label), &attrs)
}

/// Renders an `<input>` with the given name and value.
pub fn input(name: &str, value: &str, attrs: &Attrs) -> String {
    let mut attrs = attrs.clone();
    attrs.insert("name".to_string(), name.into());
    attrs.insert("value".to_string(), value.into());
    tag("input", None, &attrs)
}

/// Renders a `<textarea>`; the value is escaped as content.
pub fn textarea(name: &str, value: &str, attrs: &Attrs) -> String {
    let mut attrs = attrs.clone();
    attrs.insert("name".to_string(), name.into());
    tag("textarea", Some(&escape(value)), &attrs)
}

/// Renders a `<select>` over `(key, text)` options, selecting the option
/// whose key equals `value`.
pub fn select(name: &str, value: &str, options: &[(String, String)], attrs: &Attrs) -> String {
    let rendered: String = options
        .iter()
        .map(|(key, text)| {
            let option_attrs = self::attrs([
                ("value", AttrValue::from(key)),
                ("selected", AttrValue::Flag(key == value)),
            ]);
            tag("option", Some(&escape(text)), &option_attrs)
        })
        .collect();

    let mut attrs = attrs.clone();
    attrs.insert("name".to_string(), name.into());
    tag("select", Some(&rendered), &attrs)
}

/// Renders an `<img>`.
pub fn img(src: &str, alt: &str, attrs: &Attrs) -> String {
    let mut attrs = attrs.clone();
    attrs.insert("src".to_string(), src.into());
    attrs.insert("alt".to_string(), alt.into());
    tag("img", None, &attrs)
}
