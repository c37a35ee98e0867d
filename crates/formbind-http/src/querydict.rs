//! Submitted controls keyed by name.
//!
//! Browsers repeat a control name for checkbox lists and multiple selects,
//! so every name maps to a list. Names keep the order in which the browser
//! first sent them; formsets rely on that when they scan for row indexes.

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// Values posted under each control name.
///
/// `V` is `String` for url-encoded data and
/// [`UploadedFile`](crate::UploadedFile) for the files of a multipart body.
///
/// # Examples
///
/// ```
/// use formbind_http::QueryDict;
///
/// let qd = QueryDict::parse("tags=red&tags=blue&name=Misha");
/// assert_eq!(qd.get("tags").map(String::as_str), Some("blue"));
/// assert_eq!(qd.get_all("tags"), ["red", "blue"]);
/// assert_eq!(qd.names().collect::<Vec<_>>(), ["tags", "name"]);
/// ```
#[derive(Debug, Clone)]
pub struct QueryDict<V = String> {
    entries: Vec<(String, Vec<V>)>,
    index: HashMap<String, usize>,
}

impl<V> Default for QueryDict<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> QueryDict<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value after any already posted under `name`.
    pub fn push(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        if let Some(&slot) = self.index.get(&name) {
            self.entries[slot].1.push(value);
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, vec![value]));
        }
    }

    /// The last value posted under `name`.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.get_all(name).last()
    }

    /// Every value posted under `name`, empty when it was not posted.
    pub fn get_all(&self, name: &str) -> &[V] {
        self.index
            .get(name)
            .map_or(&[], |&slot| self.entries[slot].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Control names in submission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for QueryDict<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (name, value) in iter {
            dict.push(name, value);
        }
        dict
    }
}

impl QueryDict {
    /// Parses an `application/x-www-form-urlencoded` body. `+` decodes to a
    /// space and a pair without `=` posts an empty value.
    pub fn parse(body: &str) -> Self {
        body.split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(name), decode(value))
            })
            .collect()
    }

    /// Encodes back into a url-encoded body.
    pub fn encode(&self) -> String {
        let mut pairs = Vec::new();
        for (name, values) in &self.entries {
            let name = utf8_percent_encode(name, NON_ALPHANUMERIC);
            for value in values {
                pairs.push(format!("{name}={}", utf8_percent_encode(value, NON_ALPHANUMERIC)));
            }
        }
        pairs.join("&")
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
