//! A submitted form: url-encoded values plus uploaded files.

use formbind_core::{FormError, FormResult};

use crate::querydict::QueryDict;
use crate::upload::{self, FileDict, UploadedFile, MAX_UPLOAD_SIZE};

/// The data a browser posted for one form.
///
/// Fields read their own control names out of a `Submission` when a form
/// is loaded. Nested forms and formsets share the parent's submission and
/// only differ in the prefix they look up.
///
/// # Examples
///
/// ```
/// use formbind_http::Submission;
///
/// let submission = Submission::from_query("name=Misha&jobs-0-name=dev");
/// assert_eq!(submission.value("name"), Some("Misha"));
/// assert_eq!(submission.value("jobs-0-name"), Some("dev"));
/// assert_eq!(submission.value("missing"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Regular submitted values.
    pub data: QueryDict,
    /// Uploaded files.
    pub files: FileDict,
}

impl Submission {
    /// Creates a submission from already-parsed parts.
    pub const fn new(data: QueryDict, files: FileDict) -> Self {
        Self { data, files }
    }

    /// Builds a submission from a url-encoded body.
    pub fn from_query(body: &str) -> Self {
        Self {
            data: QueryDict::parse(body),
            files: FileDict::new(),
        }
    }

    /// Builds a submission from `(name, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            data: pairs.into_iter().map(|(k, v)| (k, Into::<String>::into(v))).collect(),
            files: FileDict::new(),
        }
    }

    /// Builds a submission from a `multipart/form-data` body.
    ///
    /// Fails when the content type carries no boundary or when an uploaded
    /// file exceeds [`MAX_UPLOAD_SIZE`].
    pub fn from_multipart(body: &[u8], content_type: &str) -> FormResult<Self> {
        let boundary = upload::extract_boundary(content_type).ok_or_else(|| {
            FormError::MalformedSubmission(format!(
                "Missing multipart boundary in content type '{content_type}'"
            ))
        })?;
        let parsed = upload::parse_multipart(body, boundary, MAX_UPLOAD_SIZE)?;
        Ok(Self {
            data: parsed.data,
            files: parsed.files,
        })
    }

    /// Adds an uploaded file under the given control name.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.push(name, file);
        self
    }

    /// Returns the last submitted value for a control.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    /// Returns every submitted value for a control, empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.data.get_all(name)
    }

    /// Returns the last file uploaded under a control name.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Iterates over every submitted control name, values first, then files.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.names().chain(self.files.names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_of_missing_control_is_empty() {
        let submission = Submission::from_query("tags=1&tags=2");
        assert_eq!(submission.values("tags"), ["1", "2"]);
        assert!(submission.values("other").is_empty());
    }

    #[test]
    fn test_keys_include_files() {
        let submission = Submission::from_query("name=x")
            .with_file("photo", UploadedFile::new("a.png", "image/png", b"png".to_vec()));
        let keys: Vec<_> = submission.keys().collect();
        assert_eq!(keys, vec!["name", "photo"]);
        assert_eq!(submission.file("photo").map(|f| f.name.as_str()), Some("a.png"));
    }

    #[test]
    fn test_from_multipart() {
        let body = "--xyz\r\n\
                    Content-Disposition: form-data; name=\"name\"\r\n\
                    \r\n\
                    Misha\r\n\
                    --xyz\r\n\
                    Content-Disposition: form-data; name=\"cv\"; filename=\"cv.txt\"\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    hello\r\n\
                    --xyz--\r\n";
        let submission =
            Submission::from_multipart(body.as_bytes(), "multipart/form-data; boundary=xyz").unwrap();
        assert_eq!(submission.value("name"), Some("Misha"));
        assert_eq!(submission.file("cv").map(|f| f.content.clone()), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_from_multipart_without_boundary() {
        let result = Submission::from_multipart(b"", "multipart/form-data");
        assert!(matches!(result, Err(FormError::MalformedSubmission(_))));
    }
}
