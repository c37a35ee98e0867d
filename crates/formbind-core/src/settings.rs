//! Settings for formbind.
//!
//! [`Settings`] holds what every form renders with: validation messages,
//! CSS classes and formset button texts, plus logging and media options.
//! Every table is `#[serde(default)]`, so a settings file only lists what
//! it changes. [`SETTINGS`] is the process-wide copy and [`current`] falls
//! back to the defaults until something is configured.

use std::collections::BTreeMap;
use std::sync::{LazyLock, OnceLock};

use serde::{Deserialize, Serialize};

/// Validation message templates.
///
/// `{label}` is replaced with the field label; the temporal message also
/// takes `{kind}` ("date", "time", "date and time").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSettings {
    pub required: String,
    pub integer: String,
    pub temporal: String,
    /// Put on a nested or formset field whose sub-forms did not validate.
    pub nested_invalid: String,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            required: "Field {label} is required".into(),
            integer: "Value of {label} must be numerical".into(),
            temporal: "Value of {label} must be a valid {kind}".into(),
            nested_invalid: "{label} contains invalid entries".into(),
        }
    }
}

impl MessageSettings {
    /// Fills `{label}` into a template.
    pub fn format(template: &str, label: &str) -> String {
        template.replace("{label}", label)
    }
}

/// Formset button texts and row limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsetSettings {
    pub text_add: String,
    pub text_delete: String,
    /// Row indexes a submission may use are `0..max_forms`.
    pub max_forms: usize,
}

impl Default for FormsetSettings {
    fn default() -> Self {
        Self {
            text_add: "Add new row".into(),
            text_delete: "Delete row".into(),
            max_forms: 1000,
        }
    }
}

/// Class names the renderers put on the markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssSettings {
    /// Wraps label, control and errors of one field.
    pub form_group_class: String,
    pub form_error_class: String,
    pub control_class: String,
    pub label_class: String,
    pub add_button_class: String,
    pub delete_button_class: String,
}

impl Default for CssSettings {
    fn default() -> Self {
        Self {
            form_group_class: "form-group".into(),
            form_error_class: "form-error".into(),
            control_class: "form-control".into(),
            label_class: "form-label".into(),
            add_button_class: "add btn btn-success btn-sm mt-2".into(),
            delete_button_class: "btn btn-sm btn-danger".into(),
        }
    }
}

/// Everything formbind can be configured with.
///
/// # Examples
///
/// ```
/// use formbind_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.formset.text_add, "Add new row");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pretty logs when set, JSON lines otherwise.
    pub debug: bool,
    /// An `EnvFilter` directive such as `info` or `formbind_forms=debug`.
    pub log_level: String,
    /// URL prefix stored uploads are served under.
    pub media_url: String,
    pub messages: MessageSettings,
    pub formset: FormsetSettings,
    pub css: CssSettings,
    /// Application keys formbind itself does not read.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".into(),
            media_url: "/media/".into(),
            messages: MessageSettings::default(),
            formset: FormsetSettings::default(),
            css: CssSettings::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// Settings that are written once and read everywhere afterwards.
#[derive(Debug, Default)]
pub struct LazySettings(OnceLock<Settings>);

impl LazySettings {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Installs `settings`. A second call hands its argument back.
    pub fn configure(&self, settings: Settings) -> Result<(), Settings> {
        self.0.set(settings)
    }

    pub fn is_configured(&self) -> bool {
        self.0.get().is_some()
    }

    /// The configured settings, or the defaults.
    pub fn get(&self) -> &Settings {
        static DEFAULTS: LazyLock<Settings> = LazyLock::new(Settings::default);
        self.0.get().unwrap_or(&DEFAULTS)
    }
}

pub static SETTINGS: LazySettings = LazySettings::new();

/// The active settings.
pub fn current() -> &'static Settings {
    SETTINGS.get()
}
