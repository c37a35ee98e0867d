//! Reading [`Settings`] from files and the environment.
//!
//! A file is parsed straight into `Settings`; missing keys keep their
//! defaults at every level. Environment variables are applied afterwards
//! and win over the file.
//!
//! | Variable | Setting |
//! |---|---|
//! | `FORMBIND_DEBUG` | `debug` |
//! | `FORMBIND_LOG_LEVEL` | `log_level` |
//! | `FORMBIND_MEDIA_URL` | `media_url` |
//! | `FORMBIND_TEXT_ADD` | `formset.text_add` |
//! | `FORMBIND_TEXT_DELETE` | `formset.text_delete` |
//!
//! ```rust,no_run
//! use formbind_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/forms.toml").unwrap();
//! formbind_core::SETTINGS.configure(settings).ok();
//! ```

use std::path::Path;

use crate::error::{FormError, FormResult};
use crate::settings::Settings;

type Override = fn(&mut Settings, String);

const ENV_OVERRIDES: &[(&str, Override)] = &[
    ("FORMBIND_DEBUG", |s, v| {
        s.debug = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }),
    ("FORMBIND_LOG_LEVEL", |s, v| s.log_level = v),
    ("FORMBIND_MEDIA_URL", |s, v| s.media_url = v),
    ("FORMBIND_TEXT_ADD", |s, v| s.formset.text_add = v),
    ("FORMBIND_TEXT_DELETE", |s, v| s.formset.text_delete = v),
];

pub fn from_toml_str(source: &str) -> FormResult<Settings> {
    toml::from_str(source).map_err(|e| FormError::Config(format!("invalid TOML settings: {e}")))
}

pub fn from_json_str(source: &str) -> FormResult<Settings> {
    serde_json::from_str(source).map_err(|e| FormError::Config(format!("invalid JSON settings: {e}")))
}

pub fn from_toml_file(path: impl AsRef<Path>) -> FormResult<Settings> {
    from_toml_str(&read(path.as_ref())?)
}

pub fn from_json_file(path: impl AsRef<Path>) -> FormResult<Settings> {
    from_json_str(&read(path.as_ref())?)
}

/// [`from_toml_file`] followed by [`apply_env_overrides`].
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> FormResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with the environment applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies every `FORMBIND_*` variable that is set.
pub fn apply_env_overrides(settings: &mut Settings) {
    for (name, apply) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(name) {
            tracing::debug!(variable = name, "settings override from environment");
            apply(settings, value);
        }
    }
}

fn read(path: &Path) -> FormResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| FormError::Config(format!("cannot read settings file {}: {e}", path.display())))
}
