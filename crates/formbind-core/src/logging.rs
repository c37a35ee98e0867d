//! Tracing setup.
//!
//! The library itself only emits [`tracing`] events. Applications call
//! [`setup_logging`] once to print them, and every form lifecycle runs
//! inside a [`form_span`] so nested forms and formset rows can be told
//! apart in the output.

use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

const FALLBACK_FILTER: &str = "info";

/// Installs a global `fmt` subscriber filtered by `settings.log_level`.
///
/// Debug mode prints multi-line events with source locations; otherwise
/// one JSON object per line. An unparsable filter falls back to `info`.
/// Returns `false` when a global subscriber was already installed.
pub fn setup_logging(settings: &Settings) -> bool {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if settings.debug {
        builder.pretty().with_file(true).with_line_number(true).try_init()
    } else {
        builder.json().try_init()
    };
    installed.is_ok()
}

/// The span a form's fetch, load, validate and save run in. Sub-forms
/// open their own span with their prefix, nested under the owner's.
///
/// ```
/// use formbind_core::logging::form_span;
///
/// let span = form_span("job", "jobs-0-");
/// let _entered = span.enter();
/// tracing::debug!("loading submission");
/// ```
pub fn form_span(form: &str, prefix: &str) -> tracing::Span {
    tracing::debug_span!("form", name = form, prefix = prefix)
}
