//! Settings for formal.
//!
//! This module provides the [`Settings`] struct, which holds the handful of
//! knobs the form pipeline reads (reserved submission keys, charset and
//! upload handling, logging), and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The complete set of formal settings.
///
/// # Examples
///
/// ```
/// use formal_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.default_charset, "utf-8");
/// assert_eq!(settings.form_key, "__formal_form__");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Submissions ──────────────────────────────────────────────────

    /// The charset used to decode submissions that do not declare one.
    pub default_charset: String,
    /// The submission key a browser fills with the charset it used.
    pub charset_key: String,
    /// The submission key naming the form a POST is addressed to.
    pub form_key: String,

    // ── Uploads ──────────────────────────────────────────────────────

    /// Directory for temporary widget resources. `None` uses the system
    /// temporary directory.
    pub upload_dir: Option<PathBuf>,
    /// Maximum accepted upload size in bytes. `None` means unlimited.
    pub max_upload_size: Option<usize>,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            default_charset: "utf-8".to_string(),
            charset_key: "_charset_".to_string(),
            form_key: "__formal_form__".to_string(),
            upload_dir: None,
            max_upload_size: None,
            log_level: "info".to_string(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup. Code that
/// must work without explicit configuration uses
/// [`get_or_default`](LazySettings::get_or_default).
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called at most once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, or the defaults if nothing was
    /// configured yet. Does not configure anything.
    pub fn get_or_default(&self) -> &Settings {
        static DEFAULTS: OnceLock<Settings> = OnceLock::new();
        self.inner
            .get()
            .unwrap_or_else(|| DEFAULTS.get_or_init(Settings::default))
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.default_charset, "utf-8");
        assert_eq!(s.charset_key, "_charset_");
        assert_eq!(s.form_key, "__formal_form__");
        assert!(s.upload_dir.is_none());
        assert!(s.max_upload_size.is_none());
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());

        let mut settings = Settings::default();
        settings.debug = false;
        settings.default_charset = "iso-8859-1".to_string();

        lazy.configure(settings);
        assert!(lazy.is_configured());
        assert!(!lazy.get().debug);
        assert_eq!(lazy.get().default_charset, "iso-8859-1");
    }

    #[test]
    fn test_lazy_settings_get_or_default() {
        let lazy = LazySettings::new();
        assert_eq!(lazy.get_or_default().form_key, "__formal_form__");
        assert!(!lazy.is_configured());

        let mut settings = Settings::default();
        settings.form_key = "__which__".to_string();
        lazy.configure(settings);
        assert_eq!(lazy.get_or_default().form_key, "__which__");
    }

    #[test]
    #[should_panic(expected = "already been configured")]
    fn test_lazy_settings_double_configure_panics() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default());
        lazy.configure(Settings::default());
    }

    #[test]
    #[should_panic(expected = "not been configured")]
    fn test_lazy_settings_get_before_configure_panics() {
        let lazy = LazySettings::new();
        let _ = lazy.get();
    }
}
