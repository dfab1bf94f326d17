//! Loading [`Settings`] from configuration files and the environment.
//!
//! Values are layered: defaults, then a TOML or JSON document, then
//! `FORMAL_*` environment variables. A document only needs the keys it
//! changes.
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMAL_DEBUG` | `debug` |
//! | `FORMAL_LOG_LEVEL` | `log_level` |
//! | `FORMAL_DEFAULT_CHARSET` | `default_charset` |
//! | `FORMAL_CHARSET_KEY` | `charset_key` |
//! | `FORMAL_FORM_KEY` | `form_key` |
//! | `FORMAL_UPLOAD_DIR` | `upload_dir` (empty clears it) |
//! | `FORMAL_MAX_UPLOAD_SIZE` | `max_upload_size` |
//!
//! ```rust,no_run
//! use formal_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("config/formal.toml")?;
//! # Ok::<(), formal_core::FormalError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::error::{FormalError, FormalResult};
use crate::settings::Settings;

/// A configuration document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension. Anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    /// Parses a document into settings layered over the defaults.
    pub fn parse(self, text: &str) -> FormalResult<Settings> {
        let overrides = match self {
            Self::Toml => toml::from_str::<toml::Value>(text)
                .map_err(|e| config_error(self, "parse", e))
                .and_then(|v| serde_json::to_value(v).map_err(|e| config_error(self, "parse", e)))?,
            Self::Json => serde_json::from_str::<serde_json::Value>(text)
                .map_err(|e| config_error(self, "parse", e))?,
        };
        let defaults = serde_json::to_value(Settings::default())
            .map_err(|e| config_error(self, "serialize defaults for", e))?;
        serde_json::from_value(overlay(defaults, overrides))
            .map_err(|e| config_error(self, "read settings from", e))
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

fn config_error(format: ConfigFormat, action: &str, e: impl std::fmt::Display) -> FormalError {
    FormalError::ConfigurationError(format!("Failed to {action} {}: {e}", format.name()))
}

/// Loads settings from a TOML string.
pub fn from_toml_str(text: &str) -> FormalResult<Settings> {
    ConfigFormat::Toml.parse(text)
}

/// Loads settings from a JSON string.
pub fn from_json_str(text: &str) -> FormalResult<Settings> {
    ConfigFormat::Json.parse(text)
}

/// Loads settings from a `.toml` or `.json` file.
pub fn from_file(path: impl AsRef<Path>) -> FormalResult<Settings> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        FormalError::ConfigurationError(format!("Failed to read '{}': {e}", path.display()))
    })?;
    ConfigFormat::from_path(path).parse(&text)
}

/// Loads settings from a file, then applies environment overrides.
pub fn from_file_with_env(path: impl AsRef<Path>) -> FormalResult<Settings> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads the defaults with environment overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMAL_*` environment variables to `settings`.
///
/// A `FORMAL_MAX_UPLOAD_SIZE` that is not a number is ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    let var = |name: &str| std::env::var(name).ok();

    if let Some(v) = var("FORMAL_DEBUG") {
        settings.debug = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
    if let Some(v) = var("FORMAL_LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = var("FORMAL_DEFAULT_CHARSET") {
        settings.default_charset = v;
    }
    if let Some(v) = var("FORMAL_CHARSET_KEY") {
        settings.charset_key = v;
    }
    if let Some(v) = var("FORMAL_FORM_KEY") {
        settings.form_key = v;
    }
    if let Some(v) = var("FORMAL_UPLOAD_DIR") {
        settings.upload_dir = (!v.is_empty()).then(|| PathBuf::from(v));
    }
    match var("FORMAL_MAX_UPLOAD_SIZE").map(|v| v.parse::<usize>()) {
        Some(Ok(size)) => settings.max_upload_size = Some(size),
        Some(Err(e)) => tracing::warn!(error = %e, "Ignoring FORMAL_MAX_UPLOAD_SIZE"),
        None => {}
    }
}

/// Recursively replaces values in `base` with those present in `top`.
fn overlay(base: serde_json::Value, top: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match (base, top) {
        (Value::Object(mut base), Value::Object(top)) => {
            for (key, value) in top {
                let value = match base.remove(&key) {
                    Some(old) => overlay(old, value),
                    None => value,
                };
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, top) => top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Documents ───────────────────────────────────────────────────

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let settings = from_toml_str(
            r#"
            debug = false
            default_charset = "iso-8859-1"
            max_upload_size = 1048576
        "#,
        )
        .unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.default_charset, "iso-8859-1");
        assert_eq!(settings.max_upload_size, Some(1_048_576));
        assert_eq!(settings.form_key, "__formal_form__");
    }

    #[test]
    fn test_toml_upload_dir() {
        let settings = from_toml_str(r#"upload_dir = "/var/tmp/formal""#).unwrap();
        assert_eq!(settings.upload_dir, Some(PathBuf::from("/var/tmp/formal")));
    }

    #[test]
    fn test_empty_toml_is_defaults() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.charset_key, "_charset_");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(from_toml_str("[[not toml").is_err());
        assert!(from_json_str("{not json").is_err());
        let err = from_toml_str("debug = \"sometimes\"").unwrap_err();
        assert!(matches!(err, FormalError::ConfigurationError(ref m) if m.contains("TOML")));
    }

    #[test]
    fn test_json_document() {
        let settings = from_json_str(r#"{"debug": false, "log_level": "debug"}"#).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.default_charset, "utf-8");
    }

    // ── Files ───────────────────────────────────────────────────────

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("formal")), ConfigFormat::Toml);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("formal.toml");
        std::fs::write(&toml_path, "form_key = \"__which_form__\"\n").unwrap();
        assert_eq!(from_file(&toml_path).unwrap().form_key, "__which_form__");

        let json_path = dir.path().join("formal.json");
        std::fs::write(&json_path, r#"{"charset_key": "enc"}"#).unwrap();
        assert_eq!(from_file(&json_path).unwrap().charset_key, "enc");
    }

    #[test]
    fn test_missing_file() {
        let err = from_file("/nonexistent/path/formal.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/path/formal.toml"));
    }

    // ── Environment ─────────────────────────────────────────────────
    //
    // Each test touches a distinct variable so they can run in parallel.

    #[test]
    fn test_env_log_level() {
        let mut settings = Settings::default();
        std::env::set_var("FORMAL_LOG_LEVEL", "trace");
        apply_env_overrides(&mut settings);
        std::env::remove_var("FORMAL_LOG_LEVEL");
        assert_eq!(settings.log_level, "trace");
    }

    #[test]
    fn test_env_charset_key() {
        let mut settings = Settings::default();
        std::env::set_var("FORMAL_CHARSET_KEY", "enc");
        apply_env_overrides(&mut settings);
        std::env::remove_var("FORMAL_CHARSET_KEY");
        assert_eq!(settings.charset_key, "enc");
    }

    #[test]
    fn test_env_bad_upload_size_ignored() {
        let mut settings = Settings::default();
        std::env::set_var("FORMAL_MAX_UPLOAD_SIZE", "lots");
        apply_env_overrides(&mut settings);
        std::env::remove_var("FORMAL_MAX_UPLOAD_SIZE");
        assert_eq!(settings.max_upload_size, None);
    }

    #[test]
    fn test_overlay_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}, "keep": true});
        let top = serde_json::json!({"outer": {"b": 3}});
        let merged = overlay(base, top);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
        assert_eq!(merged["keep"], true);
    }
}
