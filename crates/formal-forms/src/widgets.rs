//! Widgets: the input side of a field.
//!
//! A widget knows which submitted keys belong to its field and turns them
//! into one transport [`Value`] for the field's type to validate. Producing
//! HTML is the job of whatever renders the form; widgets here only expose
//! what a renderer needs (choices, part order, whether they are hidden).
//!
//! Every widget reports the [`ConverterKind`] of the transport value it
//! produces, which selects the converter a field is paired with.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use formal_core::{FieldError, FormalError, FormalResult, Settings};
use formal_http::UploadedFile;

use crate::adapters::ConverterKind;
use crate::decode::DataTree;
use crate::resources::ResourceManager;
use crate::types::Type;
use crate::value::Value;

/// What a widget can see while processing input.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    /// The name of the form being processed.
    pub form_name: &'a str,
    /// The resource manager of the form being processed.
    pub resources: &'a ResourceManager,
    pub settings: &'a Settings,
}

/// The input-processing contract of a form widget.
///
/// All widgets must be `Send + Sync` so forms can be processed on any task.
#[async_trait]
pub trait Widget: Send + Sync + fmt::Debug {
    /// Extracts this field's raw value from the decoded submission.
    ///
    /// Returns [`Value::Null`] when nothing was submitted.
    async fn process_input(
        &self,
        ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError>;

    /// Serves an out-of-band resource belonging to this field, such as a
    /// previously uploaded file.
    async fn resource(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        segments: &[&str],
    ) -> FormalResult<UploadedFile> {
        Err(FormalError::ResourceNotFound(format!(
            "{key}/{}",
            segments.join("/")
        )))
    }

    /// The transport representation this widget produces.
    fn converter_kind(&self) -> ConverterKind {
        ConverterKind::String
    }

    /// Whether the widget renders as a hidden input.
    fn is_hidden(&self) -> bool {
        false
    }
}

/// Builds a widget for a field type.
pub type WidgetFactory = Arc<dyn Fn(&Type) -> Arc<dyn Widget> + Send + Sync>;

/// Wraps a widget-building closure as a [`WidgetFactory`].
///
/// # Examples
///
/// ```
/// use formal_forms::widgets::{widget_factory, TextArea};
/// use formal_forms::types::Type;
///
/// let factory = widget_factory(|_ty| TextArea::new(40, 5));
/// let widget = factory(&Type::string());
/// assert!(!widget.is_hidden());
/// ```
pub fn widget_factory<W, F>(f: F) -> WidgetFactory
where
    W: Widget + 'static,
    F: Fn(&Type) -> W + Send + Sync + 'static,
{
    Arc::new(move |ty: &Type| Arc::new(f(ty)) as Arc<dyn Widget>)
}

/// Returns the last text submitted for `key`, if any.
fn text_input(data: &DataTree, key: &str) -> Result<Option<String>, FieldError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::List(items)) => match items.last() {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            None => Ok(None),
            Some(_) => Err(FieldError::invalid("Expected text input")),
        },
        Some(_) => Err(FieldError::invalid("Expected text input")),
    }
}

/// Returns every text submitted for `key`.
fn text_inputs(data: &DataTree, key: &str) -> Result<Vec<String>, FieldError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(FieldError::invalid("Expected text input")),
            })
            .collect(),
        Some(_) => Err(FieldError::invalid("Expected text input")),
    }
}

fn text_value(data: &DataTree, key: &str) -> Result<Value, FieldError> {
    Ok(text_input(data, key)?.map_or(Value::Null, Value::String))
}

// ---------------------------------------------------------------------------
// Text widgets
// ---------------------------------------------------------------------------

/// A single-line `<input type="text">`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInput;

#[async_trait]
impl Widget for TextInput {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        text_value(data, key)
    }
}

/// An `<input type="password">`.
///
/// The previous value is never rendered back unless `render_value` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Password {
    pub render_value: bool,
}

#[async_trait]
impl Widget for Password {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        text_value(data, key)
    }
}

/// A multi-line `<textarea>`.
#[derive(Debug, Clone, Copy)]
pub struct TextArea {
    pub cols: u32,
    pub rows: u32,
}

impl TextArea {
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }
}

impl Default for TextArea {
    fn default() -> Self {
        Self::new(48, 6)
    }
}

#[async_trait]
impl Widget for TextArea {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        text_value(data, key)
    }
}

/// An `<input type="hidden">`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hidden;

#[async_trait]
impl Widget for Hidden {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        text_value(data, key)
    }

    fn is_hidden(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Choice widgets
// ---------------------------------------------------------------------------

/// An `<input type="checkbox">` submitting `True` when checked.
///
/// Browsers omit unchecked boxes entirely, so absence reads as `False`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkbox;

#[async_trait]
impl Widget for Checkbox {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        match text_input(data, key)? {
            Some(s) if !s.is_empty() => Ok(Value::String(s)),
            _ => Ok(Value::from("False")),
        }
    }
}

/// A `<select>` allowing one of a fixed set of `(value, label)` choices.
#[derive(Debug, Clone, Default)]
pub struct SelectChoice {
    pub choices: Vec<(String, String)>,
    /// Label of the empty option offered when nothing is selected.
    pub none_label: String,
}

impl SelectChoice {
    pub fn new<V: Into<String>, L: Into<String>>(choices: impl IntoIterator<Item = (V, L)>) -> Self {
        Self {
            choices: choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
            none_label: "Choose one:".to_string(),
        }
    }

    fn is_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|(v, _)| v == value)
    }
}

#[async_trait]
impl Widget for SelectChoice {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        match text_input(data, key)? {
            None => Ok(Value::Null),
            Some(s) if s.is_empty() => Ok(Value::Null),
            Some(s) if self.is_choice(&s) => Ok(Value::String(s)),
            Some(s) => Err(FieldError::new(
                format!("Select a valid choice. {s} is not one of the available choices."),
                "invalid_choice",
            )),
        }
    }
}

/// A set of checkboxes allowing any subset of the choices.
#[derive(Debug, Clone, Default)]
pub struct CheckboxMultipleChoice {
    pub choices: Vec<(String, String)>,
}

impl CheckboxMultipleChoice {
    pub fn new<V: Into<String>, L: Into<String>>(choices: impl IntoIterator<Item = (V, L)>) -> Self {
        Self {
            choices: choices
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl Widget for CheckboxMultipleChoice {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        let mut selected = Vec::new();
        for value in text_inputs(data, key)? {
            if !self.choices.iter().any(|(v, _)| *v == value) {
                return Err(FieldError::new(
                    format!("Select a valid choice. {value} is not one of the available choices."),
                    "invalid_choice",
                ));
            }
            selected.push(Value::String(value));
        }
        Ok(Value::List(selected))
    }

    fn converter_kind(&self) -> ConverterKind {
        ConverterKind::Sequence
    }
}

// ---------------------------------------------------------------------------
// Date parts
// ---------------------------------------------------------------------------

/// Three text inputs, `key.year`, `key.month` and `key.day`.
///
/// Produces a `[year, month, day]` list of integers, or `Null` when all
/// three parts are blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePartsInput {
    /// Present the day before the month.
    pub day_first: bool,
}

impl DatePartsInput {
    pub const fn day_first() -> Self {
        Self { day_first: true }
    }

    /// The part names in the order they are presented.
    pub const fn part_order(&self) -> [&'static str; 3] {
        if self.day_first {
            ["day", "month", "year"]
        } else {
            ["month", "day", "year"]
        }
    }
}

#[async_trait]
impl Widget for DatePartsInput {
    async fn process_input(
        &self,
        _ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        let mut parts = Vec::with_capacity(3);
        for part in ["year", "month", "day"] {
            let text = text_input(data, &format!("{key}.{part}"))?.unwrap_or_default();
            parts.push(text.trim().to_string());
        }
        if parts.iter().all(String::is_empty) {
            return Ok(Value::Null);
        }
        parts
            .iter()
            .map(|p| {
                p.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| FieldError::invalid("Invalid date"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn converter_kind(&self) -> ConverterKind {
        ConverterKind::DateTuple
    }
}

// ---------------------------------------------------------------------------
// File upload
// ---------------------------------------------------------------------------

/// An `<input type="file">`.
///
/// A received upload is parked in the form's [`ResourceManager`], under the
/// `upload_dir` of the settings in use when one is set. When the
/// form is re-displayed the renderer sends the resource id back under
/// `key` + [`RESOURCE_SUFFIX`], so a resubmission without a new file keeps
/// the earlier upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUpload;

/// Suffix of the key carrying a previously uploaded file's resource id.
pub const RESOURCE_SUFFIX: &str = "__resource";

#[async_trait]
impl Widget for FileUpload {
    async fn process_input(
        &self,
        ctx: &InputContext<'_>,
        key: &str,
        data: &DataTree,
    ) -> Result<Value, FieldError> {
        let upload = match data.get(key) {
            Some(Value::File(f)) if !f.is_empty() => Some(f.clone()),
            _ => None,
        };

        if let Some(file) = upload {
            if let Some(max) = ctx.settings.max_upload_size {
                if file.size > max {
                    return Err(FieldError::new(
                        format!("Ensure this file is at most {max} bytes (it is {}).", file.size),
                        "max_size",
                    ));
                }
            }
            let dir = ctx.settings.upload_dir.as_deref();
            ctx.resources.register_in(key, &file, dir).map_err(|e| {
                tracing::error!(key, error = %e, "Failed to store upload");
                FieldError::new("The upload could not be stored", "upload_failed")
            })?;
            return Ok(Value::File(file));
        }

        let Some(id) = text_input(data, &format!("{key}{RESOURCE_SUFFIX}"))? else {
            return Ok(Value::Null);
        };
        match ctx.resources.get(&id) {
            Ok(Some(file)) => Ok(Value::File(file)),
            Ok(None) => Ok(Value::Null),
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to read stored upload");
                Err(FieldError::new("The upload could not be read", "upload_failed"))
            }
        }
    }

    async fn resource(
        &self,
        ctx: &InputContext<'_>,
        key: &str,
        segments: &[&str],
    ) -> FormalResult<UploadedFile> {
        let id = segments
            .first()
            .copied()
            .map(str::to_string)
            .or_else(|| ctx.resources.resource_id(key))
            .ok_or_else(|| FormalError::ResourceNotFound(key.to_string()))?;
        ctx.resources
            .get(&id)?
            .ok_or(FormalError::ResourceNotFound(id))
    }

    fn converter_kind(&self) -> ConverterKind {
        ConverterKind::File
    }
}
