//! The form and its submission pipeline.
//!
//! [`Form::process`] takes one [`Submission`] through a fixed sequence:
//!
//! 1. decode keys and values with the declared charset into a [`DataTree`]
//! 2. select the first action whose name was submitted, or the default
//!    callback
//! 3. run every field's widget and type validation, in declaration order
//! 4. stop with the errors if there are any and the action validates
//! 5. convert validated values to native values, and stop again on errors
//! 6. release widget resources when nothing failed
//! 7. run the callback; validation errors it raises are reported like any
//!    other, everything else propagates

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use formal_core::logging::submission_span;
use formal_core::{CallbackError, FormalError, FormalResult, Settings, SETTINGS};
use formal_http::Submission;
use tracing::Instrument;

use crate::action::Action;
use crate::decode::DataTree;
use crate::errors::FormErrors;
use crate::items::{Field, Group, Item};
use crate::resources::ResourceManager;
use crate::types::Type;
use crate::value::Value;
use crate::widgets::InputContext;

/// Native values keyed by field key.
pub type NativeData = HashMap<String, Value>;

/// What an accepted submission asks the caller to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing in particular; the web layer usually redirects back to the page.
    Done,
    /// Redirect to the given URL.
    Redirect(String),
    /// Respond with this content.
    Content(serde_json::Value),
}

/// The future returned by a form callback.
pub type CallbackFuture = Pin<Box<dyn Future<Output = Result<Outcome, CallbackError>> + Send>>;

/// An async function invoked with the form and its native data.
pub type FormCallback = Arc<dyn Fn(Arc<Form>, NativeData) -> CallbackFuture + Send + Sync>;

/// Wraps an async closure as a [`FormCallback`].
///
/// # Examples
///
/// ```
/// use formal_forms::form::{callback, Outcome};
///
/// let cb = callback(|_form, data| async move {
///     Ok(Outcome::Redirect(format!("/thanks?n={}", data.len())))
/// });
/// ```
pub fn callback<F, Fut>(f: F) -> FormCallback
where
    F: Fn(Arc<Form>, NativeData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, CallbackError>> + Send + 'static,
{
    Arc::new(move |form: Arc<Form>, data: NativeData| -> CallbackFuture {
        Box::pin(f(form, data))
    })
}

/// The result of processing a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// The callback ran and returned this outcome.
    Accepted(Outcome),
    /// The submission was rejected; re-display the form with these errors.
    Rejected(FormErrors),
}

impl Processed {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The errors of a rejected submission.
    pub const fn errors(&self) -> Option<&FormErrors> {
        match self {
            Self::Rejected(errors) => Some(errors),
            Self::Accepted(_) => None,
        }
    }
}

/// A form definition plus the state it carries between passes.
///
/// Forms are built once, shared as `Arc<Form>`, and processed any number of
/// times. The stored data re-populates immutable fields and is what a
/// renderer shows when no errors are pending.
pub struct Form {
    name: String,
    items: Vec<Item>,
    actions: Vec<Action>,
    callback: Option<FormCallback>,
    data: RwLock<NativeData>,
    resources: ResourceManager,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("items", &self.items)
            .field("actions", &self.actions)
            .field("has_callback", &self.callback.is_some())
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Creates an empty form without a default callback.
    ///
    /// Widget resources go to the configured upload directory.
    pub fn new() -> Self {
        let upload_dir = SETTINGS.get_or_default().upload_dir.clone();
        Self {
            name: String::new(),
            items: Vec::new(),
            actions: Vec::new(),
            callback: None,
            data: RwLock::new(NativeData::new()),
            resources: ResourceManager::new(upload_dir),
        }
    }

    /// Creates an empty form with a default callback.
    pub fn with_callback(callback: FormCallback) -> Self {
        let mut form = Self::new();
        form.callback = Some(callback);
        form
    }

    /// Replaces the resource manager.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceManager) -> Self {
        self.resources = resources;
        self
    }

    pub fn set_callback(&mut self, callback: FormCallback) {
        self.callback = Some(callback);
    }

    /// The name the form was located by. Empty until a registry names it.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ── Definition ──────────────────────────────────────────────────

    /// Adds a field or group at the top level.
    pub fn add(&mut self, item: impl Into<Item>) -> FormalResult<()> {
        let mut item = item.into();
        if self.items.iter().any(|i| i.name() == item.name()) {
            return Err(FormalError::DuplicateItem(item.name().to_string()));
        }
        item.set_path(Vec::new());
        self.items.push(item);
        Ok(())
    }

    /// Adds a field with the default widget for `ty`.
    pub fn add_field(&mut self, name: impl Into<String>, ty: Type) -> FormalResult<()> {
        self.add(Field::new(name, ty)?)
    }

    pub fn add_group(&mut self, group: Group) -> FormalResult<()> {
        self.add(group)
    }

    /// Adds an action. Action names are unique within a form.
    pub fn add_action(&mut self, action: Action) -> FormalResult<()> {
        if self.actions.iter().any(|a| a.name() == action.name()) {
            return Err(FormalError::DuplicateAction(action.name().to_string()));
        }
        self.actions.push(action);
        Ok(())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Returns the top-level item called `name`.
    pub fn item_by_name(&self, name: &str) -> FormalResult<&Item> {
        self.items
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| FormalError::ItemNotFound(name.to_string()))
    }

    /// Returns every field, depth first in declaration order.
    pub fn fields(&self) -> Vec<&Field> {
        let mut out = Vec::new();
        for item in &self.items {
            item.collect_fields(&mut out);
        }
        out
    }

    /// Returns the field with the dotted key `key`.
    pub fn field_by_key(&self, key: &str) -> Option<&Field> {
        self.fields().into_iter().find(|f| f.key() == key)
    }

    // ── State ───────────────────────────────────────────────────────

    /// Replaces the stored native data.
    pub fn set_data(&self, data: NativeData) {
        *self.data.write().expect("form data lock poisoned") = data;
    }

    /// Returns a snapshot of the stored native data.
    pub fn data(&self) -> NativeData {
        self.data.read().expect("form data lock poisoned").clone()
    }

    pub const fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Builds the context handed to widgets of this form.
    pub fn input_context<'a>(&'a self, settings: &'a Settings) -> InputContext<'a> {
        InputContext {
            form_name: &self.name,
            resources: &self.resources,
            settings,
        }
    }

    // ── Processing ──────────────────────────────────────────────────

    /// Processes a submission with the global settings.
    pub async fn process(self: Arc<Self>, submission: &Submission) -> FormalResult<Processed> {
        self.process_with(submission, SETTINGS.get_or_default()).await
    }

    /// Processes a submission.
    ///
    /// Returns `Ok(Processed::Rejected(..))` for anything wrong with the
    /// submitted data, including validation errors raised by the callback.
    /// Returns `Err` only for definition problems, an undecodable charset,
    /// or a callback failing with a non-validation error.
    pub async fn process_with(
        self: Arc<Self>,
        submission: &Submission,
        settings: &Settings,
    ) -> FormalResult<Processed> {
        let span = submission_span(&self.name);
        self.run(submission, settings).instrument(span).await
    }

    async fn run(self: Arc<Self>, submission: &Submission, settings: &Settings) -> FormalResult<Processed> {
        let charset = submission.charset(&settings.charset_key, &settings.default_charset)?;
        let mut data = DataTree::from_inputs(submission.decode(charset));
        data.remove(&settings.form_key);
        data.remove(&settings.charset_key);

        let (callback, validate) = match self.actions.iter().find(|a| data.contains_key(a.name())) {
            Some(action) => {
                data.remove(action.name());
                tracing::debug!(action = action.name(), validate = action.validates(), "Selected action");
                (Arc::clone(action.callback()), action.validates())
            }
            None => match &self.callback {
                Some(callback) => (Arc::clone(callback), true),
                None => return Err(FormalError::NoCallback(self.name.clone())),
            },
        };

        let mut errors = FormErrors::new(self.name.clone(), DataTree::new());
        let stored = self.data();
        let ctx = self.input_context(settings);
        let mut native = NativeData::new();
        let mut checked: Vec<(&Field, Value)> = Vec::new();

        for field in self.fields() {
            let key = field.key();
            if field.ty().is_immutable() {
                let value = stored.get(&key).cloned().unwrap_or(Value::Null);
                let shown = field.converter().from_type(&value).unwrap_or_else(|_| value.clone());
                data.insert(&key, shown);
                native.insert(key, value);
                continue;
            }
            let result = match field.widget().process_input(&ctx, &key, &data).await {
                Ok(raw) => field.ty().check(raw),
                Err(e) => Err(e),
            };
            match result {
                Ok(value) => checked.push((field, value)),
                Err(mut e) => {
                    e.ensure_field(&key);
                    tracing::debug!(field = %key, error = %e, "Field failed validation");
                    errors.add(e);
                }
            }
        }

        if !errors.is_empty() && validate {
            errors.data = data;
            tracing::info!(errors = errors.len(), "Submission rejected");
            return Ok(Processed::Rejected(errors));
        }

        for (field, value) in checked {
            let key = field.key();
            let converted = if value.is_null() {
                Ok(field.ty().missing_value().clone())
            } else {
                field.converter().to_type(&value)
            };
            match converted {
                Ok(v) => {
                    native.insert(key, v);
                }
                Err(mut e) => {
                    e.ensure_field(&key);
                    tracing::debug!(field = %key, error = %e, "Field failed conversion");
                    errors.add(e);
                }
            }
        }

        if !errors.is_empty() && validate {
            errors.data = data;
            tracing::info!(errors = errors.len(), "Submission rejected");
            return Ok(Processed::Rejected(errors));
        }

        if errors.is_empty() {
            let released = self.resources.clear_up_resources();
            if released > 0 {
                tracing::debug!(released, "Released widget resources");
            }
        }

        self.data
            .write()
            .expect("form data lock poisoned")
            .extend(native.clone());
        errors.data = data;

        match callback(Arc::clone(&self), native).await {
            Ok(outcome) => Ok(Processed::Accepted(outcome)),
            Err(CallbackError::Validation(e)) => {
                tracing::info!(error = %e, "Callback rejected submission");
                errors.add(e);
                Ok(Processed::Rejected(errors))
            }
            Err(CallbackError::Failed(e)) => {
                tracing::error!(error = %e, "Form callback failed");
                Err(FormalError::Callback(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use formal_core::{FieldError, FormError};

    use super::*;

    fn done() -> FormCallback {
        callback(|_, _| async { Ok(Outcome::Done) })
    }

    fn named(form: Form, name: &str) -> Arc<Form> {
        let mut form = form;
        form.set_name(name);
        Arc::new(form)
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let mut form = Form::new();
        form.add_action(Action::new("submit", done())).unwrap();
        let err = form.add_action(Action::new("submit", done())).unwrap_err();
        assert!(matches!(err, FormalError::DuplicateAction(ref n) if n == "submit"));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut form = Form::new();
        form.add_field("name", Type::string()).unwrap();
        let err = form.add_field("name", Type::integer()).unwrap_err();
        assert!(matches!(err, FormalError::DuplicateItem(_)));
    }

    #[test]
    fn test_item_lookup() {
        let mut form = Form::new();
        let group = Group::new("address")
            .unwrap()
            .with(Field::new("city", Type::string()).unwrap())
            .unwrap();
        form.add_group(group).unwrap();
        form.add_field("name", Type::string()).unwrap();

        assert!(matches!(form.item_by_name("address"), Ok(Item::Group(_))));
        assert!(matches!(form.item_by_name("city"), Err(FormalError::ItemNotFound(_))));
        assert_eq!(form.field_by_key("address.city").map(Field::name), Some("city"));
        let keys: Vec<_> = form.fields().iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["address.city", "name"]);
    }

    #[tokio::test]
    async fn test_no_callback_is_fatal() {
        let mut form = Form::new();
        form.add_field("name", Type::string()).unwrap();
        let form = named(form, "orphan");
        let err = form.process(&Submission::new()).await.unwrap_err();
        assert!(matches!(err, FormalError::NoCallback(ref n) if n == "orphan"));
    }

    #[tokio::test]
    async fn test_reserved_keys_not_treated_as_data() {
        let seen = Arc::new(std::sync::Mutex::new(NativeData::new()));
        let sink = Arc::clone(&seen);
        let mut form = Form::with_callback(callback(move |_, data| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = data;
                Ok(Outcome::Done)
            }
        }));
        form.add_field("name", Type::string()).unwrap();
        let sub = Submission::new()
            .with_text("__formal_form__", "f")
            .with_text("_charset_", "utf-8")
            .with_text("name", "x");
        let result = named(form, "f").process(&sub).await.unwrap();
        assert!(result.is_accepted());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.get("name"), Some(&Value::from("x")));
    }

    #[tokio::test]
    async fn test_unsupported_charset_is_fatal() {
        let mut form = Form::with_callback(done());
        form.add_field("name", Type::string()).unwrap();
        let sub = Submission::new().with_text("_charset_", "utf-7");
        let err = named(form, "f").process(&sub).await.unwrap_err();
        assert!(matches!(err, FormalError::UnsupportedCharset(_)));
    }

    #[tokio::test]
    async fn test_conversion_error_rejects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut form = Form::with_callback(callback(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Outcome::Done) }
        }));
        form.add_field("age", Type::integer()).unwrap();
        let sub = Submission::new().with_text("age", "forty");
        let result = named(form, "f").process(&sub).await.unwrap();
        let errors = result.errors().unwrap();
        assert_eq!(errors.field_error("age").unwrap().message, "Not a valid number");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_value_substituted() {
        let mut form = Form::with_callback(callback(|_, data| async move {
            assert_eq!(data.get("count"), Some(&Value::Int(1)));
            Ok(Outcome::Done)
        }));
        form.add_field("count", Type::integer().missing(1_i64)).unwrap();
        let result = named(form, "f").process(&Submission::new()).await.unwrap();
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn test_stored_data_updated() {
        let mut form = Form::with_callback(done());
        form.add_field("n", Type::integer()).unwrap();
        let form = named(form, "f");
        Arc::clone(&form)
            .process(&Submission::new().with_text("n", "5"))
            .await
            .unwrap();
        assert_eq!(form.data().get("n"), Some(&Value::Int(5)));
    }

    #[tokio::test]
    async fn test_callback_field_error_gets_trapped() {
        let mut form = Form::with_callback(callback(|_, _| async {
            Err(FieldError::invalid("Taken").with_field("username").into())
        }));
        form.add_field("username", Type::string()).unwrap();
        let result = named(form, "f")
            .process(&Submission::new().with_text("username", "ada"))
            .await
            .unwrap();
        let errors = result.errors().unwrap();
        assert_eq!(errors.field_error("username").unwrap().message, "Taken");
        assert_eq!(errors.data.get("username"), Some(&Value::from("ada")));
    }

    #[tokio::test]
    async fn test_callback_form_error_gets_trapped() {
        let form = Form::with_callback(callback(|_, _| async {
            Err(FormError::new("Try again later", "busy").into())
        }));
        let result = named(form, "f").process(&Submission::new()).await.unwrap();
        assert_eq!(result.errors().unwrap().form_errors()[0].message, "Try again later");
    }
}
