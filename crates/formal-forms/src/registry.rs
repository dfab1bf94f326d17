//! Locating forms by name for the duration of one request.
//!
//! A page may hold several forms. The web layer creates one
//! [`RequestContext`] per request and uses it for every step of that
//! request: dispatching a POST to the addressed form, preparing forms for
//! rendering, and serving widget resources. Within one context a form name
//! always resolves to the same `Arc<Form>`, so the form that rejected a
//! submission is the one that re-displays it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use formal_core::{FormalError, FormalResult, Settings, SETTINGS};
use formal_http::{Submission, UploadedFile};

use crate::decode::DataTree;
use crate::errors::FormErrors;
use crate::form::{Form, Outcome, Processed};

/// Builds forms on demand.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use formal_core::FormalResult;
/// use formal_forms::form::Form;
/// use formal_forms::registry::FormFactory;
///
/// struct OnlyLogin;
///
/// #[async_trait]
/// impl FormFactory for OnlyLogin {
///     async fn create_form(&self, name: &str) -> FormalResult<Option<Form>> {
///         Ok((name == "login").then(Form::new))
///     }
/// }
/// ```
#[async_trait]
pub trait FormFactory: Send + Sync {
    /// Returns a new form for `name`, or `None` when this factory does not
    /// know the name.
    async fn create_form(&self, name: &str) -> FormalResult<Option<Form>>;
}

/// Builds one named form.
pub type FormBuilder = Arc<dyn Fn() -> FormalResult<Form> + Send + Sync>;

/// A [`FormFactory`] backed by per-name builder closures, deferring unknown
/// names to an optional fallback factory.
#[derive(Default, Clone)]
pub struct NamedFormFactory {
    builders: HashMap<String, FormBuilder>,
    fallback: Option<Arc<dyn FormFactory>>,
}

impl fmt::Debug for NamedFormFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.builders.keys().collect();
        names.sort();
        f.debug_struct("NamedFormFactory")
            .field("forms", &names)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl NamedFormFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the builder for `name`, replacing any earlier one.
    #[must_use]
    pub fn with_form<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn() -> FormalResult<Form> + Send + Sync + 'static,
    {
        self.builders.insert(name.into(), Arc::new(builder));
        self
    }

    /// Sets the factory consulted for names without a builder.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FormFactory>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Returns `true` if a builder is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

#[async_trait]
impl FormFactory for NamedFormFactory {
    async fn create_form(&self, name: &str) -> FormalResult<Option<Form>> {
        if let Some(builder) = self.builders.get(name) {
            return builder().map(Some);
        }
        match &self.fallback {
            Some(fallback) => fallback.create_form(name).await,
            None => Ok(None),
        }
    }
}

// ── Request context ─────────────────────────────────────────────────

/// What the web layer should do after [`RequestContext::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The submission was not addressed to a form.
    Ignored,
    /// The form rejected the submission; render the page again.
    Redisplay,
    /// The form accepted the submission without asking for anything; send
    /// the browser back to the page it came from.
    RedirectToSelf,
    /// The form accepted the submission and asked for this response.
    Outcome(Outcome),
}

/// Everything a renderer needs to display one form.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub form: Arc<Form>,
    /// Values to show, in transport form, keyed like the submission.
    pub data: DataTree,
    /// Errors from a rejected submission earlier in this request.
    pub errors: Option<FormErrors>,
}

/// The per-request form cache.
pub struct RequestContext {
    factory: Arc<dyn FormFactory>,
    settings: Settings,
    known: HashMap<String, Arc<Form>>,
    errors: HashMap<String, FormErrors>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("known", &self.known.keys().collect::<Vec<_>>())
            .field("errors", &self.errors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    /// Creates a context using the global settings.
    pub fn new(factory: Arc<dyn FormFactory>) -> Self {
        Self::with_settings(factory, SETTINGS.get_or_default().clone())
    }

    pub fn with_settings(factory: Arc<dyn FormFactory>, settings: Settings) -> Self {
        Self {
            factory,
            settings,
            known: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the form called `name`, building and naming it on first use.
    pub async fn locate_form(&mut self, name: &str) -> FormalResult<Arc<Form>> {
        if let Some(form) = self.known.get(name) {
            return Ok(Arc::clone(form));
        }
        let mut form = self
            .factory
            .create_form(name)
            .await?
            .ok_or_else(|| FormalError::FormNotFound(name.to_string()))?;
        form.set_name(name);
        tracing::debug!(form = name, "Created form");
        let form = Arc::new(form);
        self.known.insert(name.to_string(), Arc::clone(&form));
        Ok(form)
    }

    /// Routes a POST submission to the form it names.
    ///
    /// Errors of a rejected submission are kept so that [`render_state`]
    /// shows the user's input again.
    ///
    /// [`render_state`]: Self::render_state
    pub async fn dispatch(&mut self, submission: &Submission) -> FormalResult<Dispatch> {
        let Some(name) = submission.reserved(&self.settings.form_key) else {
            return Ok(Dispatch::Ignored);
        };
        let form = self.locate_form(&name).await?;
        match form.process_with(submission, &self.settings).await? {
            Processed::Rejected(errors) => {
                self.errors.insert(name, errors);
                Ok(Dispatch::Redisplay)
            }
            Processed::Accepted(Outcome::Done) => {
                self.errors.remove(&name);
                Ok(Dispatch::RedirectToSelf)
            }
            Processed::Accepted(outcome) => {
                self.errors.remove(&name);
                Ok(Dispatch::Outcome(outcome))
            }
        }
    }

    /// The errors a form produced earlier in this request.
    pub fn errors_for(&self, name: &str) -> Option<&FormErrors> {
        self.errors.get(name)
    }

    /// Prepares the form called `name` for rendering.
    ///
    /// After a rejected submission the submitted data is shown as it was
    /// entered; otherwise the form's stored native data is converted to
    /// transport values.
    pub async fn render_state(&mut self, name: &str) -> FormalResult<RenderState> {
        let form = self.locate_form(name).await?;
        if let Some(errors) = self.errors.get(name) {
            return Ok(RenderState {
                form,
                data: errors.data.clone(),
                errors: Some(errors.clone()),
            });
        }

        let stored = form.data();
        let mut data = DataTree::new();
        for field in form.fields() {
            let key = field.key();
            let Some(value) = stored.get(&key).filter(|v| !v.is_null()) else {
                continue;
            };
            let shown = field.converter().from_type(value).unwrap_or_else(|e| {
                tracing::warn!(field = %key, error = %e, "Stored value does not convert");
                value.clone()
            });
            data.insert(&key, shown);
        }
        Ok(RenderState {
            form,
            data,
            errors: None,
        })
    }

    /// Serves a resource belonging to the widget of `field_key`.
    pub async fn widget_resource(
        &mut self,
        form_name: &str,
        field_key: &str,
        segments: &[&str],
    ) -> FormalResult<UploadedFile> {
        let form = self.locate_form(form_name).await?;
        let field = form
            .field_by_key(field_key)
            .ok_or_else(|| FormalError::ItemNotFound(field_key.to_string()))?;
        let ctx = form.input_context(&self.settings);
        field.widget().resource(&ctx, field_key, segments).await
    }
}
