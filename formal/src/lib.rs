//! # formal
//!
//! Declarative HTML forms for Rust: declare typed fields and submit
//! actions once, then let [`Form::process`](forms::form::Form::process)
//! decode, validate and convert each submission before your callback runs.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on the
//! individual crates for finer-grained control.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use formal::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> FormalResult<()> {
//! let mut form = Form::with_callback(callback(|_form, data| async move {
//!     let name = data.get("name").map(Value::to_string).unwrap_or_default();
//!     Ok(Outcome::Redirect(format!("/hello/{name}")))
//! }));
//! form.add_field("name", Type::string().required(true))?;
//! form.add_action(Action::new("cancel", callback(|_, _| async { Ok(Outcome::Done) })).validate(false))?;
//!
//! let form = Arc::new(form);
//! let submission = Submission::parse_urlencoded(b"name=+Ada+");
//! let processed = Arc::clone(&form).process(&submission).await?;
//! assert_eq!(processed, Processed::Accepted(Outcome::Redirect("/hello/Ada".into())));
//!
//! let processed = form.process(&Submission::parse_urlencoded(b"name=")).await?;
//! assert!(processed.errors().unwrap().field_error("name").is_some());
//! # Ok(())
//! # }
//! ```

/// Errors, settings, logging and utilities.
pub use formal_core as core;

/// Raw submissions, charsets and uploaded files.
pub use formal_http as http;

/// Types, widgets, converters, forms and request dispatch.
pub use formal_forms as forms;

/// Re-exports of the items most applications need.
pub mod prelude {
    pub use formal_core::{
        CallbackError, FieldError, FormError, FormalError, FormalResult, Settings, SETTINGS,
    };
    pub use formal_forms::{
        callback, widget_factory, Action, DataTree, Dispatch, Field, Form, FormErrors,
        FormFactory, Group, NamedFormFactory, NativeData, Outcome, Processed, RequestContext,
        Type, Value,
    };
    pub use formal_http::{Submission, UploadedFile};

    pub use async_trait::async_trait;
    pub use serde_json::json;
}
