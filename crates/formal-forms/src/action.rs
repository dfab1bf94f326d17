//! Submit actions.

use std::fmt;

use formal_core::utils::text::title_from_name;

use crate::form::FormCallback;

/// A named submit button bound to a callback.
///
/// An action is selected when its name is present in a submission. Actions
/// that do not validate (a "Cancel" button) still run the callback when the
/// submitted data has errors.
#[derive(Clone)]
pub struct Action {
    name: String,
    callback: FormCallback,
    validate: bool,
    label: String,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("validate", &self.validate)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Creates a validating action labelled from its name.
    pub fn new(name: impl Into<String>, callback: FormCallback) -> Self {
        let name = name.into();
        let label = title_from_name(&name);
        Self {
            name,
            callback,
            validate: true,
            label,
        }
    }

    /// Sets whether the submission must validate before the callback runs.
    #[must_use]
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Sets the button label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn validates(&self) -> bool {
        self.validate
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn callback(&self) -> &FormCallback {
        &self.callback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{callback, Outcome};

    #[test]
    fn test_action_defaults() {
        let action = Action::new("save_draft", callback(|_, _| async { Ok(Outcome::Done) }));
        assert_eq!(action.name(), "save_draft");
        assert_eq!(action.label(), "Save Draft");
        assert!(action.validates());
    }

    #[test]
    fn test_action_builders() {
        let action = Action::new("cancel", callback(|_, _| async { Ok(Outcome::Done) }))
            .validate(false)
            .with_label("Never mind");
        assert!(!action.validates());
        assert_eq!(action.label(), "Never mind");
        assert!(format!("{action:?}").contains("cancel"));
    }
}
