//! # formal-forms
//!
//! Declarative forms: a tree of typed fields, submit actions, and the
//! pipeline that turns one submission into native values for a callback.
//!
//! ## Modules
//!
//! - [`value`] - The dynamic [`Value`] passed between widgets, types and converters
//! - [`decode`] - Grouping a flat submission into a nested [`DataTree`]
//! - [`types`] - Field types with normalization and a validator chain
//! - [`validators`] - Reusable validators
//! - [`converters`] - Transport/native conversion
//! - [`widgets`] - Input processing per field
//! - [`adapters`] - Default widget and converter selection per type
//! - [`resources`] - Transient files held by widgets
//! - [`items`] - Fields and groups
//! - [`action`] - Submit actions
//! - [`errors`] - Errors of one processing pass
//! - [`form`] - The form and [`Form::process`]
//! - [`registry`] - Per-request form lookup and dispatch

pub mod action;
pub mod adapters;
pub mod converters;
pub mod decode;
pub mod errors;
pub mod form;
pub mod items;
pub mod registry;
pub mod resources;
pub mod types;
pub mod validators;
pub mod value;
pub mod widgets;

pub use action::Action;
pub use adapters::{AdapterRegistry, ConverterKind};
pub use decode::{DataTree, Node};
pub use errors::FormErrors;
pub use form::{callback, Form, FormCallback, NativeData, Outcome, Processed};
pub use items::{Field, Group, Item};
pub use registry::{Dispatch, FormFactory, NamedFormFactory, RenderState, RequestContext};
pub use resources::ResourceManager;
pub use types::{Type, TypeKind, TypeTag};
pub use value::Value;
pub use widgets::{widget_factory, InputContext, Widget, WidgetFactory};
