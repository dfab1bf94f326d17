//! Form items: fields and groups.
//!
//! A [`Field`] pairs a name with a [`Type`], a widget and a converter. A
//! [`Group`] namespaces the items it holds. Neither keeps a reference to its
//! parent: an item records the path of group names above it when it is
//! added, and its key is that path joined with dots.

use std::fmt;
use std::sync::Arc;

use formal_core::utils::text::{title_from_name, valid_identifier};
use formal_core::{FormalError, FormalResult};

use crate::adapters::AdapterRegistry;
use crate::converters::Converter;
use crate::types::Type;
use crate::widgets::{Widget, WidgetFactory};

fn check_name(name: &str) -> FormalResult<()> {
    if valid_identifier(name) {
        Ok(())
    } else {
        Err(FormalError::InvalidIdentifier(name.to_string()))
    }
}

fn join_key(path: &[String], name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{name}", path.join("."))
    }
}

/// A named, typed form field.
///
/// # Examples
///
/// ```
/// use formal_forms::items::Field;
/// use formal_forms::types::Type;
///
/// let field = Field::new("first_name", Type::string().required(true))
///     .unwrap()
///     .with_description("As on your passport");
/// assert_eq!(field.key(), "first_name");
/// assert_eq!(field.label(), "First Name");
///
/// assert!(Field::new("2nd", Type::string()).is_err());
/// ```
#[derive(Clone)]
pub struct Field {
    name: String,
    path: Vec<String>,
    ty: Type,
    widget_factory: WidgetFactory,
    widget: Arc<dyn Widget>,
    converter: Arc<dyn Converter>,
    label: String,
    description: Option<String>,
    css_class: Option<String>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key())
            .field("type", &self.ty.name())
            .field("widget", &self.widget)
            .field("converter", &self.converter)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Field {
    /// Creates a field with the default widget for its type.
    pub fn new(name: impl Into<String>, ty: Type) -> FormalResult<Self> {
        Self::build(name.into(), ty, None, AdapterRegistry::standard())
    }

    /// Creates a field with an explicit widget factory.
    pub fn with_widget(
        name: impl Into<String>,
        ty: Type,
        widget_factory: WidgetFactory,
    ) -> FormalResult<Self> {
        Self::build(name.into(), ty, Some(widget_factory), AdapterRegistry::standard())
    }

    /// Creates a field resolving its adapters through `registry`.
    pub fn with_registry(
        name: impl Into<String>,
        ty: Type,
        widget_factory: Option<WidgetFactory>,
        registry: &AdapterRegistry,
    ) -> FormalResult<Self> {
        Self::build(name.into(), ty, widget_factory, registry)
    }

    fn build(
        name: String,
        ty: Type,
        widget_factory: Option<WidgetFactory>,
        registry: &AdapterRegistry,
    ) -> FormalResult<Self> {
        check_name(&name)?;
        let widget_factory = match widget_factory {
            Some(factory) => factory,
            None => registry.widget_for(&ty)?,
        };
        let widget = widget_factory(&ty);
        let converter = registry.converter_for(&ty, widget.converter_kind())?;
        let label = title_from_name(&name);
        Ok(Self {
            name,
            path: Vec::new(),
            ty,
            widget_factory,
            widget,
            converter,
            label,
            description: None,
            css_class: None,
        })
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an extra CSS class for the renderer.
    #[must_use]
    pub fn with_css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = Some(css_class.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted path from the form root to this field.
    pub fn key(&self) -> String {
        join_key(&self.path, &self.name)
    }

    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn css_class(&self) -> Option<&str> {
        self.css_class.as_deref()
    }

    /// The widget built when the field was created.
    pub fn widget(&self) -> &Arc<dyn Widget> {
        &self.widget
    }

    /// Builds a fresh widget from the field's factory.
    pub fn make_widget(&self) -> Arc<dyn Widget> {
        (self.widget_factory)(&self.ty)
    }

    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    fn set_path(&mut self, path: Vec<String>) {
        self.path = path;
    }
}

/// A named container of items.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    path: Vec<String>,
    label: String,
    description: Option<String>,
    items: Vec<Item>,
}

impl Group {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> FormalResult<Self> {
        let name = name.into();
        check_name(&name)?;
        let label = title_from_name(&name);
        Ok(Self {
            name,
            path: Vec::new(),
            label,
            description: None,
            items: Vec::new(),
        })
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an item, recording this group's path on it.
    pub fn add(&mut self, item: impl Into<Item>) -> FormalResult<()> {
        let mut item = item.into();
        if self.items.iter().any(|i| i.name() == item.name()) {
            return Err(FormalError::DuplicateItem(join_key(&self.child_path(), item.name())));
        }
        item.set_path(self.child_path());
        self.items.push(item);
        Ok(())
    }

    /// Adds an item, builder style.
    pub fn with(mut self, item: impl Into<Item>) -> FormalResult<Self> {
        self.add(item)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted path from the form root to this group.
    pub fn key(&self) -> String {
        join_key(&self.path, &self.name)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the direct child named `name`.
    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name() == name)
    }

    fn child_path(&self) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(self.name.clone());
        path
    }

    fn set_path(&mut self, path: Vec<String>) {
        self.path = path;
        let child_path = self.child_path();
        for item in &mut self.items {
            item.set_path(child_path.clone());
        }
    }
}

/// A field or a group.
#[derive(Debug, Clone)]
pub enum Item {
    Field(Field),
    Group(Group),
}

impl Item {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => f.name(),
            Self::Group(g) => g.name(),
        }
    }

    pub fn key(&self) -> String {
        match self {
            Self::Field(f) => f.key(),
            Self::Group(g) => g.key(),
        }
    }

    /// Appends every field at or below this item, in declaration order.
    pub fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Field>) {
        match self {
            Self::Field(f) => out.push(f),
            Self::Group(g) => {
                for item in &g.items {
                    item.collect_fields(out);
                }
            }
        }
    }

    /// Records the path of the parent this item is attached to.
    pub(crate) fn set_path(&mut self, path: Vec<String>) {
        match self {
            Self::Field(f) => f.set_path(path),
            Self::Group(g) => g.set_path(path),
        }
    }
}

impl From<Field> for Item {
    fn from(f: Field) -> Self {
        Self::Field(f)
    }
}

impl From<Group> for Item {
    fn from(g: Group) -> Self {
        Self::Group(g)
    }
}
