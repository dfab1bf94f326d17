//! The adapter registry: which widget and which converter a type gets.
//!
//! Lookups happen once, when a [`Field`](crate::items::Field) is built. The
//! default widget is keyed by [`TypeTag`]; the converter is keyed by the
//! type's tag together with the [`ConverterKind`] of the widget actually
//! chosen, so a `Date` edited through a text box gets an ISO-string
//! converter and one edited through date parts gets a tuple converter.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use formal_core::{FormalError, FormalResult};

use crate::converters::{
    BooleanToStringConverter, Converter, DateToDateTupleConverter, DateToStringConverter,
    FloatToStringConverter, IntegerToStringConverter, NullConverter, SequenceConverter,
    TimeToStringConverter,
};
use crate::types::{Type, TypeTag};
use crate::widgets::{
    widget_factory, Checkbox, DatePartsInput, FileUpload, TextInput, WidgetFactory,
};

/// The shape of the transport value a widget produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    /// A single string.
    String,
    /// A `[year, month, day]` list.
    DateTuple,
    /// A list of strings.
    Sequence,
    /// An uploaded file.
    File,
}

/// Maps types to default widgets and (type, widget kind) pairs to converters.
pub struct AdapterRegistry {
    widgets: HashMap<TypeTag, WidgetFactory>,
    converters: HashMap<(TypeTag, ConverterKind), Arc<dyn Converter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("widgets", &self.widgets.keys().collect::<Vec<_>>())
            .field("converters", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            widgets: HashMap::new(),
            converters: HashMap::new(),
        }
    }

    /// Creates a registry holding the standard adapters.
    ///
    /// | Type | Default widget | Converters |
    /// |---|---|---|
    /// | String | `TextInput` | string: pass-through |
    /// | Integer, Float, Time | `TextInput` | string |
    /// | Boolean | `Checkbox` | string (`True`/`False`) |
    /// | Date | `DatePartsInput` | string (ISO), date tuple |
    /// | Sequence | none | sequence: element-wise |
    /// | File | `FileUpload` | file: pass-through |
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register_widget(TypeTag::String, widget_factory(|_| TextInput));
        registry.register_widget(TypeTag::Integer, widget_factory(|_| TextInput));
        registry.register_widget(TypeTag::Float, widget_factory(|_| TextInput));
        registry.register_widget(TypeTag::Time, widget_factory(|_| TextInput));
        registry.register_widget(TypeTag::Boolean, widget_factory(|_| Checkbox));
        registry.register_widget(TypeTag::Date, widget_factory(|_| DatePartsInput::default()));
        registry.register_widget(TypeTag::File, widget_factory(|_| FileUpload));

        registry.register_converter(TypeTag::String, ConverterKind::String, NullConverter);
        registry.register_converter(TypeTag::Integer, ConverterKind::String, IntegerToStringConverter);
        registry.register_converter(TypeTag::Float, ConverterKind::String, FloatToStringConverter);
        registry.register_converter(TypeTag::Boolean, ConverterKind::String, BooleanToStringConverter);
        registry.register_converter(TypeTag::Date, ConverterKind::String, DateToStringConverter);
        registry.register_converter(TypeTag::Time, ConverterKind::String, TimeToStringConverter);
        registry.register_converter(TypeTag::Date, ConverterKind::DateTuple, DateToDateTupleConverter);
        registry.register_converter(TypeTag::File, ConverterKind::File, NullConverter);

        registry
    }

    /// Returns the process-wide standard registry.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<AdapterRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::with_defaults)
    }

    /// Sets the default widget for a type tag.
    pub fn register_widget(&mut self, tag: TypeTag, factory: WidgetFactory) {
        self.widgets.insert(tag, factory);
    }

    /// Sets the converter for a type tag edited through widgets of `kind`.
    pub fn register_converter(
        &mut self,
        tag: TypeTag,
        kind: ConverterKind,
        converter: impl Converter + 'static,
    ) {
        self.converters.insert((tag, kind), Arc::new(converter));
    }

    /// Returns the default widget factory for `ty`.
    pub fn widget_for(&self, ty: &Type) -> FormalResult<WidgetFactory> {
        self.widgets.get(&ty.tag()).cloned().ok_or_else(|| {
            FormalError::NotAdmissible(format!("no default widget for type {}", ty.tag()))
        })
    }

    /// Returns the converter for `ty` edited through a widget of `kind`.
    ///
    /// Sequences edited as lists get an element-wise converter built from
    /// the element type's string converter.
    pub fn converter_for(&self, ty: &Type, kind: ConverterKind) -> FormalResult<Arc<dyn Converter>> {
        if let Some(converter) = self.converters.get(&(ty.tag(), kind)) {
            return Ok(Arc::clone(converter));
        }
        if let (Some(element), ConverterKind::Sequence) = (ty.element(), kind) {
            let element = self.converter_for(element, ConverterKind::String)?;
            return Ok(Arc::new(SequenceConverter::new(element)));
        }
        Err(FormalError::NotAdmissible(format!(
            "no converter for type {} with a {kind:?} widget",
            ty.tag()
        )))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
