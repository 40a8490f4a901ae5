//! Declarative building blocks of a [`RecordSchema`].
//!
//! Descriptors only hold the source text of their expressions. They are
//! validated and compiled by [`RecordSchemaBuilder::build`].
//!
//! [`RecordSchema`]: crate::schema::RecordSchema
//! [`RecordSchemaBuilder::build`]: crate::schema::RecordSchemaBuilder::build

use crate::transform::ValueTransform;
use std::sync::Arc;

/// Width of a field in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Width {
    /// A constant width.
    Fixed(usize),
    /// A count expression evaluated when the field is reached, e.g. `f.nelut[i1]`.
    Computed(String),
}

impl From<usize> for Width {
    fn from(value: usize) -> Self {
        Width::Fixed(value)
    }
}

impl From<&str> for Width {
    fn from(value: &str) -> Self {
        Width::Computed(value.into())
    }
}

/// How raw field text converts to a [`Value`](crate::Value).
#[derive(Debug, Clone)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    /// Raw bytes, kept verbatim
    Bytes,
    Custom(Arc<dyn ValueTransform>),
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Bytes => "bytes",
            ValueKind::Custom(_) => "custom",
        }
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}

/// One fixed-width field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) width: Width,
    pub(crate) kind: ValueKind,
    pub(crate) optional: bool,
    pub(crate) condition: Option<String>,
    pub(crate) format: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, width: impl Into<Width>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            width: width.into(),
            kind,
            optional: false,
            condition: None,
            format: None,
        }
    }

    pub fn string(name: &str, width: impl Into<Width>) -> Self {
        Self::new(name, width, ValueKind::String)
    }

    pub fn integer(name: &str, width: impl Into<Width>) -> Self {
        Self::new(name, width, ValueKind::Integer)
    }

    pub fn float(name: &str, width: impl Into<Width>) -> Self {
        Self::new(name, width, ValueKind::Float)
    }

    pub fn bytes(name: &str, width: impl Into<Width>) -> Self {
        Self::new(name, width, ValueKind::Bytes)
    }

    pub fn custom(name: &str, width: impl Into<Width>, transform: Arc<dyn ValueTransform>) -> Self {
        Self::new(name, width, ValueKind::Custom(transform))
    }

    /// Human readable description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    /// A blank string field decodes to "no value" instead of an empty string.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The field is only present when `expression` is true.
    pub fn condition(mut self, expression: &str) -> Self {
        self.condition = Some(expression.into());
        self
    }

    /// printf-style format for numeric fields, e.g. `%+21.14E`.
    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn width(&self) -> &Width {
        &self.width
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn condition_source(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn format_source(&self) -> Option<&str> {
        self.format.as_deref()
    }
}

/// A block of descriptors repeated `count` times.
#[derive(Debug, Clone)]
pub struct LoopDescriptor {
    pub(crate) count: String,
    pub(crate) condition: Option<String>,
    pub(crate) children: Vec<Descriptor>,
}

impl LoopDescriptor {
    /// `count` is evaluated once each time the loop is entered.
    pub fn new(count: &str) -> Self {
        Self {
            count: count.into(),
            condition: None,
            children: Vec::new(),
        }
    }

    /// The loop has zero iterations (and its count is not evaluated) unless `expression` is true.
    pub fn condition(mut self, expression: &str) -> Self {
        self.condition = Some(expression.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.children.push(Descriptor::Field(field));
        self
    }

    pub fn repeat(mut self, nested: LoopDescriptor) -> Self {
        self.children.push(Descriptor::Loop(nested));
        self
    }

    pub fn count_source(&self) -> &str {
        &self.count
    }
}

/// A schema node.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Field(FieldDescriptor),
    Loop(LoopDescriptor),
}
