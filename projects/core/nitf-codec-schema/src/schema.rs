//! Immutable, validated record schemas.

use crate::codec::RecordCodec;
use crate::descriptor::{Descriptor, FieldDescriptor, LoopDescriptor, Width};
use crate::error::{RecordError, RecordResult};
use crate::expr::Expression;
use crate::format::NumericFormat;
use std::collections::HashMap;

/// An ordered, validated sequence of field and loop descriptors identified by a tag.
///
/// Built once with [`RecordSchema::builder`] and shared (usually behind an
/// [`Arc`](std::sync::Arc)) by every decode and encode of that tag. All
/// expressions are compiled during [`RecordSchemaBuilder::build`], which also
/// rejects forward references, subscript counts that do not match a field's
/// loop depth and loop indices that do not name an enclosing loop.
///
/// # Example
///
/// ```
/// use nitf_codec_schema::{FieldDescriptor, LoopDescriptor, RecordSchema};
///
/// let schema = RecordSchema::builder("DEMO")
///     .field(FieldDescriptor::integer("count", 2))
///     .repeat(LoopDescriptor::new("f.count").field(FieldDescriptor::string("name", 4)))
///     .build()
///     .unwrap();
///
/// let record = schema.codec().decode_slice(b"02ABCDEFGH").unwrap();
/// assert_eq!(record.get("name", &[1]).unwrap().as_str(), Some("EFGH"));
/// ```
#[derive(Debug)]
pub struct RecordSchema {
    tag: String,
    nodes: Vec<Node>,
    fields: Vec<FieldNode>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) enum Node {
    /// Index into [`RecordSchema::fields`]
    Field(usize),
    Loop(LoopNode),
}

#[derive(Debug)]
pub(crate) struct FieldNode {
    pub descriptor: FieldDescriptor,
    /// Number of enclosing loops
    pub depth: usize,
    pub width: FieldWidth,
    pub condition: Option<Expression>,
    pub format: Option<NumericFormat>,
}

#[derive(Debug)]
pub(crate) enum FieldWidth {
    Fixed(usize),
    Computed(Expression),
}

#[derive(Debug)]
pub(crate) struct LoopNode {
    pub count: Expression,
    pub condition: Option<Expression>,
    pub children: Vec<Node>,
    /// Every field declared inside this loop, at any depth
    pub fields: Vec<usize>,
}

impl RecordSchema {
    pub fn builder(tag: &str) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            tag: tag.into(),
            descriptors: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Field descriptors in traversal order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(|f| &f.descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i].descriptor)
    }

    /// Number of loops enclosing the field, i.e. how many indices address it.
    pub fn field_depth(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).map(|&i| self.fields[i].depth)
    }

    pub fn codec(&self) -> RecordCodec<'_> {
        RecordCodec::new(self)
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn field_node(&self, index: usize) -> &FieldNode {
        &self.fields[index]
    }
}

/// Collects descriptors for a [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    tag: String,
    descriptors: Vec<Descriptor>,
}

impl RecordSchemaBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.descriptors.push(Descriptor::Field(field));
        self
    }

    pub fn repeat(mut self, body: LoopDescriptor) -> Self {
        self.descriptors.push(Descriptor::Loop(body));
        self
    }

    /// Compiles and validates all descriptors.
    ///
    /// # Errors
    ///
    /// [`RecordError::Definition`] for an empty tag, a duplicate field name,
    /// a zero fixed width, an empty loop, a format on a non-numeric field, an
    /// expression that does not parse or references something out of scope.
    pub fn build(self) -> RecordResult<RecordSchema> {
        if self.tag.trim().is_empty() {
            return Err(RecordError::Definition {
                tag: self.tag,
                message: "tag must not be empty".into(),
            });
        }

        let mut compiler = Compiler {
            tag: &self.tag,
            fields: Vec::new(),
            by_name: HashMap::new(),
        };
        let nodes = compiler.compile(self.descriptors, 0)?;
        let Compiler {
            fields, by_name, ..
        } = compiler;

        Ok(RecordSchema {
            tag: self.tag,
            nodes,
            fields,
            by_name,
        })
    }
}

struct Compiler<'t> {
    tag: &'t str,
    fields: Vec<FieldNode>,
    by_name: HashMap<String, usize>,
}

impl Compiler<'_> {
    fn definition(&self, message: String) -> RecordError {
        RecordError::Definition {
            tag: self.tag.into(),
            message,
        }
    }

    fn compile(&mut self, descriptors: Vec<Descriptor>, depth: usize) -> RecordResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            nodes.push(match descriptor {
                Descriptor::Field(field) => self.compile_field(field, depth)?,
                Descriptor::Loop(body) => self.compile_loop(body, depth)?,
            });
        }
        Ok(nodes)
    }

    fn compile_field(&mut self, descriptor: FieldDescriptor, depth: usize) -> RecordResult<Node> {
        let name = descriptor.name.clone();
        if name.is_empty() {
            return Err(self.definition("field name must not be empty".into()));
        }
        if self.by_name.contains_key(&name) {
            return Err(self.definition(format!("field `{name}` is declared twice")));
        }

        let condition = descriptor
            .condition
            .as_deref()
            .map(|source| self.expression(source, depth))
            .transpose()?;

        let width = match &descriptor.width {
            Width::Fixed(0) => {
                return Err(self.definition(format!("field `{name}` has a zero width")))
            }
            Width::Fixed(width) => FieldWidth::Fixed(*width),
            Width::Computed(source) => FieldWidth::Computed(self.expression(source, depth)?),
        };

        let format = match descriptor.format.as_deref() {
            None => None,
            Some(_) if !descriptor.kind.is_numeric() => {
                return Err(self.definition(format!(
                    "field `{name}` is a {} field and cannot take a numeric format",
                    descriptor.kind.name()
                )))
            }
            Some(source) => Some(
                NumericFormat::parse(source)
                    .map_err(|message| self.definition(format!("field `{name}`: {message}")))?,
            ),
        };

        let index = self.fields.len();
        self.fields.push(FieldNode {
            descriptor,
            depth,
            width,
            condition,
            format,
        });
        self.by_name.insert(name, index);
        Ok(Node::Field(index))
    }

    fn compile_loop(&mut self, body: LoopDescriptor, depth: usize) -> RecordResult<Node> {
        if body.children.is_empty() {
            return Err(self.definition(format!("loop `{}` has no fields", body.count)));
        }
        let condition = body
            .condition
            .as_deref()
            .map(|source| self.expression(source, depth))
            .transpose()?;
        let count = self.expression(&body.count, depth)?;

        let first = self.fields.len();
        let children = self.compile(body.children, depth + 1)?;
        let fields = (first..self.fields.len()).collect();

        Ok(Node::Loop(LoopNode {
            count,
            condition,
            children,
            fields,
        }))
    }

    /// Compiles an expression that appears inside `depth` enclosing loops.
    fn expression(&self, source: &str, depth: usize) -> RecordResult<Expression> {
        let expression = Expression::parse(source)
            .map_err(|e| self.definition(format!("expression `{source}`: {e}")))?;

        for reference in expression.field_references() {
            let Some(&index) = self.by_name.get(reference.name) else {
                return Err(self.definition(format!(
                    "expression `{source}` references `{}` before it is declared",
                    reference.name
                )));
            };
            let field_depth = self.fields[index].depth;
            if reference.subscripts != field_depth {
                return Err(self.definition(format!(
                    "expression `{source}` uses {} subscript(s) on `{}`, which is {field_depth} loop(s) deep",
                    reference.subscripts, reference.name
                )));
            }
        }

        let level = expression.max_loop_level();
        if level > depth {
            return Err(self.definition(format!(
                "expression `{source}` uses `i{level}` but only {depth} loop(s) enclose it"
            )));
        }

        Ok(expression)
    }
}
