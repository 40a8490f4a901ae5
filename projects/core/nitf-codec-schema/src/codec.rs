//! Schema-driven decoding and encoding of record bodies.
//!
//! Decode and encode walk the schema in the same order and evaluate the same
//! expressions against the same [`DecodedRecord`], so a record that encodes
//! successfully decodes back to identical values.

use crate::descriptor::ValueKind;
use crate::error::{ConsistencyError, RecordError, RecordResult};
use crate::expr::{Environment, Expression, ExpressionError};
use crate::format::{default_float, default_integer};
use crate::record::DecodedRecord;
use crate::schema::{FieldNode, FieldWidth, LoopNode, Node, RecordSchema};
use crate::transform::Scope;
use crate::value::{is_blank, latin1_to_string, string_to_latin1, Value};
use log::trace;
use std::io::{Cursor, Read, Write};

/// Decodes and encodes records of one [`RecordSchema`].
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec<'s> {
    schema: &'s RecordSchema,
}

/// Expression view of a record at one loop position.
struct RecordEnv<'a> {
    record: &'a DecodedRecord,
    indices: &'a [usize],
}

impl Environment for RecordEnv<'_> {
    fn field(&self, name: &str, indices: &[usize]) -> Result<Option<&Value>, ExpressionError> {
        self.record.lookup(name, indices)
    }

    fn loop_index(&self, level: usize) -> Option<usize> {
        level
            .checked_sub(1)
            .and_then(|level| self.indices.get(level).copied())
    }
}

fn evaluate_bool(
    expression: &Expression,
    record: &DecodedRecord,
    indices: &[usize],
) -> RecordResult<bool> {
    expression
        .evaluate_bool(&RecordEnv { record, indices })
        .map_err(|e| RecordError::expression(expression.source(), e))
}

fn evaluate_count(
    expression: &Expression,
    record: &DecodedRecord,
    indices: &[usize],
) -> RecordResult<usize> {
    expression
        .evaluate_count(&RecordEnv { record, indices })
        .map_err(|e| RecordError::expression(expression.source(), e))
}

impl<'s> RecordCodec<'s> {
    pub fn new(schema: &'s RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'s RecordSchema {
        self.schema
    }

    /// Decodes one record from the current position of `reader`.
    ///
    /// Reads exactly the bytes the schema describes and nothing more.
    ///
    /// # Errors
    ///
    /// - [`RecordError::TruncatedRecord`] if the stream ends inside a field
    /// - [`RecordError::Expression`] if a condition, count or width cannot be evaluated
    /// - [`RecordError::InvalidFieldValue`] if a numeric field holds non-numeric text
    pub fn decode<R: Read>(&self, reader: &mut R) -> RecordResult<DecodedRecord> {
        let mut record = DecodedRecord::new();
        let mut indices = Vec::new();
        self.decode_nodes(self.schema.nodes(), reader, &mut record, &mut indices)?;
        Ok(record)
    }

    /// Decodes a record that must occupy all of `data`.
    pub fn decode_slice(&self, data: &[u8]) -> RecordResult<DecodedRecord> {
        let mut cursor = Cursor::new(data);
        let record = self.decode(&mut cursor)?;
        let consumed = cursor.position() as usize;
        if consumed != data.len() {
            return Err(RecordError::RecordLengthMismatch {
                tag: self.schema.tag().into(),
                declared: data.len(),
                consumed,
            });
        }
        Ok(record)
    }

    /// Encodes `record` to `writer`, returning the number of bytes written.
    ///
    /// Fields whose condition is false are skipped without padding. Values are
    /// checked against the schema before anything is written for them.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Consistency`] if stored loop lengths or value widths disagree with the schema
    /// - [`RecordError::Expression`] if a condition, count or width cannot be evaluated
    pub fn encode<W: Write>(&self, record: &DecodedRecord, writer: &mut W) -> RecordResult<usize> {
        let mut indices = Vec::new();
        self.encode_nodes(self.schema.nodes(), record, writer, &mut indices)
    }

    pub fn encode_to_vec(&self, record: &DecodedRecord) -> RecordResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(record, &mut out)?;
        Ok(out)
    }

    fn decode_nodes<R: Read>(
        &self,
        nodes: &[Node],
        reader: &mut R,
        record: &mut DecodedRecord,
        indices: &mut Vec<usize>,
    ) -> RecordResult<()> {
        for node in nodes {
            match node {
                Node::Field(index) => {
                    let field = self.schema.field_node(*index);
                    let value = self.decode_field(field, reader, record, indices)?;
                    record.set(field.descriptor.name(), indices, value);
                }
                Node::Loop(body) => {
                    for &index in &body.fields {
                        let name = self.schema.field_node(index).descriptor.name();
                        record.ensure_repeated(name, indices);
                    }
                    let count = self.loop_count(body, record, indices)?;
                    trace!("{}: loop `{}` x{count}", self.schema.tag(), body.count.source());
                    for i in 0..count {
                        indices.push(i);
                        self.decode_nodes(&body.children, reader, record, indices)?;
                        indices.pop();
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_field<R: Read>(
        &self,
        field: &FieldNode,
        reader: &mut R,
        record: &DecodedRecord,
        indices: &[usize],
    ) -> RecordResult<Option<Value>> {
        let name = field.descriptor.name();
        if !self.is_present(field, record, indices)? {
            trace!("{}: {name}{indices:?} excluded", self.schema.tag());
            return Ok(None);
        }

        let width = self.field_width(field, record, indices)?;
        let mut raw = Vec::with_capacity(width.min(64 * 1024));
        reader.by_ref().take(width as u64).read_to_end(&mut raw)?;
        if raw.len() < width {
            return Err(RecordError::TruncatedRecord {
                field: name.into(),
                expected: width,
                actual: raw.len(),
            });
        }

        let value = match &field.descriptor.kind {
            ValueKind::Bytes => Some(Value::Bytes(raw)),
            ValueKind::String => {
                let text = latin1_to_string(&raw);
                let text = text.trim_end_matches(' ');
                if text.is_empty() && field.descriptor.is_optional() {
                    None
                } else {
                    Some(Value::Str(text.into()))
                }
            }
            ValueKind::Integer if is_blank(&raw) => None,
            ValueKind::Integer => {
                let text = latin1_to_string(&raw);
                let parsed = text.trim().parse().map_err(|_| invalid(name, &text))?;
                Some(Value::Int(parsed))
            }
            ValueKind::Float if is_blank(&raw) => None,
            ValueKind::Float => {
                let text = latin1_to_string(&raw);
                let parsed = text.trim().parse().map_err(|_| invalid(name, &text))?;
                Some(Value::Float(parsed))
            }
            ValueKind::Custom(transform) => {
                let scope = Scope::new(name, self.schema, record, indices);
                transform.decode(&latin1_to_string(&raw), &scope)?
            }
        };

        trace!("{}: {name}{indices:?} = {value:?}", self.schema.tag());
        Ok(value)
    }

    fn encode_nodes<W: Write>(
        &self,
        nodes: &[Node],
        record: &DecodedRecord,
        writer: &mut W,
        indices: &mut Vec<usize>,
    ) -> RecordResult<usize> {
        let mut written = 0;
        for node in nodes {
            match node {
                Node::Field(index) => {
                    let field = self.schema.field_node(*index);
                    if !self.is_present(field, record, indices)? {
                        continue;
                    }
                    let bytes = self.encode_field(field, record, indices)?;
                    writer.write_all(&bytes)?;
                    written += bytes.len();
                }
                Node::Loop(body) => {
                    let expected = self.loop_count(body, record, indices)?;
                    let stored = body
                        .fields
                        .iter()
                        .map(|&index| {
                            let name = self.schema.field_node(index).descriptor.name();
                            record.iteration_count(name, indices)
                        })
                        .max()
                        .unwrap_or(0);
                    if stored != expected {
                        return Err(ConsistencyError::LoopCountMismatch {
                            count_expression: body.count.source().into(),
                            expected,
                            stored,
                        }
                        .into());
                    }
                    for i in 0..expected {
                        indices.push(i);
                        written += self.encode_nodes(&body.children, record, writer, indices)?;
                        indices.pop();
                    }
                }
            }
        }
        Ok(written)
    }

    /// Produces exactly `width` bytes for a present field.
    fn encode_field(
        &self,
        field: &FieldNode,
        record: &DecodedRecord,
        indices: &[usize],
    ) -> RecordResult<Vec<u8>> {
        let name = field.descriptor.name();
        let width = self.field_width(field, record, indices)?;
        let Some(value) = record.get(name, indices) else {
            return Ok(vec![b' '; width]);
        };

        let wrong_kind = || ConsistencyError::WrongValueKind {
            field: name.into(),
            expected: field.descriptor.kind.name(),
            found: value.kind_name(),
        };

        let (mut bytes, left_justify) = match (&field.descriptor.kind, value) {
            (ValueKind::Bytes, Value::Bytes(bytes)) => (bytes.clone(), true),
            (ValueKind::String, Value::Str(text)) => (latin1(name, text)?, true),
            (ValueKind::Integer, Value::Int(i)) => {
                let text = match &field.format {
                    Some(format) => format.apply(value).ok_or_else(wrong_kind)?,
                    None => default_integer(*i, width),
                };
                (latin1(name, &text)?, false)
            }
            (ValueKind::Float, Value::Int(_) | Value::Float(_)) => {
                let text = match &field.format {
                    Some(format) => format.apply(value).ok_or_else(wrong_kind)?,
                    None => value
                        .as_float()
                        .and_then(|v| default_float(v, width))
                        .ok_or_else(|| too_wide(name, width, value.to_string().len()))?,
                };
                (latin1(name, &text)?, false)
            }
            (ValueKind::Custom(transform), value) => {
                let scope = Scope::new(name, self.schema, record, indices);
                let text = transform.encode(value, width, &scope)?;
                (latin1(name, &text)?, false)
            }
            _ => return Err(wrong_kind().into()),
        };

        if bytes.len() > width {
            return Err(too_wide(name, width, bytes.len()).into());
        }
        if left_justify {
            bytes.resize(width, b' ');
            return Ok(bytes);
        }
        let mut padded = vec![b' '; width - bytes.len()];
        padded.append(&mut bytes);
        Ok(padded)
    }

    fn is_present(
        &self,
        field: &FieldNode,
        record: &DecodedRecord,
        indices: &[usize],
    ) -> RecordResult<bool> {
        match &field.condition {
            Some(condition) => evaluate_bool(condition, record, indices),
            None => Ok(true),
        }
    }

    fn field_width(
        &self,
        field: &FieldNode,
        record: &DecodedRecord,
        indices: &[usize],
    ) -> RecordResult<usize> {
        match &field.width {
            FieldWidth::Fixed(width) => Ok(*width),
            FieldWidth::Computed(expression) => evaluate_count(expression, record, indices),
        }
    }

    fn loop_count(
        &self,
        body: &LoopNode,
        record: &DecodedRecord,
        indices: &[usize],
    ) -> RecordResult<usize> {
        if let Some(condition) = &body.condition {
            if !evaluate_bool(condition, record, indices)? {
                return Ok(0);
            }
        }
        evaluate_count(&body.count, record, indices)
    }
}

fn invalid(field: &str, raw: &str) -> RecordError {
    RecordError::InvalidFieldValue {
        field: field.into(),
        raw: raw.into(),
    }
}

fn too_wide(field: &str, width: usize, actual: usize) -> ConsistencyError {
    ConsistencyError::ValueTooWide {
        field: field.into(),
        width,
        actual,
    }
}

fn latin1(field: &str, text: &str) -> Result<Vec<u8>, ConsistencyError> {
    string_to_latin1(text).map_err(|character| ConsistencyError::UnencodableCharacter {
        field: field.into(),
        character,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    fn flag_schema() -> RecordSchema {
        RecordSchema::builder("FLAGS")
            .field(FieldDescriptor::string("flag", 1))
            .field(FieldDescriptor::integer("value", 4).condition("f.flag == 'Y'"))
            .field(FieldDescriptor::string("tail", 3))
            .build()
            .unwrap()
    }

    #[test]
    fn excluded_field_consumes_no_bytes() {
        let schema = flag_schema();
        let record = schema.codec().decode_slice(b"NEND").unwrap();
        assert_eq!(record.get("value", &[]), None);
        assert_eq!(record.slot("value", &[]), Some(&Slot::Scalar(None)));
        assert_eq!(record.get("tail", &[]), Some(&Value::from("END")));
    }

    #[test]
    fn flipping_condition_inserts_only_the_dependent_bytes() {
        let schema = flag_schema();
        let mut record = schema.codec().decode_slice(b"NEND").unwrap();
        record.set("flag", &[], Some("Y".into()));
        record.set("value", &[], Some(Value::Int(42)));

        let encoded = schema.codec().encode_to_vec(&record).unwrap();
        assert_eq!(encoded, b"Y0042END");
        assert_eq!(schema.codec().decode_slice(&encoded).unwrap(), record);
    }

    #[test]
    fn blank_values_decode_to_none() {
        let schema = RecordSchema::builder("BLANK")
            .field(FieldDescriptor::integer("i", 3))
            .field(FieldDescriptor::float("x", 4))
            .field(FieldDescriptor::string("s", 2))
            .field(FieldDescriptor::string("o", 2).optional())
            .build()
            .unwrap();
        let record = schema.codec().decode_slice(&[b' '; 11]).unwrap();

        assert_eq!(record.get("i", &[]), None);
        assert_eq!(record.get("x", &[]), None);
        assert_eq!(record.get("s", &[]), Some(&Value::from("")));
        assert_eq!(record.get("o", &[]), None);
        assert_eq!(schema.codec().encode_to_vec(&record).unwrap(), [b' '; 11]);
    }

    #[test]
    fn zero_is_distinct_from_blank() {
        let schema = RecordSchema::builder("ZERO")
            .field(FieldDescriptor::integer("i", 3))
            .build()
            .unwrap();
        let record = schema.codec().decode_slice(b"000").unwrap();
        assert_eq!(record.get("i", &[]), Some(&Value::Int(0)));
    }

    #[test]
    fn truncated_stream_is_reported() {
        let schema = flag_schema();
        let result = schema.codec().decode_slice(b"Y004");
        assert!(matches!(
            result,
            Err(RecordError::TruncatedRecord { ref field, expected: 4, actual: 3 }) if field == "value"
        ));
    }

    #[test]
    fn non_numeric_text_is_invalid() {
        let schema = RecordSchema::builder("NUM")
            .field(FieldDescriptor::integer("i", 3))
            .build()
            .unwrap();
        assert!(matches!(
            schema.codec().decode_slice(b"1X3"),
            Err(RecordError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn jagged_loop_round_trips() {
        let schema = RecordSchema::builder("JAG")
            .field(FieldDescriptor::integer("rows", 1))
            .repeat(
                LoopDescriptor::new("f.rows")
                    .field(FieldDescriptor::integer("cols", 1))
                    .repeat(
                        LoopDescriptor::new("f.cols[i1]")
                            .field(FieldDescriptor::integer("cell", 2)),
                    ),
            )
            .build()
            .unwrap();

        // rows=3 | cols=1 10 | cols=0 | cols=2 20 21
        let data = b"3110022021";
        let record = schema.codec().decode_slice(data).unwrap();

        assert_eq!(record.iteration_count("cell", &[0]), 1);
        assert_eq!(record.iteration_count("cell", &[1]), 0);
        assert_eq!(record.iteration_count("cell", &[2]), 2);
        assert_eq!(record.get("cell", &[2, 1]), Some(&Value::Int(21)));
        assert_eq!(schema.codec().encode_to_vec(&record).unwrap(), data);
    }

    #[test]
    fn mismatched_loop_count_fails_to_encode() {
        let schema = RecordSchema::builder("CNT")
            .field(FieldDescriptor::integer("n", 1))
            .repeat(LoopDescriptor::new("f.n").field(FieldDescriptor::string("s", 1)))
            .build()
            .unwrap();
        let mut record = schema.codec().decode_slice(b"2AB").unwrap();
        record.set("s", &[2], Some("C".into()));

        let error = schema.codec().encode_to_vec(&record).unwrap_err();
        assert!(matches!(
            error,
            RecordError::Consistency(ConsistencyError::LoopCountMismatch {
                expected: 2,
                stored: 3,
                ..
            })
        ));
    }

    #[test]
    fn string_too_wide_fails_to_encode() {
        let schema = flag_schema();
        let mut record = schema.codec().decode_slice(b"NEND").unwrap();
        record.set("tail", &[], Some("ENDS".into()));
        assert!(matches!(
            schema.codec().encode_to_vec(&record),
            Err(RecordError::Consistency(ConsistencyError::ValueTooWide {
                width: 3,
                actual: 4,
                ..
            }))
        ));
    }

    #[test]
    fn wrong_value_kind_fails_to_encode() {
        let schema = flag_schema();
        let mut record = schema.codec().decode_slice(b"NEND").unwrap();
        record.set("tail", &[], Some(Value::Int(1)));
        assert!(matches!(
            schema.codec().encode_to_vec(&record),
            Err(RecordError::Consistency(ConsistencyError::WrongValueKind { .. }))
        ));
    }

    #[test]
    fn width_from_earlier_field() {
        let schema = RecordSchema::builder("LEN")
            .field(FieldDescriptor::integer("len", 2))
            .field(FieldDescriptor::bytes("data", "f.len"))
            .build()
            .unwrap();
        let record = schema.codec().decode_slice(b"03\x00\x01\x02").unwrap();
        assert_eq!(record.get("data", &[]), Some(&Value::Bytes(vec![0, 1, 2])));
    }

    #[test]
    fn loop_condition_skips_count() {
        let schema = RecordSchema::builder("COND")
            .field(FieldDescriptor::string("has", 1))
            .field(FieldDescriptor::integer("n", 1).condition("f.has == 'Y'"))
            .repeat(
                LoopDescriptor::new("f.n")
                    .condition("f.has == 'Y'")
                    .field(FieldDescriptor::string("s", 1)),
            )
            .build()
            .unwrap();
        let record = schema.codec().decode_slice(b"N").unwrap();
        assert_eq!(record.iteration_count("s", &[]), 0);
        assert_eq!(schema.codec().encode_to_vec(&record).unwrap(), b"N");
    }

    #[test]
    fn formatted_floats_round_trip() {
        let schema = RecordSchema::builder("FMT")
            .field(FieldDescriptor::float("x", 21).format("%+21.14E"))
            .build()
            .unwrap();
        let mut record = DecodedRecord::new();
        record.set("x", &[], Some(Value::Float(-1234.5)));

        let encoded = schema.codec().encode_to_vec(&record).unwrap();
        assert_eq!(encoded, b"-1.23450000000000E+03");
        assert_eq!(schema.codec().decode_slice(&encoded).unwrap(), record);
    }

    #[test]
    fn encoding_is_deterministic() {
        let schema = flag_schema();
        let record = schema.codec().decode_slice(b"Y0042END").unwrap();
        let first = schema.codec().encode_to_vec(&record).unwrap();
        let second = schema.codec().encode_to_vec(&record).unwrap();
        assert_eq!(first, second);
    }
}
