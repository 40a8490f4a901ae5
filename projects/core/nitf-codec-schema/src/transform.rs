//! Custom conversions between raw field text and values.

use crate::error::{RecordError, RecordResult};
use crate::record::DecodedRecord;
use crate::schema::RecordSchema;
use crate::value::Value;
use core::fmt::Debug;

/// Converts a field's raw text to a value and back.
///
/// Used for fields whose on-disk form is not a plain string or number, such as
/// fixed-point integers scaled by parameters stored earlier in the record.
/// Implementations must be inverses of each other for every value they accept.
pub trait ValueTransform: Debug + Send + Sync {
    /// Converts `raw` (exactly the field's width) to a value.
    /// Returning `Ok(None)` means "no value".
    fn decode(&self, raw: &str, scope: &Scope<'_>) -> RecordResult<Option<Value>>;

    /// Converts `value` to text of at most `width` characters.
    /// Shorter results are right-justified with spaces.
    fn encode(&self, value: &Value, width: usize, scope: &Scope<'_>) -> RecordResult<String>;
}

/// What a [`ValueTransform`] can see while converting one field.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    field: &'a str,
    schema: &'a RecordSchema,
    record: &'a DecodedRecord,
    indices: &'a [usize],
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        field: &'a str,
        schema: &'a RecordSchema,
        record: &'a DecodedRecord,
        indices: &'a [usize],
    ) -> Self {
        Self {
            field,
            schema,
            record,
            indices,
        }
    }

    /// Name of the field being converted.
    pub fn field_name(&self) -> &'a str {
        self.field
    }

    /// Zero-based positions of the enclosing loops, outermost first.
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    /// Value of another field at the current loop position.
    ///
    /// The field's own loop depth decides how many of the current indices are
    /// used, so a top-level parameter can be read from inside any loop.
    pub fn value(&self, name: &str) -> RecordResult<Option<&'a Value>> {
        let depth = self
            .schema
            .field_depth(name)
            .ok_or_else(|| RecordError::UnknownField(name.into()))?;
        let indices = self
            .indices
            .get(..depth)
            .ok_or_else(|| RecordError::IndexDepthMismatch {
                field: name.into(),
                depth,
                given: self.indices.len(),
            })?;
        Ok(self.record.get(name, indices))
    }

    /// Integer value of another field, failing if it is unset or not an integer.
    pub fn integer(&self, name: &str) -> RecordResult<i64> {
        match self.value(name)? {
            Some(Value::Int(i)) => Ok(*i),
            other => Err(RecordError::InvalidFieldValue {
                field: name.into(),
                raw: other.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }

    /// Numeric value of another field, failing if it is unset or not a number.
    pub fn number(&self, name: &str) -> RecordResult<f64> {
        match self.value(name)? {
            Some(value) => value.as_float().ok_or_else(|| RecordError::InvalidFieldValue {
                field: name.into(),
                raw: value.to_string(),
            }),
            None => Err(RecordError::InvalidFieldValue {
                field: name.into(),
                raw: String::new(),
            }),
        }
    }
}
