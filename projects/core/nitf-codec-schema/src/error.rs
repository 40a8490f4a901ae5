//! Error types for schema definition, record decoding and record encoding.

use crate::expr::ExpressionError;
use thiserror::Error;

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Encode-time mismatches between in-memory values and what the schema requires.
///
/// Decoding the produced bytes would not reconstruct the record being written,
/// so the write is refused instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// The stored number of loop iterations disagrees with the loop's count expression
    #[error("Loop `{count_expression}` requires {expected} iteration(s), but {stored} are stored")]
    LoopCountMismatch {
        count_expression: String,
        expected: usize,
        stored: usize,
    },

    /// A formatted value does not fit into its declared width
    #[error("Value for field `{field}` needs {actual} bytes, but the field is {width} bytes wide")]
    ValueTooWide {
        field: String,
        width: usize,
        actual: usize,
    },

    /// The stored value kind does not match what the field can encode
    #[error("Field `{field}` expects a {expected} value, but a {found} value is stored")]
    WrongValueKind {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A character cannot be represented in the single-byte field encoding
    #[error("Field `{field}` contains a character outside of ISO-8859-1: {character:?}")]
    UnencodableCharacter { field: String, character: char },
}

/// Errors that can occur while defining, decoding or encoding records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The stream ended before a field's declared width was fully consumed
    #[error("Truncated record: field `{field}` needs {expected} bytes, only {actual} available")]
    TruncatedRecord {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Encode-time schema consistency error
    #[error("Schema consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    /// A condition, count or width expression could not be evaluated
    #[error("Expression error in `{expression}`: {source}")]
    Expression {
        expression: String,
        #[source]
        source: ExpressionError,
    },

    /// Raw field text could not be converted to the field's value kind
    #[error("Invalid value {raw:?} for field `{field}`")]
    InvalidFieldValue { field: String, raw: String },

    /// The schema itself is malformed (bad expression, forward reference, duplicate field, ...)
    #[error("Invalid schema definition for `{tag}`: {message}")]
    Definition { tag: String, message: String },

    /// A field name that the schema does not declare
    #[error("Unknown field `{0}`")]
    UnknownField(String),

    /// A subscript list that does not match the field's loop depth
    #[error("Field `{field}` is nested {depth} loop(s) deep, but {given} index(es) were given")]
    IndexDepthMismatch {
        field: String,
        depth: usize,
        given: usize,
    },

    /// A framed record body was not consumed exactly
    #[error("Record `{tag}` declares {declared} bytes but its schema consumed {consumed}")]
    RecordLengthMismatch {
        tag: String,
        declared: usize,
        consumed: usize,
    },

    /// A framed record header (tag + length) is malformed
    #[error("Invalid record header: {0}")]
    InvalidHeader(String),

    /// An error originating from I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecordError {
    pub(crate) fn expression(expression: &str, source: ExpressionError) -> Self {
        RecordError::Expression {
            expression: expression.into(),
            source,
        }
    }
}
