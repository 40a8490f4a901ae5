//! Tagged Record Extensions: tag registry, framing and typed record access.
//!
//! On disk a TRE is a 6 character tag, a 5 digit body length and the body:
//!
//! ```text
//! RSMGGA01234<1234 bytes of body>
//! ```
//!
//! Bodies of registered tags are decoded through their [`RecordSchema`]; any
//! other tag is kept verbatim as an [`UnknownTre`] so files round trip even
//! when a record is not understood.

use crate::error::{ConsistencyError, RecordError, RecordResult};
use crate::record::DecodedRecord;
use crate::schema::RecordSchema;
use crate::value::{latin1_to_string, string_to_latin1, Value};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

/// Width of the tag field.
pub const TAG_LENGTH: usize = 6;
/// Width of the decimal body length field.
pub const LENGTH_DIGITS: usize = 5;
/// Largest body a TRE can declare.
pub const MAX_BODY_LENGTH: usize = 99_999;

/// Maps TRE tags to their schemas.
///
/// Built by the application during startup and shared by reference afterwards.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    schemas: HashMap<String, Arc<RecordSchema>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its tag, replacing any earlier schema for that tag.
    ///
    /// # Errors
    ///
    /// [`RecordError::Definition`] if the tag is longer than [`TAG_LENGTH`] or not ASCII.
    pub fn register(&mut self, schema: RecordSchema) -> RecordResult<Arc<RecordSchema>> {
        let tag = schema.tag();
        if tag.len() > TAG_LENGTH || !tag.is_ascii() {
            return Err(RecordError::Definition {
                tag: tag.into(),
                message: format!("TRE tags are at most {TAG_LENGTH} ASCII characters"),
            });
        }
        let schema = Arc::new(schema);
        if self
            .schemas
            .insert(schema.tag().into(), Arc::clone(&schema))
            .is_some()
        {
            debug!("Replaced schema for TRE {}", schema.tag());
        }
        Ok(schema)
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<RecordSchema>> {
        self.schemas.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.schemas.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// A decoded TRE: its schema together with its field values.
#[derive(Debug, Clone)]
pub struct TreRecord {
    schema: Arc<RecordSchema>,
    values: DecodedRecord,
}

impl PartialEq for TreRecord {
    fn eq(&self, other: &Self) -> bool {
        self.schema.tag() == other.schema.tag() && self.values == other.values
    }
}

impl TreRecord {
    /// An empty record. Every field must be set before it can be encoded.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        Self {
            schema,
            values: DecodedRecord::new(),
        }
    }

    pub fn from_values(schema: Arc<RecordSchema>, values: DecodedRecord) -> Self {
        Self { schema, values }
    }

    pub fn tag(&self) -> &str {
        self.schema.tag()
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn values(&self) -> &DecodedRecord {
        &self.values
    }

    pub fn into_values(self) -> DecodedRecord {
        self.values
    }

    fn check(&self, name: &str, indices: &[usize], exact: bool) -> RecordResult<()> {
        let depth = self
            .schema
            .field_depth(name)
            .ok_or_else(|| RecordError::UnknownField(name.into()))?;
        let ok = if exact {
            indices.len() == depth
        } else {
            indices.len() < depth
        };
        if !ok {
            return Err(RecordError::IndexDepthMismatch {
                field: name.into(),
                depth,
                given: indices.len(),
            });
        }
        Ok(())
    }

    /// Value of `name` at `indices`. `Ok(None)` is "no value".
    pub fn get(&self, name: &str, indices: &[usize]) -> RecordResult<Option<&Value>> {
        self.check(name, indices, true)?;
        Ok(self.values.get(name, indices))
    }

    pub fn set(&mut self, name: &str, indices: &[usize], value: impl Into<Value>) -> RecordResult<()> {
        self.check(name, indices, true)?;
        self.values.set(name, indices, Some(value.into()));
        Ok(())
    }

    /// Sets the field to "no value".
    pub fn clear(&mut self, name: &str, indices: &[usize]) -> RecordResult<()> {
        self.check(name, indices, true)?;
        self.values.set(name, indices, None);
        Ok(())
    }

    /// Number of stored iterations of the loop level directly below `prefix`.
    pub fn iteration_count(&self, name: &str, prefix: &[usize]) -> RecordResult<usize> {
        self.check(name, prefix, false)?;
        Ok(self.values.iteration_count(name, prefix))
    }

    /// Drops stored iterations of `name` beyond `len` at `prefix`.
    pub fn truncate(&mut self, name: &str, prefix: &[usize], len: usize) -> RecordResult<()> {
        self.check(name, prefix, false)?;
        self.values.truncate(name, prefix, len);
        Ok(())
    }

    /// Decodes a body that must occupy all of `data`.
    pub fn decode(schema: Arc<RecordSchema>, data: &[u8]) -> RecordResult<Self> {
        let values = schema.codec().decode_slice(data)?;
        Ok(Self { schema, values })
    }

    /// Encodes the body (without tag and length).
    pub fn encode_body(&self) -> RecordResult<Vec<u8>> {
        self.schema.codec().encode_to_vec(&self.values)
    }
}

/// A TRE whose tag has no registered schema. The body is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTre {
    pub tag: String,
    pub data: Vec<u8>,
}

/// A TRE read from a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Tre {
    Known(TreRecord),
    Unknown(UnknownTre),
}

impl Tre {
    pub fn tag(&self) -> &str {
        match self {
            Tre::Known(record) => record.tag(),
            Tre::Unknown(unknown) => &unknown.tag,
        }
    }

    /// Encoded body, without tag and length.
    pub fn body(&self) -> RecordResult<Vec<u8>> {
        match self {
            Tre::Known(record) => record.encode_body(),
            Tre::Unknown(unknown) => Ok(unknown.data.clone()),
        }
    }
}

/// Reads `len` bytes, reporting a short stream as a truncated `field`.
fn read_exactly<R: Read>(reader: &mut R, len: usize, field: &str) -> RecordResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len);
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(RecordError::TruncatedRecord {
            field: field.into(),
            expected: len,
            actual: buf.len(),
        });
    }
    Ok(buf)
}

/// Reads one framed TRE.
///
/// # Errors
///
/// - [`RecordError::InvalidHeader`] if the length is not a 5 digit number
/// - [`RecordError::TruncatedRecord`] if the header or body is cut short
/// - [`RecordError::RecordLengthMismatch`] if a known body is not consumed exactly
pub fn read_tre<R: Read>(reader: &mut R, registry: &TagRegistry) -> RecordResult<Tre> {
    let tag = read_exactly(reader, TAG_LENGTH, "CETAG")?;
    let tag = latin1_to_string(&tag).trim_end_matches(' ').to_string();

    let length = read_exactly(reader, LENGTH_DIGITS, "CEL")?;
    if !length.iter().all(u8::is_ascii_digit) {
        return Err(RecordError::InvalidHeader(format!(
            "length of TRE {tag:?} is not numeric: {:?}",
            latin1_to_string(&length)
        )));
    }
    let length = latin1_to_string(&length)
        .parse::<usize>()
        .map_err(|e| RecordError::InvalidHeader(e.to_string()))?;

    let body = read_exactly(reader, length, &tag)?;
    match registry.get(&tag) {
        Some(schema) => {
            let mut cursor = Cursor::new(body.as_slice());
            let values = schema.codec().decode(&mut cursor)?;
            let consumed = cursor.position() as usize;
            if consumed != length {
                return Err(RecordError::RecordLengthMismatch {
                    tag,
                    declared: length,
                    consumed,
                });
            }
            debug!("Decoded TRE {tag} ({length} bytes)");
            Ok(Tre::Known(TreRecord::from_values(Arc::clone(schema), values)))
        }
        None => {
            warn!("No schema registered for TRE {tag}, keeping {length} bytes verbatim");
            Ok(Tre::Unknown(UnknownTre { tag, data: body }))
        }
    }
}

/// Writes one framed TRE, returning the number of bytes written.
///
/// The tag is written as ISO-8859-1, like every other text field, and the
/// body is fully encoded before anything is written.
pub fn write_tre<W: Write + ?Sized>(tre: &Tre, writer: &mut W) -> RecordResult<usize> {
    let mut tag = string_to_latin1(tre.tag()).map_err(|character| {
        ConsistencyError::UnencodableCharacter {
            field: "CETAG".into(),
            character,
        }
    })?;
    if tag.len() > TAG_LENGTH {
        return Err(ConsistencyError::ValueTooWide {
            field: "CETAG".into(),
            width: TAG_LENGTH,
            actual: tag.len(),
        }
        .into());
    }
    tag.resize(TAG_LENGTH, b' ');
    let body = tre.body()?;
    if body.len() > MAX_BODY_LENGTH {
        return Err(ConsistencyError::ValueTooWide {
            field: "CEL".into(),
            width: LENGTH_DIGITS,
            actual: body.len().to_string().len(),
        }
        .into());
    }

    writer.write_all(&tag)?;
    write!(writer, "{:0width$}", body.len(), width = LENGTH_DIGITS)?;
    writer.write_all(&body)?;
    Ok(TAG_LENGTH + LENGTH_DIGITS + body.len())
}

/// Reads consecutive TREs until `data` is exhausted.
pub fn read_tre_list(data: &[u8], registry: &TagRegistry) -> RecordResult<Vec<Tre>> {
    let mut cursor = Cursor::new(data);
    let mut tres = Vec::new();
    while (cursor.position() as usize) < data.len() {
        tres.push(read_tre(&mut cursor, registry)?);
    }
    Ok(tres)
}

/// Writes TREs back to back, returning the total number of bytes written.
pub fn write_tre_list<W: Write + ?Sized>(tres: &[Tre], writer: &mut W) -> RecordResult<usize> {
    let mut written = 0;
    for tre in tres {
        written += write_tre(tre, writer)?;
    }
    Ok(written)
}
