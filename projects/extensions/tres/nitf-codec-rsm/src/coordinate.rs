//! Fixed-point image coordinates.

use nitf_codec_schema::{RecordError, RecordResult, Scope, Value, ValueTransform};

/// Image coordinate stored as a scaled integer.
///
/// On disk the field holds `round((value - offset) * 10^digits)`, where
/// `digits` and `offset` are earlier fields of the same record. A blank field
/// decodes to no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledCoordinate {
    digits_field: &'static str,
    offset_field: &'static str,
}

impl ScaledCoordinate {
    /// # Parameters
    ///
    /// - `digits_field`: Integer field holding the number of fractional digits
    /// - `offset_field`: Numeric field holding the reference coordinate
    pub const fn new(digits_field: &'static str, offset_field: &'static str) -> Self {
        Self {
            digits_field,
            offset_field,
        }
    }

    /// Grid point row coordinate of `RSMGGA`.
    pub const fn row() -> Self {
        Self::new("fnumrd", "refrow")
    }

    /// Grid point column coordinate of `RSMGGA`.
    pub const fn column() -> Self {
        Self::new("fnumcd", "refcol")
    }

    fn parameters(&self, scope: &Scope<'_>) -> RecordResult<(f64, f64)> {
        let digits = scope.integer(self.digits_field)?;
        let digits = i32::try_from(digits).map_err(|_| RecordError::InvalidFieldValue {
            field: self.digits_field.into(),
            raw: digits.to_string(),
        })?;
        Ok((10f64.powi(digits), scope.number(self.offset_field)?))
    }
}

impl ValueTransform for ScaledCoordinate {
    fn decode(&self, raw: &str, scope: &Scope<'_>) -> RecordResult<Option<Value>> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let scaled: i64 = text.parse().map_err(|_| RecordError::InvalidFieldValue {
            field: scope.field_name().into(),
            raw: raw.into(),
        })?;
        let (scale, offset) = self.parameters(scope)?;
        Ok(Some(Value::Float(scaled as f64 / scale + offset)))
    }

    fn encode(&self, value: &Value, width: usize, scope: &Scope<'_>) -> RecordResult<String> {
        let coordinate = value.as_float().ok_or_else(|| RecordError::InvalidFieldValue {
            field: scope.field_name().into(),
            raw: value.to_string(),
        })?;
        let (scale, offset) = self.parameters(scope)?;
        let scaled = ((coordinate - offset) * scale).round() as i64;
        Ok(format!("{scaled:0width$}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    fn schema() -> RecordSchema {
        RecordSchema::builder("COORDS")
            .field(FieldDescriptor::integer("refrow", 4))
            .field(FieldDescriptor::integer("fnumrd", 1))
            .field(FieldDescriptor::custom(
                "rcoord",
                6,
                Arc::new(ScaledCoordinate::row()),
            ))
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::positive(b"10002000150", Some(1001.5))]
    #[case::negative(b"10002-00150", Some(998.5))]
    #[case::zero_digits(b"10000000007", Some(1007.0))]
    #[case::blank(b"10002      ", None)]
    fn decodes_relative_to_reference(#[case] data: &[u8], #[case] expected: Option<f64>) {
        let record = schema().codec().decode_slice(data).unwrap();
        assert_eq!(
            record.get("rcoord", &[]).and_then(Value::as_float),
            expected
        );
    }

    #[rstest]
    #[case(b"10002000150")]
    #[case(b"10002-00150")]
    #[case(b"10002      ")]
    fn encodes_back_to_the_same_text(#[case] data: &[u8]) {
        let schema = schema();
        let record = schema.codec().decode_slice(data).unwrap();
        assert_eq!(schema.codec().encode_to_vec(&record).unwrap(), data);
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(matches!(
            schema().codec().decode_slice(b"10002 12x45"),
            Err(RecordError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn encode_rounds_to_the_available_digits() {
        let schema = schema();
        let mut record = DecodedRecord::new();
        record.set("refrow", &[], Some(Value::Int(100)));
        record.set("fnumrd", &[], Some(Value::Int(1)));
        record.set("rcoord", &[], Some(Value::Float(100.26)));
        assert_eq!(schema.codec().encode_to_vec(&record).unwrap(), b"01001000003");
    }
}
