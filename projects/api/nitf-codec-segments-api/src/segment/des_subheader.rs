//! Data extension segment subheader layout.
//!
//! Security fields (`dssclsy` through `dsctln`) are left to the file layer; this
//! covers the identification fields payload codecs dispatch on, the overflow
//! fields and the user-defined subheader.

use crate::segment::{SegmentKind, Subheader};
use nitf_codec_schema::{FieldDescriptor, RecordResult, RecordSchema, Value};

/// DES identifier of TRE overflow segments.
pub const TRE_OVERFLOW: &str = "TRE_OVERFLOW";

pub fn schema() -> RecordResult<RecordSchema> {
    RecordSchema::builder("DE")
        .field(FieldDescriptor::string("de", 2).description("File Part Type"))
        .field(FieldDescriptor::string("desid", 25).description("Unique DES Type Identifier"))
        .field(FieldDescriptor::integer("dsver", 2).description("Version of the Data Definition"))
        .field(FieldDescriptor::string("dsclas", 1).description("DES Security Classification"))
        .field(
            FieldDescriptor::string("desoflw", 6)
                .description("Overflowed Header Type")
                .condition("f.desid == 'TRE_OVERFLOW'"),
        )
        .field(
            FieldDescriptor::integer("desitem", 3)
                .description("Data Item Overflowed")
                .condition("f.desid == 'TRE_OVERFLOW'"),
        )
        .field(FieldDescriptor::integer("desshl", 4).description("DES User-defined Subheader Length"))
        .field(
            FieldDescriptor::bytes("desshf", "f.desshl")
                .description("DES User-defined Subheader Fields")
                .condition("f.desshl != 0"),
        )
        .build()
}

/// Empty DES subheader with the file part type and classification set.
pub fn default_subheader() -> Subheader {
    let mut subheader = Subheader::new(SegmentKind::Des);
    subheader.set("de", "DE");
    subheader.set("dsclas", "U");
    subheader.set("desshl", Value::Int(0));
    subheader
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[test]
    fn overflow_fields_only_present_for_tre_overflow() {
        let schema = schema().unwrap();

        let mut plain = default_subheader();
        plain.set("desid", "CSATTA DES");
        plain.set("dsver", 1);
        let encoded = schema.codec().encode_to_vec(plain.fields()).unwrap();
        assert_eq!(encoded.len(), 2 + 25 + 2 + 1 + 4);

        let mut overflow = default_subheader();
        overflow.set("desid", TRE_OVERFLOW);
        overflow.set("dsver", 1);
        overflow.set("desoflw", "UDHD");
        overflow.set("desitem", 2);
        let encoded = schema.codec().encode_to_vec(overflow.fields()).unwrap();
        assert_eq!(encoded.len(), 2 + 25 + 2 + 1 + 6 + 3 + 4);

        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.get("desoflw", &[]), Some(&Value::from("UDHD")));
        assert_eq!(decoded.get("desitem", &[]), Some(&Value::Int(2)));
    }

    #[test]
    fn user_subheader_bytes_follow_length() {
        let schema = schema().unwrap();
        let mut subheader = default_subheader();
        subheader.set("desid", "TEST DES");
        subheader.set("dsver", 1);
        subheader.set("desshl", 5);
        subheader.set("desshf", b"ABCDE".to_vec());

        let encoded = schema.codec().encode_to_vec(subheader.fields()).unwrap();
        assert!(encoded.ends_with(b"0005ABCDE"));
        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.get("desshf", &[]), Some(&Value::Bytes(b"ABCDE".to_vec())));
    }
}
