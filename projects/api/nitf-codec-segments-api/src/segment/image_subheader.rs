//! Image subheader layout (MIL-STD-2500C table A-3).
//!
//! Exercises most of the record engine on a real layout: conditional fields
//! keyed on earlier strings, a band loop whose count switches between two
//! fields, a per-band LUT loop, and byte fields sized by earlier lengths.

use crate::segment::{SegmentKind, Subheader};
use nitf_codec_schema::{FieldDescriptor, LoopDescriptor, RecordResult, RecordSchema, Value};

/// Band counts above this are stored in `xbands` with `nbands` set to 0.
pub const MAX_NBANDS: i64 = 9;

/// Builds the image subheader schema.
pub fn schema() -> RecordResult<RecordSchema> {
    RecordSchema::builder("IM")
        .field(FieldDescriptor::string("im", 2).description("File Part Type"))
        .field(FieldDescriptor::string("iid1", 10).description("Image Identifier 1"))
        .field(FieldDescriptor::string("idatim", 14).description("Image Date and Time"))
        .field(FieldDescriptor::string("tgtid", 17).description("Target Identifier"))
        .field(FieldDescriptor::string("iid2", 80).description("Image Identifier 2"))
        .field(FieldDescriptor::string("isclas", 1).description("Image Security Classification"))
        .field(FieldDescriptor::string("isclsy", 2))
        .field(FieldDescriptor::string("iscode", 11))
        .field(FieldDescriptor::string("isctlh", 2))
        .field(FieldDescriptor::string("isrel", 20))
        .field(FieldDescriptor::string("isdctp", 2))
        .field(FieldDescriptor::string("isdcdt", 8))
        .field(FieldDescriptor::string("isdcxm", 4))
        .field(FieldDescriptor::string("isdg", 1))
        .field(FieldDescriptor::string("isdgdt", 8))
        .field(FieldDescriptor::string("iscltx", 43))
        .field(FieldDescriptor::string("iscatp", 1))
        .field(FieldDescriptor::string("iscaut", 40))
        .field(FieldDescriptor::string("iscrsn", 1))
        .field(FieldDescriptor::string("issrdt", 8))
        .field(FieldDescriptor::string("isctln", 15))
        .field(FieldDescriptor::integer("encryp", 1).description("Encryption"))
        .field(FieldDescriptor::string("isorce", 42).description("Image Source"))
        .field(FieldDescriptor::integer("nrows", 8).description("Number of Significant Rows"))
        .field(FieldDescriptor::integer("ncols", 8).description("Number of Significant Columns"))
        .field(FieldDescriptor::string("pvtype", 3).description("Pixel Value Type"))
        .field(FieldDescriptor::string("irep", 8).description("Image Representation"))
        .field(FieldDescriptor::string("icat", 8).description("Image Category"))
        .field(FieldDescriptor::integer("abpp", 2).description("Actual Bits-Per-Pixel Per Band"))
        .field(FieldDescriptor::string("pjust", 1).description("Pixel Justification"))
        .field(FieldDescriptor::string("icords", 1).description("Image Coordinate Representation"))
        .field(
            FieldDescriptor::string("igeolo", 60)
                .description("Image Geographic Location")
                .condition("f.icords != ''"),
        )
        .field(FieldDescriptor::integer("nicom", 1).description("Number of Image Comments"))
        .repeat(
            LoopDescriptor::new("f.nicom")
                .field(FieldDescriptor::string("icom", 80).description("Image Comments")),
        )
        .field(FieldDescriptor::string("ic", 2).description("Image Compression"))
        .field(
            FieldDescriptor::string("comrat", 4)
                .description("Compression Rate Code")
                .condition("f.ic not in ('NC', 'NM')"),
        )
        .field(FieldDescriptor::integer("nbands", 1).description("Number of Bands"))
        .field(
            FieldDescriptor::integer("xbands", 5)
                .description("Number of Multispectral Bands")
                .condition("f.nbands == 0"),
        )
        .repeat(
            LoopDescriptor::new("f.nbands if f.nbands > 0 else f.xbands")
                .field(FieldDescriptor::string("irepband", 2).description("Band Representation"))
                .field(FieldDescriptor::string("isubcat", 6).description("Band Subcategory"))
                .field(FieldDescriptor::string("ifc", 1).description("Band Filter Condition"))
                .field(FieldDescriptor::string("imflt", 3).description("Band Standard Image Filter Code"))
                .field(FieldDescriptor::integer("nluts", 1).description("Number of LUTs"))
                .field(
                    FieldDescriptor::integer("nelut", 5)
                        .description("Number of LUT Entries")
                        .condition("f.nluts[i1] != 0"),
                )
                .repeat(
                    LoopDescriptor::new("f.nluts[i1]")
                        .field(FieldDescriptor::bytes("lutd", "f.nelut[i1]").description("LUT Data")),
                ),
        )
        .field(FieldDescriptor::integer("isync", 1).description("Image Sync Code"))
        .field(FieldDescriptor::string("imode", 1).description("Image Mode"))
        .field(FieldDescriptor::integer("nbpr", 4).description("Number of Blocks per Row"))
        .field(FieldDescriptor::integer("nbpc", 4).description("Number of Blocks per Column"))
        .field(FieldDescriptor::integer("nppbh", 4).description("Pixels per Block Horizontal"))
        .field(FieldDescriptor::integer("nppbv", 4).description("Pixels per Block Vertical"))
        .field(FieldDescriptor::integer("nbpp", 2).description("Number of Bits per Pixel"))
        .field(FieldDescriptor::integer("idlvl", 3).description("Image Display Level"))
        .field(FieldDescriptor::integer("ialvl", 3).description("Image Attachment Level"))
        .field(FieldDescriptor::string("iloc", 10).description("Image Location"))
        .field(FieldDescriptor::string("imag", 4).description("Image Magnification"))
        .field(FieldDescriptor::integer("udidl", 5).description("User Defined Image Data Length"))
        .field(FieldDescriptor::integer("udofl", 3).condition("f.udidl != 0"))
        // The length includes the 3-byte overflow field read just before
        .field(
            FieldDescriptor::bytes("udid", "f.udidl - 3")
                .description("User Defined Image Data")
                .condition("f.udidl != 0"),
        )
        .field(FieldDescriptor::integer("ixshdl", 5).description("Image Extended Subheader Data Length"))
        .field(FieldDescriptor::integer("ixofl", 3).condition("f.ixshdl != 0"))
        .field(
            FieldDescriptor::bytes("ixshd", "f.ixshdl - 3")
                .description("Image Extended Subheader Data")
                .condition("f.ixshdl != 0"),
        )
        .build()
}

/// Subheader with the fixed and customary default values filled in.
pub fn default_subheader() -> Subheader {
    let mut subheader = Subheader::new(SegmentKind::Image);
    for (name, value) in [
        ("im", Value::from("IM")),
        ("isclas", "U".into()),
        ("encryp", 0.into()),
        ("pvtype", "INT".into()),
        ("irep", "MONO".into()),
        ("icat", "VIS".into()),
        ("abpp", 8.into()),
        ("pjust", "R".into()),
        ("icords", "".into()),
        ("nicom", 0.into()),
        ("ic", "NC".into()),
        ("isync", 0.into()),
        ("imode", "B".into()),
        ("nbpr", 1.into()),
        ("nbpc", 1.into()),
        ("nbpp", 8.into()),
        ("iloc", "0000000000".into()),
        ("imag", "1.0".into()),
        ("udidl", 0.into()),
        ("ixshdl", 0.into()),
    ] {
        subheader.set(name, value);
    }
    set_number_of_bands(&mut subheader, 1);
    subheader
}

/// Band count, whichever of `nbands`/`xbands` holds it.
pub fn number_of_bands(subheader: &Subheader) -> Option<i64> {
    match subheader.get("nbands").and_then(Value::as_int)? {
        0 => subheader.get("xbands").and_then(Value::as_int),
        n => Some(n),
    }
}

/// Stores a band count in `nbands`, or in `xbands` when it needs more than one digit.
///
/// Per-band fields are not touched.
pub fn set_number_of_bands(subheader: &mut Subheader, bands: i64) {
    let fields = subheader.fields_mut();
    if bands <= MAX_NBANDS {
        fields.set("nbands", &[], Some(Value::Int(bands)));
        fields.set("xbands", &[], None);
    } else {
        fields.set("nbands", &[], Some(Value::Int(0)));
        fields.set("xbands", &[], Some(Value::Int(bands)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    fn with_bands(bands: usize) -> DecodedRecord {
        let mut subheader = default_subheader();
        set_number_of_bands(&mut subheader, bands as i64);
        let mut fields = subheader.fields().clone();
        for band in 0..bands {
            fields.set("irepband", &[band], Some("M".into()));
            fields.set("nluts", &[band], Some(Value::Int(0)));
        }
        fields
    }

    #[test]
    fn schema_is_valid() {
        let schema = schema().unwrap();
        assert_eq!(schema.field_depth("lutd"), Some(2));
        assert_eq!(schema.field_depth("igeolo"), Some(0));
    }

    #[test]
    fn minimal_subheader_omits_conditional_fields() {
        let schema = schema().unwrap();
        let encoded = schema.codec().encode_to_vec(&with_bands(1)).unwrap();
        let decoded = schema.codec().decode_slice(&encoded).unwrap();

        assert_eq!(decoded.get("igeolo", &[]), None);
        assert_eq!(decoded.get("comrat", &[]), None);
        assert_eq!(decoded.get("xbands", &[]), None);
        assert_eq!(decoded.get("udid", &[]), None);
        assert_eq!(decoded.get("ic", &[]), Some(&Value::from("NC")));
        assert_eq!(decoded.iteration_count("irepband", &[]), 1);
        assert_eq!(schema.codec().encode_to_vec(&decoded).unwrap(), encoded);
    }

    #[test]
    fn luts_and_compression_round_trip() {
        let schema = schema().unwrap();
        let mut fields = with_bands(3);
        fields.set("ic", &[], Some("C3".into()));
        fields.set("comrat", &[], Some("00.0".into()));
        fields.set("icords", &[], Some("G".into()));
        fields.set("igeolo", &[], Some("0".repeat(60).into()));
        fields.set("nluts", &[1], Some(Value::Int(2)));
        fields.set("nelut", &[1], Some(Value::Int(4)));
        fields.set("lutd", &[1, 0], Some(vec![0u8, 1, 2, 3].into()));
        fields.set("lutd", &[1, 1], Some(vec![255u8, 254, 253, 252].into()));
        fields.set("udidl", &[], Some(Value::Int(7)));
        fields.set("udofl", &[], Some(Value::Int(0)));
        fields.set("udid", &[], Some(b"DATA".to_vec().into()));

        let encoded = schema.codec().encode_to_vec(&fields).unwrap();
        let decoded = schema.codec().decode_slice(&encoded).unwrap();

        assert_eq!(decoded.get("comrat", &[]), Some(&Value::from("00.0")));
        assert_eq!(decoded.iteration_count("lutd", &[0]), 0);
        assert_eq!(decoded.iteration_count("lutd", &[1]), 2);
        assert_eq!(
            decoded.get("lutd", &[1, 1]),
            Some(&Value::Bytes(vec![255, 254, 253, 252]))
        );
        assert_eq!(decoded.get("udid", &[]), Some(&Value::Bytes(b"DATA".to_vec())));
        assert_eq!(schema.codec().encode_to_vec(&decoded).unwrap(), encoded);
    }

    #[test]
    fn many_bands_use_xbands() {
        let schema = schema().unwrap();
        let fields = with_bands(12);
        assert_eq!(fields.get("nbands", &[]), Some(&Value::Int(0)));

        let encoded = schema.codec().encode_to_vec(&fields).unwrap();
        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.get("xbands", &[]), Some(&Value::Int(12)));
        assert_eq!(decoded.iteration_count("irepband", &[]), 12);
        assert_eq!(
            number_of_bands(&Subheader::from_fields(SegmentKind::Image, decoded)),
            Some(12)
        );
    }

    #[rstest]
    #[case(1, 1, None)]
    #[case(9, 9, None)]
    #[case(10, 0, Some(10))]
    fn band_count_placement(#[case] bands: i64, #[case] nbands: i64, #[case] xbands: Option<i64>) {
        let mut subheader = default_subheader();
        set_number_of_bands(&mut subheader, bands);
        assert_eq!(subheader.get("nbands"), Some(&Value::Int(nbands)));
        assert_eq!(subheader.get("xbands").and_then(Value::as_int), xbands);
        assert_eq!(number_of_bands(&subheader), Some(bands));
    }
}
