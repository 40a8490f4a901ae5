//! `RSMECB`: Replacement Sensor Model error covariance.
//!
//! Two independent blocks follow the identification fields. The indirect
//! error covariance block is present when `inclic` is `Y` and the unmodeled
//! error covariance block when `incluc` is `Y`. Every loop inside a block is
//! gated by the same flags as the fields holding its count.

use nitf_codec_schema::{FieldDescriptor, LoopDescriptor, RecordResult, RecordSchema};

pub const TAG: &str = "RSMECB";

const COVARIANCE_FORMAT: &str = "%21.14E";

const INDIRECT: &str = "f.inclic == 'Y'";
const LOCAL_FRAME: &str = "f.inclic == 'Y' and f.loctyp == 'R'";
const IMAGE_SPACE: &str = "f.inclic == 'Y' and f.aptyp == 'I'";
const GROUND_SPACE: &str = "f.inclic == 'Y' and f.aptyp == 'G'";
const BASIS: &str = "f.inclic == 'Y' and f.apbase == 'Y'";
const SEGMENTED: &str = "f.acsmc[i1] == 'N'";
const CSM_CORRELATION: &str = "f.inclic == 'Y' and f.acsmc[i1] == 'Y'";
const UNMODELED: &str = "f.incluc == 'Y'";
const UNMODELED_SEGMENTED: &str = "f.incluc == 'Y' and f.uacsmc == 'N'";
const UNMODELED_CSM: &str = "f.incluc == 'Y' and f.uacsmc == 'Y'";

fn covariance(name: &str, description: &str) -> FieldDescriptor {
    FieldDescriptor::float(name, 21)
        .description(description)
        .format(COVARIANCE_FORMAT)
}

pub fn schema() -> RecordResult<RecordSchema> {
    let mut builder = RecordSchema::builder(TAG)
        .field(
            FieldDescriptor::string("iid", 80)
                .description("Image Identifier")
                .optional(),
        )
        .field(FieldDescriptor::string("edition", 40).description("RSM Image Support Data Edition"))
        .field(
            FieldDescriptor::string("tid", 40)
                .description("Triangulation ID")
                .optional(),
        )
        .field(FieldDescriptor::string("inclic", 1).description("Include Indirect Error Covariance Flag"))
        .field(FieldDescriptor::string("incluc", 1).description("Include Unmodeled Error Covariance Flag"))
        .field(
            FieldDescriptor::integer("nparo", 2)
                .description("Number of Original Adjustable Parameters")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::integer("ign", 2)
                .description("Number of Independent Subgroups")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::string("cvdate", 8)
                .description("Version Date of the Original Image Error Covariance")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::integer("npar", 2)
                .description("Number of Active RSM Adjustable Parameters")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::string("aptyp", 1)
                .description("Adjustable Parameter Type")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::string("loctyp", 1)
                .description("Local Coordinate System Identifier")
                .condition(INDIRECT),
        );

    for (name, description) in [
        ("nsfx", "Normalization Scale Factor for X"),
        ("nsfy", "Normalization Scale Factor for Y"),
        ("nsfz", "Normalization Scale Factor for Z"),
        ("noffx", "Normalization Offset for X"),
        ("noffy", "Normalization Offset for Y"),
        ("noffz", "Normalization Offset for Z"),
    ] {
        builder = builder.field(covariance(name, description).condition(INDIRECT));
    }

    for (name, description) in [
        ("xuol", "Local Coordinate Origin (XUOL)"),
        ("yuol", "Local Coordinate Origin (YUOL)"),
        ("zuol", "Local Coordinate Origin (ZUOL)"),
        ("xuxl", "Local Coordinate Unit Vector (XUXL)"),
        ("xuyl", "Local Coordinate Unit Vector (XUYL)"),
        ("xuzl", "Local Coordinate Unit Vector (XUZL)"),
        ("yuxl", "Local Coordinate Unit Vector (YUXL)"),
        ("yuyl", "Local Coordinate Unit Vector (YUYL)"),
        ("yuzl", "Local Coordinate Unit Vector (YUZL)"),
        ("zuxl", "Local Coordinate Unit Vector (ZUXL)"),
        ("zuyl", "Local Coordinate Unit Vector (ZUYL)"),
        ("zuzl", "Local Coordinate Unit Vector (ZUZL)"),
    ] {
        builder = builder.field(covariance(name, description).condition(LOCAL_FRAME));
    }

    builder = builder
        .field(
            FieldDescriptor::string("apbase", 1)
                .description("Basis Option")
                .condition(INDIRECT),
        )
        .field(
            FieldDescriptor::integer("nisap", 2)
                .description("Number of Image-Space Adjustable Parameters")
                .condition(IMAGE_SPACE),
        )
        .field(
            FieldDescriptor::integer("nisapr", 2)
                .description("Number of Image-Space Adjustable Parameters for Image Row Coordinate")
                .condition(IMAGE_SPACE),
        )
        .repeat(
            LoopDescriptor::new("f.nisapr")
                .condition(IMAGE_SPACE)
                .field(FieldDescriptor::integer("xpwrr", 1).description("Row Parameter Power of X"))
                .field(FieldDescriptor::integer("ypwrr", 1).description("Row Parameter Power of Y"))
                .field(FieldDescriptor::integer("zpwrr", 1).description("Row Parameter Power of Z")),
        )
        .field(
            FieldDescriptor::integer("nisapc", 2)
                .description("Number of Image-Space Adjustable Parameters for Image Column Coordinate")
                .condition(IMAGE_SPACE),
        )
        .repeat(
            LoopDescriptor::new("f.nisapc")
                .condition(IMAGE_SPACE)
                .field(FieldDescriptor::integer("xpwrc", 1).description("Column Parameter Power of X"))
                .field(FieldDescriptor::integer("ypwrc", 1).description("Column Parameter Power of Y"))
                .field(FieldDescriptor::integer("zpwrc", 1).description("Column Parameter Power of Z")),
        )
        .field(
            FieldDescriptor::integer("ngsap", 2)
                .description("Number of Ground-Space Adjustable Parameters")
                .condition(GROUND_SPACE),
        )
        .repeat(
            LoopDescriptor::new("f.ngsap")
                .condition(GROUND_SPACE)
                .field(FieldDescriptor::string("gsapid", 4).description("Ground-space Adjustable Parameter ID")),
        )
        .field(
            FieldDescriptor::integer("nbasis", 2)
                .description("Number of Basis Adjustable Parameters")
                .condition(BASIS),
        )
        .repeat(
            LoopDescriptor::new("f.npar").condition(BASIS).repeat(
                LoopDescriptor::new("f.nbasis")
                    .field(covariance("ael", "Matrix A Element, Row order")),
            ),
        )
        .repeat(
            LoopDescriptor::new("f.ign")
                .condition(INDIRECT)
                .field(
                    FieldDescriptor::integer("numopg", 2)
                        .description("Number of Original Adjustable Parameters in Subgroup"),
                )
                // Upper triangle of the subgroup's covariance matrix.
                .repeat(
                    LoopDescriptor::new("(f.numopg[i1] + 1) * f.numopg[i1] // 2")
                        .field(covariance("errcvg", "Original Error Covariance Element")),
                )
                .field(FieldDescriptor::integer("tcdf", 1).description("Time Correlation Domain Flag"))
                .field(FieldDescriptor::string("acsmc", 1).description("CSM Correlation Option"))
                .field(
                    FieldDescriptor::integer("ncseg", 1)
                        .description("Number of Correlation Segments")
                        .condition(SEGMENTED),
                )
                .repeat(
                    LoopDescriptor::new("f.ncseg[i1]")
                        .condition(SEGMENTED)
                        .field(covariance("corseg", "Segment Correlation Value"))
                        .field(covariance("tauseg", "Segment Tau Value")),
                )
                .field(covariance("ac", "CSM correlation function A parameter").condition(CSM_CORRELATION))
                .field(covariance("alpc", "CSM correlation function alpha parameter").condition(CSM_CORRELATION))
                .field(covariance("betc", "CSM correlation function beta parameter").condition(CSM_CORRELATION))
                .field(covariance("tc", "CSM correlation function T parameter").condition(CSM_CORRELATION)),
        )
        .repeat(
            LoopDescriptor::new("f.npar").condition(INDIRECT).repeat(
                LoopDescriptor::new("f.nparo").field(covariance("map", "Mapping Matrix Element")),
            ),
        )
        .field(covariance("urr", "Unmodeled Row Variance").condition(UNMODELED))
        .field(covariance("urc", "Unmodeled Row-Col Covariance").condition(UNMODELED))
        .field(covariance("ucc", "Unmodeled Col Variance").condition(UNMODELED))
        .field(
            FieldDescriptor::string("uacsmc", 1)
                .description("Unmodeled CSM Correlation Option")
                .condition(UNMODELED),
        )
        .field(
            FieldDescriptor::integer("uncsr", 1)
                .description("Number of Correlation Segments for independent variable ROW distance")
                .condition(UNMODELED_SEGMENTED),
        )
        .repeat(
            LoopDescriptor::new("f.uncsr")
                .condition(UNMODELED_SEGMENTED)
                .field(covariance("ucorsr", "Segment Correlation Value"))
                .field(covariance("utausr", "Segment Tau Value")),
        )
        .field(
            FieldDescriptor::integer("uncsc", 1)
                .description("Number of Correlation Segments for independent variable Column distance")
                .condition(UNMODELED_SEGMENTED),
        )
        .repeat(
            LoopDescriptor::new("f.uncsc")
                .condition(UNMODELED_SEGMENTED)
                .field(covariance("ucorsc", "Segment Correlation Value"))
                .field(covariance("utausc", "Segment Tau Value")),
        );

    for (name, description) in [
        ("uacr", "CSM correlation function A parameter"),
        ("ualpcr", "CSM correlation function alpha parameter"),
        ("ubetcr", "CSM correlation function beta parameter"),
        ("utcr", "CSM correlation function t parameter"),
        ("uacc", "CSM correlation function A parameter"),
        ("ualpcc", "CSM correlation function alpha parameter"),
        ("ubetcc", "CSM correlation function beta parameter"),
        ("utcc", "CSM correlation function t parameter"),
    ] {
        builder = builder.field(covariance(name, description).condition(UNMODELED_CSM));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    const IDENTIFICATION: usize = 80 + 40 + 40 + 1 + 1;

    fn identification(inclic: &str, incluc: &str) -> DecodedRecord {
        let mut record = DecodedRecord::new();
        record.set("edition", &[], Some(Value::from("ED-1")));
        record.set("inclic", &[], Some(Value::from(inclic)));
        record.set("incluc", &[], Some(Value::from(incluc)));
        record
    }

    /// Image-space parameters, one segmented subgroup and CSM unmodeled correlation.
    fn full_record() -> DecodedRecord {
        let mut record = identification("Y", "Y");
        for (name, value) in [("nparo", 2), ("ign", 1), ("npar", 1), ("nisap", 2)] {
            record.set(name, &[], Some(Value::Int(value)));
        }
        record.set("cvdate", &[], Some(Value::from("20240101")));
        record.set("aptyp", &[], Some(Value::from("I")));
        record.set("loctyp", &[], Some(Value::from("N")));
        record.set("apbase", &[], Some(Value::from("N")));
        for name in ["nsfx", "nsfy", "nsfz", "noffx", "noffy", "noffz"] {
            record.set(name, &[], Some(Value::Float(1.0)));
        }
        record.set("nisapr", &[], Some(Value::Int(1)));
        record.set("nisapc", &[], Some(Value::Int(1)));
        for name in ["xpwrr", "ypwrr", "zpwrr", "xpwrc", "ypwrc", "zpwrc"] {
            record.set(name, &[0], Some(Value::Int(1)));
        }

        record.set("numopg", &[0], Some(Value::Int(2)));
        for element in 0..3 {
            record.set("errcvg", &[0, element], Some(Value::Float(element as f64)));
        }
        record.set("tcdf", &[0], Some(Value::Int(0)));
        record.set("acsmc", &[0], Some(Value::from("N")));
        record.set("ncseg", &[0], Some(Value::Int(1)));
        record.set("corseg", &[0, 0], Some(Value::Float(0.25)));
        record.set("tauseg", &[0, 0], Some(Value::Float(4.0)));
        record.set("map", &[0, 0], Some(Value::Float(1.0)));
        record.set("map", &[0, 1], Some(Value::Float(-1.0)));

        for name in ["urr", "urc", "ucc"] {
            record.set(name, &[], Some(Value::Float(0.5)));
        }
        record.set("uacsmc", &[], Some(Value::from("Y")));
        for name in ["uacr", "ualpcr", "ubetcr", "utcr", "uacc", "ualpcc", "ubetcc", "utcc"] {
            record.set(name, &[], Some(Value::Float(2.0)));
        }
        record
    }

    #[test]
    fn flags_off_leave_only_identification() {
        let schema = schema().unwrap();
        let encoded = schema
            .codec()
            .encode_to_vec(&identification("N", "N"))
            .unwrap();
        assert_eq!(encoded.len(), IDENTIFICATION);

        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.get("tid", &[]), None);
        assert_eq!(decoded.get("nparo", &[]), None);
        assert_eq!(decoded.iteration_count("numopg", &[]), 0);
    }

    #[test]
    fn full_record_layout() {
        let schema = schema().unwrap();
        let encoded = schema.codec().encode_to_vec(&full_record()).unwrap();

        let indirect = 16 + 6 * 21 + 1 + 2 + 2 + 3 + 2 + 3;
        let subgroup = 2 + 3 * 21 + 1 + 1 + 1 + 2 * 21;
        let mapping = 2 * 21;
        let unmodeled = 3 * 21 + 1 + 8 * 21;
        assert_eq!(
            encoded.len(),
            IDENTIFICATION + indirect + subgroup + mapping + unmodeled
        );

        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.get("cvdate", &[]), Some(&Value::from("20240101")));
        assert_eq!(decoded.get("xuol", &[]), None);
        assert_eq!(decoded.get("errcvg", &[0, 2]), Some(&Value::Float(2.0)));
        assert_eq!(decoded.get("map", &[0, 1]), Some(&Value::Float(-1.0)));
        assert_eq!(decoded.iteration_count("gsapid", &[]), 0);
        assert_eq!(schema.codec().encode_to_vec(&decoded).unwrap(), encoded);
    }

    #[rstest]
    #[case::one_parameter(1, 1)]
    #[case::two_parameters(2, 3)]
    #[case::four_parameters(4, 10)]
    fn covariance_stores_upper_triangle(#[case] numopg: i64, #[case] elements: usize) {
        let schema = schema().unwrap();
        let mut record = full_record();
        record.truncate("errcvg", &[0], 0);
        record.set("numopg", &[0], Some(Value::Int(numopg)));
        for element in 0..elements {
            record.set("errcvg", &[0, element], Some(Value::Float(0.0)));
        }

        let encoded = schema.codec().encode_to_vec(&record).unwrap();
        let decoded = schema.codec().decode_slice(&encoded).unwrap();
        assert_eq!(decoded.iteration_count("errcvg", &[0]), elements);
    }

    #[test]
    fn csm_correlation_replaces_segments() {
        let schema = schema().unwrap();
        let mut record = full_record();
        record.set("acsmc", &[0], Some(Value::from("Y")));
        record.set("ncseg", &[0], None);
        record.truncate("corseg", &[0], 0);
        record.truncate("tauseg", &[0], 0);
        for name in ["ac", "alpc", "betc", "tc"] {
            record.set(name, &[0], Some(Value::Float(3.0)));
        }

        let segmented = schema.codec().encode_to_vec(&full_record()).unwrap();
        let correlated = schema.codec().encode_to_vec(&record).unwrap();
        // 1 count + 2 segment values replaced by 4 parameters
        assert_eq!(correlated.len(), segmented.len() - 1 - 2 * 21 + 4 * 21);
        let decoded = schema.codec().decode_slice(&correlated).unwrap();
        assert_eq!(decoded.get("ncseg", &[0]), None);
        assert_eq!(decoded.iteration_count("corseg", &[0]), 0);
        assert_eq!(decoded.get("tc", &[0]), Some(&Value::Float(3.0)));
    }
}
