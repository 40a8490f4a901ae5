//! DES payloads holding a single schema-described record.

use crate::data::{has_desid, read_payload, seeded_des_header};
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use log::debug;
use nitf_codec_schema::{RecordSchema, TreRecord};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

/// DES whose payload is one record of `schema`; the segment's `desid` is the schema's tag.
#[derive(Debug)]
pub struct RecordDes {
    header: Rc<SharedHeader>,
    data_size: usize,
    record: TreRecord,
}

impl RecordDes {
    /// Empty record with a fresh header, `desid` and `dsver` seeded.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        Self {
            header: seeded_des_header(schema.tag()),
            data_size: 0,
            record: TreRecord::new(schema),
        }
    }

    pub fn record(&self) -> &TreRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut TreRecord {
        &mut self.record
    }
}

impl SegmentData for RecordDes {
    fn name(&self) -> &'static str {
        "record DES"
    }

    fn kind(&self) -> SegmentKind {
        SegmentKind::Des
    }

    fn header(&self) -> &Rc<SharedHeader> {
        &self.header
    }

    fn read_from_file(
        &mut self,
        reader: &mut dyn ReadSeek,
        _segment_index: Option<usize>,
    ) -> SegmentResult<Probe<()>> {
        let payload = read_payload(reader, SegmentKind::Des, self.data_size)?;
        let schema = Arc::clone(self.record.schema());
        self.record = TreRecord::decode(schema, &payload)?;
        debug!("Decoded {} DES record", self.record.tag());
        Ok(Probe::Handled(()))
    }

    fn write_to_file(&self, writer: &mut dyn Write) -> SegmentResult<usize> {
        let body = self.record.encode_body()?;
        writer.write_all(&body)?;
        Ok(body.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`RecordDes`] codecs for DES segments identified by the schema's tag.
#[derive(Debug, Clone)]
pub struct RecordDesHandler {
    schema: Arc<RecordSchema>,
}

impl RecordDesHandler {
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        Self { schema }
    }
}

impl SegmentDataHandler for RecordDesHandler {
    fn name(&self) -> &'static str {
        "record DES"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Des
    }

    fn is_compatible(&self, info: &SegmentInfo<'_>) -> bool {
        info.kind == SegmentKind::Des && has_desid(info.header, self.schema.tag())
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(RecordDes {
            header: Rc::clone(info.header),
            data_size: info.data_size,
            record: TreRecord::new(Arc::clone(&self.schema)),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::data::seeded_des_header;
    use crate::test_prelude::*;
    use std::io::Cursor;

    fn schema() -> Arc<RecordSchema> {
        let schema = RecordSchema::builder("TESTDES")
            .field(FieldDescriptor::integer("n", 1))
            .repeat(LoopDescriptor::new("f.n").field(FieldDescriptor::string("name", 4)))
            .build()
            .unwrap();
        Arc::new(schema)
    }

    #[test]
    fn new_codec_seeds_identifier_and_version() {
        let des = RecordDes::new(schema());
        let subheader = des.header().subheader();
        assert_eq!(subheader.get_str("desid"), Some("TESTDES"));
        assert_eq!(subheader.get("dsver"), Some(&Value::Int(DES_VERSION)));
    }

    #[test]
    fn codec_from_segment_keeps_segment_header() {
        let header = SharedHeader::new(SegmentKind::Des);
        header.subheader_mut().set("desid", "TESTDES");
        header.subheader_mut().set("dsver", 7);
        let segment = Segment::new(header, 0);

        let handler = RecordDesHandler::new(schema());
        assert!(handler.is_compatible(&segment.info()));
        let data = handler.create(&segment.info());
        assert!(Rc::ptr_eq(data.header(), segment.header()));
        assert_eq!(data.header().subheader().get("dsver"), Some(&Value::Int(7)));
    }

    #[test]
    fn round_trips_through_a_segment() {
        let mut des = RecordDes::new(schema());
        des.record_mut().set("n", &[], 2).unwrap();
        des.record_mut().set("name", &[0], "ABCD").unwrap();
        des.record_mut().set("name", &[1], "EF").unwrap();
        let payload = (&des as &dyn SegmentData).to_bytes().unwrap();
        assert_eq!(payload, b"2ABCDEF  ");

        let mut handlers = SegmentDataHandleSet::new();
        handlers.register(Box::new(RecordDesHandler::new(schema())));
        let header = seeded_des_header("TESTDES");
        let mut segment = Segment::new(header, payload.len());
        let data = segment
            .read_data(&handlers, &mut Cursor::new(payload.clone()))
            .unwrap();

        let des = data.downcast_ref::<RecordDes>().unwrap();
        assert_eq!(des.record().get("name", &[1]).unwrap(), Some(&Value::from("EF")));
        assert_eq!(data.to_bytes().unwrap(), payload);
    }

    #[test]
    fn other_desid_is_not_compatible() {
        let segment = Segment::new(seeded_des_header("OTHER"), 0);
        assert!(!RecordDesHandler::new(schema()).is_compatible(&segment.info()));
    }
}
