//! Text segment payloads.

use crate::data::read_payload;
use crate::error::{SegmentError, SegmentResult};
use crate::handlers::Probe;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use nitf_codec_schema::{ConsistencyError, RecordError};
use std::io::Write;
use std::rc::Rc;

/// Text segment payload, kept as text.
///
/// Bytes map one-to-one onto characters (ISO-8859-1), so any payload
/// round-trips unchanged.
#[derive(Debug)]
pub struct TextData {
    header: Rc<SharedHeader>,
    data_size: usize,
    text: String,
}

impl TextData {
    /// Standalone text payload with its own header.
    pub fn from_text(text: &str) -> Self {
        Self {
            header: SharedHeader::new(SegmentKind::Text),
            data_size: text.chars().count(),
            text: text.to_owned(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_owned();
    }

    fn encoded(&self) -> SegmentResult<Vec<u8>> {
        self.text
            .chars()
            .map(|c| {
                u8::try_from(c).map_err(|_| {
                    SegmentError::from(RecordError::from(
                        ConsistencyError::UnencodableCharacter {
                            field: "text".into(),
                            character: c,
                        },
                    ))
                })
            })
            .collect()
    }
}

impl SegmentData for TextData {
    fn name(&self) -> &'static str {
        "text"
    }

    fn kind(&self) -> SegmentKind {
        SegmentKind::Text
    }

    fn header(&self) -> &Rc<SharedHeader> {
        &self.header
    }

    fn read_from_file(
        &mut self,
        reader: &mut dyn ReadSeek,
        _segment_index: Option<usize>,
    ) -> SegmentResult<Probe<()>> {
        let payload = read_payload(reader, SegmentKind::Text, self.data_size)?;
        self.text = payload.into_iter().map(char::from).collect();
        Ok(Probe::Handled(()))
    }

    fn write_to_file(&self, writer: &mut dyn Write) -> SegmentResult<usize> {
        let bytes = self.encoded()?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`TextData`] for every text segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDataHandler;

impl SegmentDataHandler for TextDataHandler {
    fn name(&self) -> &'static str {
        "text"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Text
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(TextData {
            header: Rc::clone(info.header),
            data_size: info.data_size,
            text: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;
    use std::io::Cursor;

    #[test]
    fn reads_latin1_text() {
        let segment = Segment::new(SharedHeader::new(SegmentKind::Text), 5);
        let mut data = TextDataHandler.create(&segment.info());
        let mut file = Cursor::new(b"caf\xe9!more".to_vec());
        data.read_from_file(&mut file, None).unwrap();

        let text = data.downcast_ref::<TextData>().unwrap();
        assert_eq!(text.text(), "café!");
        assert_eq!(data.to_bytes().unwrap(), b"caf\xe9!");
    }

    #[test]
    fn short_payload_is_truncated() {
        let segment = Segment::new(SharedHeader::new(SegmentKind::Text), 10);
        let mut data = TextDataHandler.create(&segment.info());
        let mut file = Cursor::new(b"short".to_vec());
        assert!(matches!(
            data.read_from_file(&mut file, None),
            Err(SegmentError::TruncatedData {
                expected: 10,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn unencodable_text_fails_to_write() {
        let data = TextData::from_text("snow ☃");
        assert!(matches!(
            data.write_to_file(&mut Vec::new()),
            Err(SegmentError::Record(RecordError::Consistency(
                ConsistencyError::UnencodableCharacter { character: '☃', .. }
            )))
        ));
    }
}
