//! Byte-preserving fallback for compressed images.

use crate::data::read_payload;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use log::warn;
use std::io::Write;
use std::rc::Rc;

/// Image payload kept verbatim when no codec understands its compression.
#[derive(Debug)]
pub struct OpaqueImageData {
    header: Rc<SharedHeader>,
    data_size: usize,
    bytes: Vec<u8>,
}

impl OpaqueImageData {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl SegmentData for OpaqueImageData {
    fn name(&self) -> &'static str {
        "opaque image"
    }

    fn kind(&self) -> SegmentKind {
        SegmentKind::Image
    }

    fn header(&self) -> &Rc<SharedHeader> {
        &self.header
    }

    fn read_from_file(
        &mut self,
        reader: &mut dyn ReadSeek,
        _segment_index: Option<usize>,
    ) -> SegmentResult<Probe<()>> {
        self.bytes = read_payload(reader, SegmentKind::Image, self.data_size)?;
        warn!(
            "No codec for image compression {:?}, keeping {} bytes verbatim",
            self.header.field_str("ic").unwrap_or_default(),
            self.bytes.len()
        );
        Ok(Probe::Handled(()))
    }

    fn write_to_file(&self, writer: &mut dyn Write) -> SegmentResult<usize> {
        writer.write_all(&self.bytes)?;
        Ok(self.bytes.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`OpaqueImageData`] for every image segment.
///
/// Meant to be registered at [`OPAQUE_PRIORITY`](crate::handlers::OPAQUE_PRIORITY),
/// below [`RawImageDataHandler`](crate::data::RawImageDataHandler) and any
/// decoder for a compressed format.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueImageDataHandler;

impl SegmentDataHandler for OpaqueImageDataHandler {
    fn name(&self) -> &'static str {
        "opaque image"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Image
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(OpaqueImageData {
            header: Rc::clone(info.header),
            data_size: info.data_size,
            bytes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;
    use std::io::Cursor;

    #[test]
    fn jpeg_image_is_kept_verbatim() {
        let handlers = SegmentDataHandleSet::with_defaults(Arc::new(TagRegistry::new()));
        let mut subheader = image_subheader::default_subheader();
        subheader.set("ic", "C3");
        let mut segment = Segment::new(SharedHeader::with_subheader(subheader), 5);
        let mut file = Cursor::new(b"\xff\xd8\xff\xd9\x00tail".to_vec());

        let data = segment.read_data(&handlers, &mut file).unwrap();
        assert_eq!(data.name(), "opaque image");
        assert!(!data.is_placeholder());
        assert_eq!(file.position(), 5);

        let image = data.downcast_ref::<OpaqueImageData>().unwrap();
        assert_eq!(image.bytes(), b"\xff\xd8\xff\xd9\x00");
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let handlers = SegmentDataHandleSet::with_defaults(Arc::new(TagRegistry::new()));
        let mut subheader = image_subheader::default_subheader();
        subheader.set("ic", "C8");
        let mut segment = Segment::new(SharedHeader::with_subheader(subheader), 8);

        assert!(matches!(
            segment.read_data(&handlers, &mut Cursor::new(vec![0u8; 3])),
            Err(SegmentError::TruncatedData {
                kind: SegmentKind::Image,
                expected: 8,
                actual: 3
            })
        ));
    }
}
