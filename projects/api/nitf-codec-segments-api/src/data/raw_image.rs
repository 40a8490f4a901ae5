//! Uncompressed image payloads, kept as raw bytes.

use crate::data::read_payload;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::image_subheader;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use std::io::Write;
use std::rc::Rc;

/// Compression codes for uncompressed data, without and with a block mask.
const UNCOMPRESSED: [&str; 2] = ["NC", "NM"];

/// Pixel bytes of an uncompressed image, stored as read.
///
/// Pixel layout (band/block interleave, bit depth) is left to the caller;
/// the subheader describes it.
#[derive(Debug)]
pub struct RawImageData {
    header: Rc<SharedHeader>,
    data_size: usize,
    bytes: Vec<u8>,
}

impl RawImageData {
    /// Standalone image payload with a default image subheader.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            header: SharedHeader::with_subheader(image_subheader::default_subheader()),
            data_size: bytes.len(),
            bytes,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl SegmentData for RawImageData {
    fn name(&self) -> &'static str {
        "raw image"
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

/// Creates [`RawImageData`] for image segments whose `ic` is `NC`, `NM` or unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawImageDataHandler;

impl SegmentDataHandler for RawImageDataHandler {
    fn name(&self) -> &'static str {
        "raw image"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Image
    }

    fn is_compatible(&self, info: &SegmentInfo<'_>) -> bool {
        info.kind == SegmentKind::Image
            && info
                .header
                .field_str("ic")
                .is_none_or(|ic| UNCOMPRESSED.contains(&ic.as_str()))
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(RawImageData {
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

    fn image_with_ic(ic: Option<&str>) -> Segment {
        let mut subheader = image_subheader::default_subheader();
        match ic {
            Some(ic) => subheader.set("ic", ic),
            None => subheader.fields_mut().set("ic", &[], None),
        }
        Segment::new(SharedHeader::with_subheader(subheader), 4)
    }

    #[rstest]
    #[case(Some("NC"), true)]
    #[case(Some("NM"), true)]
    #[case(None, true)]
    #[case(Some("C8"), false)]
    #[case(Some("C3"), false)]
    fn compatibility_follows_compression(#[case] ic: Option<&str>, #[case] compatible: bool) {
        let segment = image_with_ic(ic);
        assert_eq!(RawImageDataHandler.is_compatible(&segment.info()), compatible);
    }

    #[test]
    fn compressed_image_is_kept_verbatim() {
        let handlers = SegmentDataHandleSet::with_defaults(Arc::new(TagRegistry::new()));
        let mut segment = image_with_ic(Some("C8"));
        let mut file = Cursor::new(vec![1u8, 2, 3, 4]);

        let data = segment.read_data(&handlers, &mut file).unwrap();
        assert_eq!(data.name(), "opaque image");
        assert!(data.downcast_ref::<OpaqueImageData>().is_some());
        assert_eq!(data.to_bytes().unwrap(), [1, 2, 3, 4]);

        let mut written = Vec::new();
        assert_eq!(segment.write_data(&mut written).unwrap(), 4);
        assert_eq!(written, [1, 2, 3, 4]);
    }

    #[test]
    fn reads_pixels_verbatim() {
        let handlers = SegmentDataHandleSet::with_defaults(Arc::new(TagRegistry::new()));
        let mut segment = image_with_ic(Some("NC"));
        let mut file = Cursor::new(vec![1u8, 2, 3, 4, 5]);

        let data = segment.read_data(&handlers, &mut file).unwrap();
        let image = data.downcast_ref::<RawImageData>().unwrap();
        assert_eq!(image.bytes(), [1, 2, 3, 4]);
    }
}
