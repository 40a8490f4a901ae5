//! Trait for codecs that own one segment's payload.

use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::{SegmentKind, SharedHeader};
use core::any::Any;
use core::fmt::Debug;
use std::io::{Read, Seek, Write};
use std::rc::Rc;

/// Byte stream a payload can be read from.
///
/// Seeking lets placeholders skip their payload and lets the dispatcher rewind
/// after a codec declines.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Reads and writes the payload of one segment.
///
/// A codec is bound to exactly one [`SegmentKind`] and shares its header with
/// the owning [`Segment`](crate::Segment), so that either can be replaced
/// without losing subheader state.
pub trait SegmentData: Debug + Any {
    /// Short name of the codec, used in logs and diff reports.
    fn name(&self) -> &'static str;

    /// The segment kind this codec reads.
    fn kind(&self) -> SegmentKind;

    /// Header shared with the owning segment.
    fn header(&self) -> &Rc<SharedHeader>;

    /// Attempts to read the payload.
    ///
    /// # Parameters
    ///
    /// - `reader`: Stream positioned at the start of the payload
    /// - `segment_index`: Position of the segment in the file, for codecs that need it
    ///
    /// # Returns
    ///
    /// - `Ok(Probe::Handled(()))` when the payload was read
    /// - `Ok(Probe::NotApplicable)` when the payload is in a format this codec
    ///   does not support; this is not a read error
    /// - `Err(_)` when the payload is in this codec's format but is corrupt or
    ///   the stream failed
    fn read_from_file(
        &mut self,
        reader: &mut dyn ReadSeek,
        segment_index: Option<usize>,
    ) -> SegmentResult<Probe<()>>;

    /// Writes the payload, returning the number of bytes written.
    fn write_to_file(&self, writer: &mut dyn Write) -> SegmentResult<usize>;

    /// Whether this codec skipped its payload instead of reading it.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Access to the concrete codec, for comparators and callers that know it.
    fn as_any(&self) -> &dyn Any;
}

impl dyn SegmentData {
    /// Downcasts to a concrete codec type.
    pub fn downcast_ref<T: SegmentData>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Serialized payload, as [`SegmentData::write_to_file`] would write it.
    pub fn to_bytes(&self) -> SegmentResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to_file(&mut buffer)?;
        Ok(buffer)
    }
}
