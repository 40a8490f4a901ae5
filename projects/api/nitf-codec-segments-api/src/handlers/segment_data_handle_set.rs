//! Selection of the codec that reads a segment's payload.

use crate::data::{
    OpaqueDesHandler, OpaqueImageDataHandler, PlaceholderHandler, RawImageDataHandler,
    TextDataHandler, TreOverflowDesHandler,
};
use crate::error::{SegmentError, SegmentResult};
use crate::handlers::{PriorityHandleSet, Probe};
use crate::segment::{SegmentInfo, SegmentKind};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use log::{debug, trace};
use nitf_codec_schema::TagRegistry;
use std::io::SeekFrom;
use std::sync::Arc;

/// Priority of the catch-all placeholders; everything else is tried first.
pub const PLACEHOLDER_PRIORITY: i32 = -1000;

/// Priority of the byte-preserving DES and image passthroughs, just above the placeholders.
pub const OPAQUE_PRIORITY: i32 = -999;

/// Payload codec handlers, tried in priority order.
///
/// # Example
///
/// ```
/// use nitf_codec_schema::TagRegistry;
/// use nitf_codec_segments_api::{Segment, SegmentDataHandleSet, SegmentKind, SharedHeader};
/// use std::io::Cursor;
/// use std::sync::Arc;
///
/// let handlers = SegmentDataHandleSet::with_defaults(Arc::new(TagRegistry::new()));
/// let mut segment = Segment::new(SharedHeader::new(SegmentKind::Graphic), 4);
/// let mut file = Cursor::new(b"CGM!rest".to_vec());
///
/// let data = segment.read_data(&handlers, &mut file).unwrap();
/// assert!(data.is_placeholder());
/// assert_eq!(file.position(), 4);
/// ```
#[derive(Default)]
pub struct SegmentDataHandleSet {
    handlers: PriorityHandleSet<dyn SegmentDataHandler>,
}

impl SegmentDataHandleSet {
    /// Empty set; every probe reports [`Probe::NotApplicable`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set with the built-in codecs registered.
    ///
    /// - text and uncompressed image payloads at priority 0
    /// - `TRE_OVERFLOW` DES payloads (decoded through `registry`) at priority 0
    /// - opaque DES and compressed image passthrough at [`OPAQUE_PRIORITY`]
    /// - graphic and RES placeholders at [`PLACEHOLDER_PRIORITY`]
    pub fn with_defaults(registry: Arc<TagRegistry>) -> Self {
        let mut set = Self::new();
        set.register(Box::new(TextDataHandler));
        set.register(Box::new(RawImageDataHandler));
        set.register(Box::new(TreOverflowDesHandler::new(registry)));
        set.register_with_priority(Box::new(OpaqueDesHandler), OPAQUE_PRIORITY);
        set.register_with_priority(Box::new(OpaqueImageDataHandler), OPAQUE_PRIORITY);
        for kind in [SegmentKind::Graphic, SegmentKind::Res] {
            set.register_with_priority(
                Box::new(PlaceholderHandler::new(kind)),
                PLACEHOLDER_PRIORITY,
            );
        }
        set
    }

    /// Registers a handler at priority 0, ahead of earlier priority 0 handlers.
    pub fn register(&mut self, handler: Box<dyn SegmentDataHandler>) {
        self.handlers.register(handler);
    }

    pub fn register_with_priority(&mut self, handler: Box<dyn SegmentDataHandler>, priority: i32) {
        self.handlers.register_with_priority(handler, priority);
    }

    /// Handlers in probe order, with their priorities.
    pub fn handlers(&self) -> impl Iterator<Item = (&dyn SegmentDataHandler, i32)> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Reads the payload with the first handler whose codec applies.
    ///
    /// Handlers that are not compatible with `info` are skipped without
    /// touching `reader`. When a compatible codec reports
    /// [`Probe::NotApplicable`], `reader` is moved back to where it was before
    /// the codec started, so the next codec sees the payload from the start.
    /// Errors from a codec end the probe.
    pub fn probe(
        &self,
        info: &SegmentInfo<'_>,
        reader: &mut dyn ReadSeek,
    ) -> SegmentResult<Probe<Box<dyn SegmentData>>> {
        self.handlers.probe(|handler| {
            if !handler.is_compatible(info) {
                trace!("{} is not compatible with {} segment", handler.name(), info.kind);
                return Ok(Probe::NotApplicable);
            }

            let start = reader.stream_position()?;
            let mut data = handler.create(info);
            match data.read_from_file(reader, info.segment_index)? {
                Probe::Handled(()) => {
                    debug!("{} read {} segment data", handler.name(), info.kind);
                    Ok(Probe::Handled(data))
                }
                Probe::NotApplicable => {
                    debug!(
                        "{} declined {} segment data, rewinding to {start}",
                        handler.name(),
                        info.kind
                    );
                    reader.seek(SeekFrom::Start(start))?;
                    Ok(Probe::NotApplicable)
                }
            }
        })
    }

    /// Like [`probe`](Self::probe), but no applicable handler is an error.
    pub fn handle(
        &self,
        info: &SegmentInfo<'_>,
        reader: &mut dyn ReadSeek,
    ) -> SegmentResult<Box<dyn SegmentData>> {
        match self.probe(info, reader)? {
            Probe::Handled(data) => Ok(data),
            Probe::NotApplicable => Err(SegmentError::NoHandlerFound { kind: info.kind }),
        }
    }
}
