//! Catch-all codecs that skip a payload without reading it.

use crate::error::{SegmentError, SegmentResult};
use crate::handlers::Probe;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use core::fmt;
use log::debug;
use std::io::{SeekFrom, Write};
use std::rc::Rc;

/// Payload that was skipped, for segment kinds without a concrete codec.
///
/// Reading always succeeds and moves the stream past exactly the declared
/// payload length. Writing always fails: the skipped bytes are not kept.
#[derive(Debug)]
pub struct PlaceholderData {
    header: Rc<SharedHeader>,
    kind: SegmentKind,
    data_size: usize,
}

impl PlaceholderData {
    pub fn data_size(&self) -> usize {
        self.data_size
    }
}

impl fmt::Display for PlaceholderData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} placeholder, {} bytes of data", self.kind, self.data_size)
    }
}

impl SegmentData for PlaceholderData {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn kind(&self) -> SegmentKind {
        self.kind
    }

    fn header(&self) -> &Rc<SharedHeader> {
        &self.header
    }

    fn read_from_file(
        &mut self,
        reader: &mut dyn ReadSeek,
        _segment_index: Option<usize>,
    ) -> SegmentResult<Probe<()>> {
        debug!("Skipping {self}");
        let offset = i64::try_from(self.data_size).map_err(|_| SegmentError::DataSizeOverflow {
            kind: self.kind,
            size: self.data_size,
        })?;
        reader.seek(SeekFrom::Current(offset))?;
        Ok(Probe::Handled(()))
    }

    fn write_to_file(&self, _writer: &mut dyn Write) -> SegmentResult<usize> {
        Err(SegmentError::PlaceholderWrite { kind: self.kind })
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`PlaceholderData`] for every segment of one kind.
///
/// Meant to be registered at
/// [`PLACEHOLDER_PRIORITY`](crate::handlers::PLACEHOLDER_PRIORITY).
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderHandler {
    kind: SegmentKind,
}

impl PlaceholderHandler {
    pub fn new(kind: SegmentKind) -> Self {
        Self { kind }
    }
}

impl SegmentDataHandler for PlaceholderHandler {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn segment_kind(&self) -> SegmentKind {
        self.kind
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(PlaceholderData {
            header: Rc::clone(info.header),
            kind: self.kind,
            data_size: info.data_size,
        })
    }
}
