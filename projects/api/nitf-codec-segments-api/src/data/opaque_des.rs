//! Byte-preserving fallback for DES types without a codec.

use crate::data::read_payload;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use log::warn;
use std::io::Write;
use std::rc::Rc;

/// DES payload kept verbatim so unknown DES types survive a read/write cycle.
#[derive(Debug)]
pub struct OpaqueDes {
    header: Rc<SharedHeader>,
    data_size: usize,
    bytes: Vec<u8>,
}

impl OpaqueDes {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl SegmentData for OpaqueDes {
    fn name(&self) -> &'static str {
        "opaque DES"
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
        self.bytes = read_payload(reader, SegmentKind::Des, self.data_size)?;
        warn!(
            "No codec for DES {:?}, keeping {} bytes verbatim",
            self.header.field_str("desid").unwrap_or_default(),
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

/// Creates [`OpaqueDes`] for every DES segment.
///
/// Meant to be registered at [`OPAQUE_PRIORITY`](crate::handlers::OPAQUE_PRIORITY).
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueDesHandler;

impl SegmentDataHandler for OpaqueDesHandler {
    fn name(&self) -> &'static str {
        "opaque DES"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Des
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(OpaqueDes {
            header: Rc::clone(info.header),
            data_size: info.data_size,
            bytes: Vec::new(),
        })
    }
}
