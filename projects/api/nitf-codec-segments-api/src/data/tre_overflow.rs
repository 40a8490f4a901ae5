//! `TRE_OVERFLOW` DES payloads: TREs that did not fit into a header's extension area.

use crate::data::{has_desid, read_payload, seeded_des_header};
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::des_subheader::TRE_OVERFLOW;
use crate::segment::{SegmentInfo, SegmentKind, SharedHeader};
use crate::traits::{ReadSeek, SegmentData, SegmentDataHandler};
use core::any::Any;
use log::debug;
use nitf_codec_schema::{read_tre_list, write_tre_list, TagRegistry, Tre};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

/// TRE overflow payload, decoded through a tag registry.
///
/// TREs with unregistered tags are kept as opaque bytes.
#[derive(Debug)]
pub struct TreOverflowDes {
    header: Rc<SharedHeader>,
    data_size: usize,
    registry: Arc<TagRegistry>,
    tres: Vec<Tre>,
}

impl TreOverflowDes {
    /// Empty overflow segment with a fresh header.
    pub fn new(registry: Arc<TagRegistry>) -> Self {
        Self {
            header: seeded_des_header(TRE_OVERFLOW),
            data_size: 0,
            registry,
            tres: Vec::new(),
        }
    }

    pub fn tres(&self) -> &[Tre] {
        &self.tres
    }

    pub fn tres_mut(&mut self) -> &mut Vec<Tre> {
        &mut self.tres
    }

    pub fn registry(&self) -> &Arc<TagRegistry> {
        &self.registry
    }
}

impl SegmentData for TreOverflowDes {
    fn name(&self) -> &'static str {
        "TRE overflow"
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
        self.tres = read_tre_list(&payload, &self.registry)?;
        debug!("Read {} overflow TREs", self.tres.len());
        Ok(Probe::Handled(()))
    }

    fn write_to_file(&self, writer: &mut dyn Write) -> SegmentResult<usize> {
        Ok(write_tre_list(&self.tres, writer)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`TreOverflowDes`] codecs for DES segments with `desid` `TRE_OVERFLOW`.
#[derive(Debug, Clone)]
pub struct TreOverflowDesHandler {
    registry: Arc<TagRegistry>,
}

impl TreOverflowDesHandler {
    pub fn new(registry: Arc<TagRegistry>) -> Self {
        Self { registry }
    }
}

impl SegmentDataHandler for TreOverflowDesHandler {
    fn name(&self) -> &'static str {
        "TRE overflow"
    }

    fn segment_kind(&self) -> SegmentKind {
        SegmentKind::Des
    }

    fn is_compatible(&self, info: &SegmentInfo<'_>) -> bool {
        info.kind == SegmentKind::Des && has_desid(info.header, TRE_OVERFLOW)
    }

    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData> {
        Box::new(TreOverflowDes {
            header: Rc::clone(info.header),
            data_size: info.data_size,
            registry: Arc::clone(&self.registry),
            tres: Vec::new(),
        })
    }
}
