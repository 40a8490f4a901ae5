//! Segment-side collaborators of the payload codecs.
//!
//! A [`Segment`] owns a [`SharedHeader`] and, once read, the [`SegmentData`]
//! codec that parsed its payload. Both hold the same `Rc<SharedHeader>`, so a
//! payload codec can be swapped out (or built standalone and attached later)
//! without copying subheader state around.

pub mod des_subheader;
pub mod image_subheader;

use crate::error::{SegmentError, SegmentResult};
use crate::handlers::SegmentDataHandleSet;
use crate::traits::{ReadSeek, SegmentData};
use core::cell::{OnceCell, Ref, RefCell, RefMut};
use core::fmt;
use log::debug;
use nitf_codec_schema::{DecodedRecord, TreRecord, Value};
use std::io::Write;
use std::rc::Rc;

/// The five top-level segment kinds of a NITF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Image,
    Graphic,
    Text,
    /// Data extension segment
    Des,
    /// Reserved extension segment
    Res,
}

impl SegmentKind {
    /// Every kind, in file order.
    pub const ALL: [SegmentKind; 5] = [
        SegmentKind::Image,
        SegmentKind::Graphic,
        SegmentKind::Text,
        SegmentKind::Des,
        SegmentKind::Res,
    ];

    /// Two-letter segment type identifier used in subheaders (`IM`, `SY`, `TE`, `DE`, `RE`).
    pub fn identifier(self) -> &'static str {
        match self {
            SegmentKind::Image => "IM",
            SegmentKind::Graphic => "SY",
            SegmentKind::Text => "TE",
            SegmentKind::Des => "DE",
            SegmentKind::Res => "RE",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Image => "image",
            SegmentKind::Graphic => "graphic",
            SegmentKind::Text => "text",
            SegmentKind::Des => "DES",
            SegmentKind::Res => "RES",
        };
        f.write_str(name)
    }
}

/// Decoded subheader fields of one segment.
///
/// Subheader parsing belongs to the file layer; payload codecs only read the
/// handful of fields they key on (`ic`, `desid`, ...) and seed defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Subheader {
    kind: SegmentKind,
    fields: DecodedRecord,
}

impl Subheader {
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            fields: DecodedRecord::new(),
        }
    }

    pub fn from_fields(kind: SegmentKind, fields: DecodedRecord) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn fields(&self) -> &DecodedRecord {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut DecodedRecord {
        &mut self.fields
    }

    /// Top-level (non-repeated) field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name, &[])
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.set(name, &[], Some(value.into()));
    }
}

/// Header state shared between a [`Segment`] and its payload codec.
///
/// The subheader is only created on first access.
#[derive(Debug)]
pub struct SharedHeader {
    kind: SegmentKind,
    subheader: OnceCell<RefCell<Subheader>>,
    user_subheader: RefCell<Option<TreRecord>>,
}

impl SharedHeader {
    pub fn new(kind: SegmentKind) -> Rc<Self> {
        Rc::new(Self {
            kind,
            subheader: OnceCell::new(),
            user_subheader: RefCell::new(None),
        })
    }

    /// Wraps a subheader already decoded by the file layer.
    pub fn with_subheader(subheader: Subheader) -> Rc<Self> {
        let kind = subheader.kind();
        let header = Self {
            kind,
            subheader: OnceCell::from(RefCell::new(subheader)),
            user_subheader: RefCell::new(None),
        };
        Rc::new(header)
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    fn cell(&self) -> &RefCell<Subheader> {
        self.subheader
            .get_or_init(|| RefCell::new(Subheader::new(self.kind)))
    }

    pub fn subheader(&self) -> Ref<'_, Subheader> {
        self.cell().borrow()
    }

    pub fn subheader_mut(&self) -> RefMut<'_, Subheader> {
        self.cell().borrow_mut()
    }

    /// Whether the subheader has been created yet.
    pub fn is_initialized(&self) -> bool {
        self.subheader.get().is_some()
    }

    /// Copy of a top-level string field, for compatibility checks.
    pub fn field_str(&self, name: &str) -> Option<String> {
        self.subheader().get_str(name).map(str::to_owned)
    }

    /// DES user-defined subheader, if any.
    pub fn user_subheader(&self) -> Ref<'_, Option<TreRecord>> {
        self.user_subheader.borrow()
    }

    pub fn set_user_subheader(&self, record: Option<TreRecord>) {
        *self.user_subheader.borrow_mut() = record;
    }

    /// Encoded length of the user-defined subheader body, 0 when there is none.
    pub fn user_subheader_size(&self) -> SegmentResult<usize> {
        match self.user_subheader.borrow().as_ref() {
            Some(record) => Ok(record.encode_body()?.len()),
            None => Ok(0),
        }
    }
}

/// What a payload codec gets to see before deciding whether it applies.
///
/// Everything here is known without touching the payload stream.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInfo<'a> {
    pub kind: SegmentKind,
    pub header: &'a Rc<SharedHeader>,
    /// Declared payload length in bytes
    pub data_size: usize,
    /// Position of the segment among segments of the same kind, when the file layer knows it
    pub segment_index: Option<usize>,
}

/// One segment: shared header plus an optionally read payload.
#[derive(Debug)]
pub struct Segment {
    header: Rc<SharedHeader>,
    data_size: usize,
    index: Option<usize>,
    data: Option<Box<dyn SegmentData>>,
}

impl Segment {
    pub fn new(header: Rc<SharedHeader>, data_size: usize) -> Self {
        Self {
            header,
            data_size,
            index: None,
            data: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn kind(&self) -> SegmentKind {
        self.header.kind()
    }

    pub fn header(&self) -> &Rc<SharedHeader> {
        &self.header
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn info(&self) -> SegmentInfo<'_> {
        SegmentInfo {
            kind: self.kind(),
            header: &self.header,
            data_size: self.data_size,
            segment_index: self.index,
        }
    }

    pub fn data(&self) -> Option<&dyn SegmentData> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut (dyn SegmentData + 'static)> {
        self.data.as_deref_mut()
    }

    /// Reads the payload with the first applicable codec from `handlers`.
    ///
    /// `reader` must be positioned at the start of the payload.
    pub fn read_data(
        &mut self,
        handlers: &SegmentDataHandleSet,
        reader: &mut dyn ReadSeek,
    ) -> SegmentResult<&dyn SegmentData> {
        let data = handlers.handle(&self.info(), reader)?;
        debug!("{} segment payload read by {}", self.kind(), data.name());
        Ok(&**self.data.insert(data))
    }

    /// Writes the payload through the codec that read (or was assigned) it.
    pub fn write_data(&self, writer: &mut dyn Write) -> SegmentResult<usize> {
        match &self.data {
            Some(data) => data.write_to_file(writer),
            None => Err(SegmentError::DataNotRead),
        }
    }

    /// Attaches a payload codec; the segment adopts the codec's header.
    pub fn set_data(&mut self, data: Box<dyn SegmentData>) {
        self.header = Rc::clone(data.header());
        self.data = Some(data);
    }
}
