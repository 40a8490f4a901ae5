//! Built-in payload codecs.
//!
//! Each codec comes with the [`SegmentDataHandler`](crate::SegmentDataHandler)
//! that creates it. Codecs created by a handler share the segment's header;
//! codecs built directly through their `new`/`from_*` constructors get a fresh
//! header with defaults seeded, ready to be attached with
//! [`Segment::set_data`](crate::Segment::set_data).

pub mod opaque_des;
pub mod opaque_image;
pub mod placeholder;
pub mod raw_image;
pub mod record_des;
pub mod text;
pub mod tre_overflow;

pub use opaque_des::{OpaqueDes, OpaqueDesHandler};
pub use opaque_image::{OpaqueImageData, OpaqueImageDataHandler};
pub use placeholder::{PlaceholderData, PlaceholderHandler};
pub use raw_image::{RawImageData, RawImageDataHandler};
pub use record_des::{RecordDes, RecordDesHandler};
pub use text::{TextData, TextDataHandler};
pub use tre_overflow::{TreOverflowDes, TreOverflowDesHandler};

use crate::error::{SegmentError, SegmentResult};
use crate::segment::des_subheader;
use crate::segment::{SegmentKind, SharedHeader};
use crate::traits::ReadSeek;
use nitf_codec_schema::Value;
use std::io::Read;
use std::rc::Rc;

/// Version written to `dsver` by DES codecs built from scratch.
pub const DES_VERSION: i64 = 1;

/// Reads exactly `size` payload bytes.
pub(crate) fn read_payload(
    reader: &mut dyn ReadSeek,
    kind: SegmentKind,
    size: usize,
) -> SegmentResult<Vec<u8>> {
    let mut payload = Vec::with_capacity(size);
    (&mut *reader).take(size as u64).read_to_end(&mut payload)?;
    if payload.len() < size {
        return Err(SegmentError::TruncatedData {
            kind,
            expected: size,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// Fresh DES header with the identifier and version seeded.
pub(crate) fn seeded_des_header(desid: &str) -> Rc<SharedHeader> {
    let header = SharedHeader::with_subheader(des_subheader::default_subheader());
    {
        let mut subheader = header.subheader_mut();
        subheader.set("desid", desid);
        subheader.set("dsver", Value::Int(DES_VERSION));
    }
    header
}

/// Whether the segment's DES identifier is `desid`.
pub(crate) fn has_desid(header: &SharedHeader, desid: &str) -> bool {
    header.field_str("desid").as_deref() == Some(desid)
}
