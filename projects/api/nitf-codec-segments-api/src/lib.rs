#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]

pub mod data;
pub mod diff;
pub mod error;
pub mod handlers;
pub mod segment;
pub mod traits;

#[cfg(test)]
pub mod test_prelude;

// Re-export key types
pub use data::{
    OpaqueDes, OpaqueDesHandler, OpaqueImageData, OpaqueImageDataHandler, PlaceholderData,
    PlaceholderHandler, RawImageData, RawImageDataHandler, RecordDes, RecordDesHandler, TextData,
    TextDataHandler, TreOverflowDes, TreOverflowDesHandler,
};
pub use diff::{DiffContext, DiffOptions, EncodedDataDiff, PlaceholderDiff, TreDiff};
pub use error::{SegmentError, SegmentResult};
pub use handlers::{
    DiffHandleSet, PriorityHandleSet, Probe, SegmentDataHandleSet, OPAQUE_PRIORITY,
    PLACEHOLDER_PRIORITY,
};
pub use segment::{Segment, SegmentInfo, SegmentKind, SharedHeader, Subheader};
pub use traits::{DiffHandler, DiffSubject, ReadSeek, SegmentData, SegmentDataHandler};
