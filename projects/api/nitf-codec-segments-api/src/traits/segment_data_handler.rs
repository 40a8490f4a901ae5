//! Trait for factories registered into a [`SegmentDataHandleSet`](crate::SegmentDataHandleSet).

use crate::segment::{SegmentInfo, SegmentKind};
use crate::traits::SegmentData;

/// Creates [`SegmentData`] codecs for the segments it is compatible with.
///
/// Compatibility is decided from the segment kind and header alone. The
/// dispatcher calls [`is_compatible`](Self::is_compatible) before creating a
/// codec and before any byte of the payload is read, so an incompatible
/// handler never consumes input.
pub trait SegmentDataHandler {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// The segment kind created codecs read.
    fn segment_kind(&self) -> SegmentKind;

    /// Cheap, side-effect-free check whether a codec from this handler can apply.
    ///
    /// The default only compares segment kinds. Handlers keyed on subheader
    /// fields (compression type, DES identifier) narrow this further.
    fn is_compatible(&self, info: &SegmentInfo<'_>) -> bool {
        info.kind == self.segment_kind()
    }

    /// Creates an unread codec bound to the segment's shared header.
    fn create(&self, info: &SegmentInfo<'_>) -> Box<dyn SegmentData>;
}
