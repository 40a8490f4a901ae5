//! Capability traits implemented by payload codecs and comparators.
//!
//! ## Payload codecs
//!
//! Reading a segment payload is a two-step affair:
//!
//! 1. A [`SegmentDataHandler`] decides, from the [`SegmentInfo`](crate::SegmentInfo)
//!    alone, whether its codec can possibly apply. This must not touch the stream.
//! 2. If it can, the handler creates a [`SegmentData`] codec, which then tries
//!    [`SegmentData::read_from_file`]. The codec may still answer
//!    [`Probe::NotApplicable`](crate::Probe::NotApplicable) once it has looked
//!    at the bytes (for example an unsupported compression).
//!
//! Handlers are registered into a [`SegmentDataHandleSet`](crate::SegmentDataHandleSet),
//! which tries them in priority order.
//!
//! ## Comparators
//!
//! A [`DiffHandler`] compares two [`DiffSubject`]s, or reports that it does not
//! know how to compare them. Comparators are registered into a
//! [`DiffHandleSet`](crate::DiffHandleSet).

pub(crate) mod diff_handler;
pub(crate) mod segment_data;
pub(crate) mod segment_data_handler;

// Re-export the main traits for convenience
pub use diff_handler::*;
pub use segment_data::*;
pub use segment_data_handler::*;
