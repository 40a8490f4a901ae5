//! Error types for segment payload codecs and dispatch.

use crate::segment::SegmentKind;
use nitf_codec_schema::RecordError;
use thiserror::Error;

/// Result type for segment operations
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Errors that can occur while reading, writing or comparing segment payloads.
///
/// "This candidate does not apply" is not an error; it is reported through
/// [`Probe::NotApplicable`](crate::Probe::NotApplicable).
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Error from decoding or encoding a schema-described record
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// An error originating from I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload ended before the segment's declared length
    #[error("Truncated {kind} segment data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        kind: SegmentKind,
        expected: usize,
        actual: usize,
    },

    /// The declared payload length cannot be used as a stream offset
    #[error("{kind} segment data size {size} is too large to skip")]
    DataSizeOverflow { kind: SegmentKind, size: usize },

    /// Placeholder payloads skip their bytes on read and can never be written back
    #[error("Cannot write a {kind} placeholder: its data was skipped, not read")]
    PlaceholderWrite { kind: SegmentKind },

    /// Every registered codec reported that it does not apply
    #[error("No registered handler can read {kind} segment data")]
    NoHandlerFound { kind: SegmentKind },

    /// Every registered comparator reported that it does not apply
    #[error("No registered diff handler can compare {lhs} with {rhs}")]
    NoDiffHandler { lhs: String, rhs: String },

    /// The segment's payload has not been read (or assigned) yet
    #[error("Segment data has not been read")]
    DataNotRead,
}
