//! Trait for comparators registered into a [`DiffHandleSet`](crate::DiffHandleSet).

use crate::diff::DiffContext;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::traits::SegmentData;
use core::fmt;
use nitf_codec_schema::Tre;

/// Something a comparator can be asked to compare.
#[derive(Debug, Clone, Copy)]
pub enum DiffSubject<'a> {
    /// A segment payload codec
    SegmentData(&'a dyn SegmentData),
    /// A tagged record extension
    Tre(&'a Tre),
}

impl<'a> DiffSubject<'a> {
    pub fn as_segment_data(&self) -> Option<&'a dyn SegmentData> {
        match *self {
            DiffSubject::SegmentData(data) => Some(data),
            DiffSubject::Tre(_) => None,
        }
    }

    pub fn as_tre(&self) -> Option<&'a Tre> {
        match *self {
            DiffSubject::Tre(tre) => Some(tre),
            DiffSubject::SegmentData(_) => None,
        }
    }
}

impl fmt::Display for DiffSubject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSubject::SegmentData(data) => write!(f, "{} ({})", data.kind(), data.name()),
            DiffSubject::Tre(tre) => write!(f, "TRE {}", tre.tag()),
        }
    }
}

/// Compares two subjects of a kind it understands.
pub trait DiffHandler {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// Compares `lhs` with `rhs`.
    ///
    /// # Returns
    ///
    /// - `Ok(Probe::Handled(true))` when both are equivalent
    /// - `Ok(Probe::Handled(false))` when they differ; each difference is
    ///   reported through `context`
    /// - `Ok(Probe::NotApplicable)` when this comparator does not handle the pair
    fn diff(
        &self,
        lhs: &DiffSubject<'_>,
        rhs: &DiffSubject<'_>,
        context: &mut DiffContext,
    ) -> SegmentResult<Probe<bool>>;
}
