//! Comparison of skipped payloads.

use crate::diff::DiffContext;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::segment::SegmentKind;
use crate::traits::{DiffHandler, DiffSubject};
use log::warn;

/// Treats two skipped payloads of the same kind as equal, with a warning.
///
/// Placeholder payloads were never read, so there is nothing to compare. The
/// warning makes it explicit that "equal" here means "not compared".
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderDiff;

impl DiffHandler for PlaceholderDiff {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn diff(
        &self,
        lhs: &DiffSubject<'_>,
        rhs: &DiffSubject<'_>,
        _context: &mut DiffContext,
    ) -> SegmentResult<Probe<bool>> {
        let (Some(lhs), Some(rhs)) = (lhs.as_segment_data(), rhs.as_segment_data()) else {
            return Ok(Probe::NotApplicable);
        };
        if !lhs.is_placeholder() || !rhs.is_placeholder() || lhs.kind() != rhs.kind() {
            return Ok(Probe::NotApplicable);
        }

        let id_field = match lhs.kind() {
            SegmentKind::Graphic => "sid",
            SegmentKind::Res => "resid",
            SegmentKind::Image => "iid1",
            SegmentKind::Text => "textid",
            SegmentKind::Des => "desid",
        };
        warn!(
            "Skipping {} {:?}, its data was never read",
            lhs.kind(),
            lhs.header().field_str(id_field).unwrap_or_default()
        );
        Ok(Probe::Handled(true))
    }
}
