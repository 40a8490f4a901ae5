//! Fallback comparison of serialized payloads.

use crate::diff::DiffContext;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::traits::{DiffHandler, DiffSubject};

/// Compares two payloads of the same segment kind by what they would write.
///
/// Placeholders are left to [`PlaceholderDiff`](crate::PlaceholderDiff), as they cannot be written.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodedDataDiff;

impl DiffHandler for EncodedDataDiff {
    fn name(&self) -> &'static str {
        "encoded data"
    }

    fn diff(
        &self,
        lhs: &DiffSubject<'_>,
        rhs: &DiffSubject<'_>,
        context: &mut DiffContext,
    ) -> SegmentResult<Probe<bool>> {
        let (Some(lhs), Some(rhs)) = (lhs.as_segment_data(), rhs.as_segment_data()) else {
            return Ok(Probe::NotApplicable);
        };
        if lhs.kind() != rhs.kind() || lhs.is_placeholder() || rhs.is_placeholder() {
            return Ok(Probe::NotApplicable);
        }

        let left = lhs.to_bytes()?;
        let right = rhs.to_bytes()?;
        if left == right {
            return Ok(Probe::Handled(true));
        }
        let first = left
            .iter()
            .zip(&right)
            .position(|(a, b)| a != b)
            .unwrap_or(left.len().min(right.len()));
        context.report(
            &format!("{} data", lhs.kind()),
            &format!(
                "payloads differ at byte {first} ({} vs {} bytes)",
                left.len(),
                right.len()
            ),
        );
        Ok(Probe::Handled(false))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[rstest]
    #[case("same", "same", true)]
    #[case("same", "sane", false)]
    #[case("same", "same but longer", false)]
    fn compares_written_bytes(#[case] lhs: &str, #[case] rhs: &str, #[case] same: bool) {
        let lhs = TextData::from_text(lhs);
        let rhs = TextData::from_text(rhs);
        let mut context = DiffContext::default();
        let result = DiffHandleSet::with_defaults()
            .diff_segment_data(&lhs, &rhs, &mut context)
            .unwrap();
        assert_eq!(result, same);
        assert_eq!(context.differences(), usize::from(!same));
    }

    #[test]
    fn different_kinds_have_no_comparator() {
        let text = TextData::from_text("abc");
        let image = RawImageData::from_bytes(b"abc".to_vec());
        assert!(matches!(
            DiffHandleSet::with_defaults().diff_segment_data(
                &text,
                &image,
                &mut DiffContext::default()
            ),
            Err(SegmentError::NoDiffHandler { .. })
        ));
    }
}
