//! Field-by-field comparison of TREs.

use crate::diff::DiffContext;
use crate::error::SegmentResult;
use crate::handlers::Probe;
use crate::traits::{DiffHandler, DiffSubject};
use log::debug;
use nitf_codec_schema::{Slot, Tre, TreRecord, Value};

/// Compares two TREs.
///
/// Decoded TREs with the same tag are compared field by field in schema
/// order, honoring the [`DiffOptions`](crate::DiffOptions) filters; each
/// differing value is reported with its full index path. TREs that were not
/// decoded on both sides are compared by their encoded bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreDiff;

impl DiffHandler for TreDiff {
    fn name(&self) -> &'static str {
        "TRE"
    }

    fn diff(
        &self,
        lhs: &DiffSubject<'_>,
        rhs: &DiffSubject<'_>,
        context: &mut DiffContext,
    ) -> SegmentResult<Probe<bool>> {
        let (Some(lhs), Some(rhs)) = (lhs.as_tre(), rhs.as_tre()) else {
            return Ok(Probe::NotApplicable);
        };
        if lhs.tag() != rhs.tag() {
            context.report(
                "TRE",
                &format!("tag {} on the left, {} on the right", lhs.tag(), rhs.tag()),
            );
            return Ok(Probe::Handled(false));
        }

        let same = match (lhs, rhs) {
            (Tre::Known(left), Tre::Known(right)) => compare_records(left, right, context),
            _ => {
                let same = lhs.body()? == rhs.body()?;
                if !same {
                    context.report(&format!("TRE {}", lhs.tag()), "bodies differ");
                }
                same
            }
        };
        Ok(Probe::Handled(same))
    }
}

fn compare_records(lhs: &TreRecord, rhs: &TreRecord, context: &mut DiffContext) -> bool {
    let tag = lhs.tag();
    debug!("Comparing TRE {tag} field by field");
    let mut same = true;
    for field in lhs.schema().fields() {
        let name = field.name();
        if !context.is_compared(tag, name) {
            continue;
        }
        let ignore_case = context.options().ignores_case(tag, name);
        let mut path = Vec::new();
        same &= compare_slots(
            &FieldPath { tag, name, ignore_case },
            &mut path,
            lhs.values().slot(name, &[]),
            rhs.values().slot(name, &[]),
            context,
        );
    }
    same
}

struct FieldPath<'a> {
    tag: &'a str,
    name: &'a str,
    ignore_case: bool,
}

impl FieldPath<'_> {
    fn location(&self, indices: &[usize]) -> String {
        let mut location = format!("{}.{}", self.tag, self.name);
        for index in indices {
            location.push_str(&format!("[{index}]"));
        }
        location
    }
}

/// Walks both value trees in step; positions missing on one side compare as "no value".
fn compare_slots(
    field: &FieldPath<'_>,
    path: &mut Vec<usize>,
    lhs: Option<&Slot>,
    rhs: Option<&Slot>,
    context: &mut DiffContext,
) -> bool {
    if repeated(lhs).is_some() || repeated(rhs).is_some() {
        let left = repeated(lhs).unwrap_or_default();
        let right = repeated(rhs).unwrap_or_default();
        let mut same = true;
        for index in 0..left.len().max(right.len()) {
            path.push(index);
            same &= compare_slots(field, path, left.get(index), right.get(index), context);
            path.pop();
        }
        return same;
    }

    let left = scalar(lhs);
    let right = scalar(rhs);
    if values_equal(left, right, field.ignore_case) {
        return true;
    }
    context.report(
        &field.location(path),
        &format!("{} on the left, {} on the right", describe(left), describe(right)),
    );
    false
}

fn repeated(slot: Option<&Slot>) -> Option<&[Slot]> {
    match slot {
        Some(Slot::Repeated(items)) => Some(items),
        _ => None,
    }
}

fn scalar(slot: Option<&Slot>) -> Option<&Value> {
    match slot {
        Some(Slot::Scalar(value)) => value.as_ref(),
        _ => None,
    }
}

fn values_equal(lhs: Option<&Value>, rhs: Option<&Value>, ignore_case: bool) -> bool {
    match (lhs, rhs) {
        (Some(Value::Str(a)), Some(Value::Str(b))) if ignore_case => {
            a.to_lowercase() == b.to_lowercase()
        }
        _ => lhs == rhs,
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => format!("`{value}`"),
        None => "no value".into(),
    }
}
