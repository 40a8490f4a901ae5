//! Selection of the comparator for two decoded entities.

use crate::diff::{DiffContext, EncodedDataDiff, PlaceholderDiff, TreDiff};
use crate::error::{SegmentError, SegmentResult};
use crate::handlers::{PriorityHandleSet, Probe, PLACEHOLDER_PRIORITY};
use crate::traits::{DiffHandler, DiffSubject, SegmentData};
use log::debug;
use nitf_codec_schema::Tre;

/// Comparators, tried in priority order.
#[derive(Default)]
pub struct DiffHandleSet {
    handlers: PriorityHandleSet<dyn DiffHandler>,
}

impl DiffHandleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set with the built-in comparators: placeholder and TRE comparison at
    /// priority 0, serialized payload comparison as the last resort.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.register(Box::new(PlaceholderDiff));
        set.register(Box::new(TreDiff));
        set.register_with_priority(Box::new(EncodedDataDiff), PLACEHOLDER_PRIORITY);
        set
    }

    pub fn register(&mut self, handler: Box<dyn DiffHandler>) {
        self.handlers.register(handler);
    }

    pub fn register_with_priority(&mut self, handler: Box<dyn DiffHandler>, priority: i32) {
        self.handlers.register_with_priority(handler, priority);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Compares two subjects with the first comparator that handles them.
    ///
    /// Returns whether they are equivalent; differences are reported through
    /// `context`. Fails with [`SegmentError::NoDiffHandler`] when no
    /// comparator handles the pair.
    pub fn diff(
        &self,
        lhs: &DiffSubject<'_>,
        rhs: &DiffSubject<'_>,
        context: &mut DiffContext,
    ) -> SegmentResult<bool> {
        match self.handlers.probe(|handler| handler.diff(lhs, rhs, context))? {
            Probe::Handled(same) => Ok(same),
            Probe::NotApplicable => Err(SegmentError::NoDiffHandler {
                lhs: lhs.to_string(),
                rhs: rhs.to_string(),
            }),
        }
    }

    pub fn diff_segment_data(
        &self,
        lhs: &dyn SegmentData,
        rhs: &dyn SegmentData,
        context: &mut DiffContext,
    ) -> SegmentResult<bool> {
        self.diff(
            &DiffSubject::SegmentData(lhs),
            &DiffSubject::SegmentData(rhs),
            context,
        )
    }

    /// Compares two TRE lists pairwise.
    ///
    /// A length mismatch is reported as a difference; the common prefix is
    /// still compared so every differing TRE gets reported.
    pub fn diff_tre_lists(
        &self,
        lhs: &[Tre],
        rhs: &[Tre],
        context: &mut DiffContext,
    ) -> SegmentResult<bool> {
        let mut same = true;
        if lhs.len() != rhs.len() {
            context.report(
                "TRE list",
                &format!("{} TREs on the left, {} on the right", lhs.len(), rhs.len()),
            );
            same = false;
        }
        debug!("Comparing {} TREs", lhs.len().min(rhs.len()));
        for (left, right) in lhs.iter().zip(rhs) {
            same &= self.diff(&DiffSubject::Tre(left), &DiffSubject::Tre(right), context)?;
        }
        Ok(same)
    }
}
