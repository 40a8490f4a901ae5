//! Ordered registry of competing candidates with first-applicable-wins probing.

use log::trace;

/// Outcome of offering a request to one candidate.
///
/// Combined with [`Result`] this gives the three states of a probe:
/// `Ok(Handled(_))`, `Ok(NotApplicable)` and `Err(_)`. A candidate that
/// does not apply must say so with [`Probe::NotApplicable`], never with an
/// error, so that genuine failures are never mistaken for "try the next one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    /// The candidate does not apply; the next one should be tried.
    NotApplicable,
    /// The candidate applied and produced a result.
    Handled(T),
}

impl<T> Probe<T> {
    pub fn is_handled(&self) -> bool {
        matches!(self, Probe::Handled(_))
    }

    /// Converts to an [`Option`], dropping the distinction between "not applicable" and "none".
    pub fn handled(self) -> Option<T> {
        match self {
            Probe::Handled(value) => Some(value),
            Probe::NotApplicable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Handled(value) => Probe::Handled(f(value)),
            Probe::NotApplicable => Probe::NotApplicable,
        }
    }
}

struct Registration<H: ?Sized> {
    priority: i32,
    handler: Box<H>,
}

/// Candidates ordered by priority.
///
/// Higher priorities are probed first. Among equal priorities the most
/// recently registered candidate is probed first, so applications can
/// override a library default by registering a replacement at the same
/// priority later on.
///
/// Registries are built during initialization and only read afterwards.
pub struct PriorityHandleSet<H: ?Sized> {
    entries: Vec<Registration<H>>,
}

impl<H: ?Sized> Default for PriorityHandleSet<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: ?Sized> PriorityHandleSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a candidate at priority 0.
    pub fn register(&mut self, handler: Box<H>) {
        self.register_with_priority(handler, 0);
    }

    /// Registers a candidate ahead of every existing candidate with the same or a lower priority.
    pub fn register_with_priority(&mut self, handler: Box<H>, priority: i32) {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.priority <= priority)
            .unwrap_or(self.entries.len());
        self.entries
            .insert(position, Registration { priority, handler });
    }

    /// Candidates in probe order, with their priorities.
    pub fn iter(&self) -> impl Iterator<Item = (&H, i32)> {
        self.entries
            .iter()
            .map(|entry| (entry.handler.as_ref(), entry.priority))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offers a request to each candidate in priority order.
    ///
    /// Returns the first [`Probe::Handled`] result, or [`Probe::NotApplicable`]
    /// if no candidate applies. An error from a candidate stops probing and is
    /// returned as is.
    pub fn probe<T, E>(
        &self,
        mut attempt: impl FnMut(&H) -> Result<Probe<T>, E>,
    ) -> Result<Probe<T>, E> {
        for (position, entry) in self.entries.iter().enumerate() {
            if let Probe::Handled(result) = attempt(entry.handler.as_ref())? {
                trace!(
                    "Candidate {position} (priority {}) handled the request",
                    entry.priority
                );
                return Ok(Probe::Handled(result));
            }
        }
        Ok(Probe::NotApplicable)
    }
}
