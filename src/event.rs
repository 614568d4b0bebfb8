//! The tagged-value types events carry as they travel down a stream graph.
//!
//! See spec §3.1. An [`Event`] is the unit of delivery between a parent node
//! and a child edge; a [`TerminationReason`] is carried once, inside
//! `Event::Terminate`, and closes the edge for good (barring Promise retry).

use std::fmt;

/// One item flowing down a stream edge.
#[derive(Clone)]
pub enum Event<T, Err> {
    /// A data value.
    Next(T),
    /// A non-terminating error. Hot/Cold/Observable streams keep running
    /// after one of these; Futures convert it to a termination (spec §4.4).
    Error(Err),
    /// The stream is closing. No further `Next`/`Error` may follow on this
    /// edge (I1, I2).
    Terminate(TerminationReason<Err>),
}

impl<T, Err> Event<T, Err> {
    /// `true` for `Event::Terminate`, regardless of reason.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Terminate(_))
    }

    /// Map the value payload, leaving errors and terminations untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Event<U, Err> {
        match self {
            Event::Next(v) => Event::Next(f(v)),
            Event::Error(e) => Event::Error(e),
            Event::Terminate(r) => Event::Terminate(r),
        }
    }

    /// Borrow the termination reason, if this is a `Terminate` event.
    pub fn termination(&self) -> Option<&TerminationReason<Err>> {
        match self {
            Event::Terminate(r) => Some(r),
            _ => None,
        }
    }
}

impl<T: fmt::Debug, Err: fmt::Debug> fmt::Debug for Event<T, Err> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Next(v) => f.debug_tuple("Next").field(v).finish(),
            Event::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Event::Terminate(r) => f.debug_tuple("Terminate").field(r).finish(),
        }
    }
}

/// Why a stream closed.
///
/// Two `Error` reasons compare equal regardless of payload (spec §3.1):
/// termination is equatable by tag only. This matters for merge/zip/combine
/// bookkeeping, which only needs to know *that* a side terminated, not why.
#[derive(Clone)]
pub enum TerminationReason<Err> {
    /// The stream ran to its natural, successful end.
    Completed,
    /// The stream was cancelled, either explicitly or because an input node
    /// was dropped while still active (spec §3.5).
    Cancelled,
    /// The stream closed because of an error.
    Error(Err),
}

impl<Err> TerminationReason<Err> {
    /// Tag-only equality: `Error(a) == Error(b)` regardless of `a`/`b`.
    pub fn same_kind(&self, other: &TerminationReason<Err>) -> bool {
        matches!(
            (self, other),
            (TerminationReason::Completed, TerminationReason::Completed)
                | (TerminationReason::Cancelled, TerminationReason::Cancelled)
                | (TerminationReason::Error(_), TerminationReason::Error(_))
        )
    }

    /// Borrow the error payload, if this reason is `Error`.
    pub fn error(&self) -> Option<&Err> {
        match self {
            TerminationReason::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl<Err: fmt::Debug> fmt::Debug for TerminationReason<Err> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Completed => write!(f, "Completed"),
            TerminationReason::Cancelled => write!(f, "Cancelled"),
            TerminationReason::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_reasons_compare_by_tag_only() {
        let a: TerminationReason<&str> = TerminationReason::Error("boom");
        let b: TerminationReason<&str> = TerminationReason::Error("different");
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&TerminationReason::Completed));
    }

    #[test]
    fn event_map_leaves_termination_alone() {
        let ev: Event<i32, &str> = Event::Terminate(TerminationReason::Completed);
        let mapped = ev.map(|v| v + 1);
        assert!(mapped.is_terminal());
    }
}
