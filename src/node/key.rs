//! Event keys and fan-out policy (spec §4.2).

use uuid::Uuid;

/// Identifies one request/branch registration for keyed fan-out. Opaque on
/// purpose — callers never construct one directly, they come from
/// [`EventKey::fresh`] or a [`crate::flavors::cold::ColdBranch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKeyId(Uuid);

impl EventKeyId {
    /// Mint a new, globally-unique key id.
    pub fn fresh() -> Self {
        EventKeyId(Uuid::new_v4())
    }
}

/// The fan-out policy stamped on an event as it is delivered to a node's
/// children.
#[derive(Debug, Clone, Copy)]
pub enum EventKey {
    /// Unrestricted fan-out: every child receives the event. Used by Hot,
    /// Observable, and Future streams.
    None,
    /// Deliver only to the child registered under this id. Used by Cold for
    /// request/response isolation between branches.
    Keyed(EventKeyId),
    /// Deliver to every child, but stamp the event with this id so each
    /// branch can correlate it to the originating request. Used by Cold's
    /// `share()`.
    Shared(EventKeyId),
}

impl EventKey {
    /// Whether an edge registered under `registered` should receive an event
    /// carrying this key.
    pub fn accepts(&self, registered: Option<EventKeyId>) -> bool {
        match self {
            EventKey::None => true,
            EventKey::Shared(_) => true,
            EventKey::Keyed(id) => registered == Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_key_accepts_every_registration() {
        assert!(EventKey::None.accepts(None));
        assert!(EventKey::None.accepts(Some(EventKeyId::fresh())));
    }

    #[test]
    fn keyed_only_accepts_matching_registration() {
        let id = EventKeyId::fresh();
        assert!(EventKey::Keyed(id).accepts(Some(id)));
        assert!(!EventKey::Keyed(id).accepts(Some(EventKeyId::fresh())));
        assert!(!EventKey::Keyed(id).accepts(None));
    }

    #[test]
    fn shared_key_reaches_every_child_regardless_of_registration() {
        let id = EventKeyId::fresh();
        assert!(EventKey::Shared(id).accepts(None));
        assert!(EventKey::Shared(id).accepts(Some(EventKeyId::fresh())));
    }
}
