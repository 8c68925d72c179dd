use crate::domain::attributes::Attributes;

/// What an idle status frees up on a throttled model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleAction {
    /// Send the buffered patch in the slot the backend just released.
    Flush,
    /// Nothing buffered, release one in-flight slot.
    Release,
}

/// Coalescing helper for throttled sync decisions
pub struct Coalescer;

impl Coalescer {
    /// Pure decision function: whether a sync must be buffered instead of sent
    #[inline]
    pub fn decide_buffer(pending_msgs: usize, msg_throttle: usize) -> bool {
        pending_msgs >= msg_throttle
    }

    /// Pure decision function: what to do when the backend reports idle
    #[inline]
    pub fn decide_idle(pending_msgs: usize, msg_throttle: usize, has_buffer: bool) -> IdleAction {
        if pending_msgs == msg_throttle && has_buffer {
            IdleAction::Flush
        } else {
            IdleAction::Release
        }
    }

    /// Coalesce a throttled sync into the buffer: patches merge key by key,
    /// a full update replaces the buffer with the full snapshot.
    pub fn coalesce(
        buffer: Option<Attributes>,
        changed: &Attributes,
        snapshot: &Attributes,
        patch: bool,
    ) -> Attributes {
        if patch {
            let mut buffer = buffer.unwrap_or_default();
            buffer.merge(changed);
            buffer
        } else {
            snapshot.clone()
        }
    }
}
