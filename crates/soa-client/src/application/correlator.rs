//! Request/response correlation over an unlabeled duplex channel.
//!
//! The gateway echoes bus replies with no request identifier attached, so
//! the client decides what each inbound line means by *when* it arrives.
//! The correlator keeps a single handler slot:
//!
//! - **Default**: inbound lines are unsolicited pushes and are handed back
//!   to the caller for the push channel.
//! - **Pending**: a request is outstanding; the next inbound line resolves
//!   its one-shot waiter and the slot reverts to whatever was installed
//!   before.
//!
//! Installing while a request is already pending stacks: the newer waiter
//! becomes current and the older one is restored when the newer resolves.
//! The intended discipline is still one outstanding request per connection;
//! stacking exists so an overlap cannot wedge the slot.
//!
//! Every pending entry carries an id so a caller that gives up (timeout,
//! failed send) can abandon *its own* entry without disturbing a newer one.
//! An abandoned or resolved entry is gone; `abandon` on it returns `false`,
//! which tells the caller the reply may have been delivered already.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{oneshot, Mutex};
use tracing::debug;

/// The correlation slot state.
enum HandlerSlot {
    /// No request outstanding; inbound lines are pushes.
    Default,
    /// One request outstanding; the next inbound line resolves it.
    Pending {
        id: u64,
        reply_tx: oneshot::Sender<String>,
        previous: Box<HandlerSlot>,
    },
}

/// Pairs inbound lines with outstanding requests on one connection.
pub struct Correlator {
    slot: Mutex<HandlerSlot>,
    next_id: AtomicU64,
}

impl Correlator {
    /// Creates a correlator with the default handler installed.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(HandlerSlot::Default),
            next_id: AtomicU64::new(1),
        }
    }

    /// Installs a one-shot waiter for the next inbound line.
    ///
    /// Must be called *before* the request is sent: the reply can arrive
    /// arbitrarily soon after the send completes, and a waiter installed
    /// late would see its reply routed to the push channel instead.
    ///
    /// Returns the entry's id (for [`abandon`](Self::abandon)) and the
    /// receiver the reply will arrive on.
    pub async fn install(&self) -> (u64, oneshot::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        let mut slot = self.slot.lock().await;
        let previous = std::mem::replace(&mut *slot, HandlerSlot::Default);
        *slot = HandlerSlot::Pending {
            id,
            reply_tx,
            previous: Box::new(previous),
        };

        (id, reply_rx)
    }

    /// Routes one inbound line.
    ///
    /// Resolves the current pending waiter and restores its predecessor,
    /// returning `None`. With no waiter installed the line is a push and
    /// comes back as `Some` for the caller to forward.
    pub async fn deliver(&self, line: String) -> Option<String> {
        let mut slot = self.slot.lock().await;
        match std::mem::replace(&mut *slot, HandlerSlot::Default) {
            HandlerSlot::Default => Some(line),
            HandlerSlot::Pending {
                id,
                reply_tx,
                previous,
            } => {
                *slot = *previous;
                if reply_tx.send(line).is_err() {
                    // The requester is gone without abandoning; the reply
                    // has nowhere to go.
                    debug!("reply for request {id} dropped: waiter gone");
                }
                None
            }
        }
    }

    /// Removes the pending entry with `id`, wherever it sits in the stack.
    ///
    /// Returns `true` if the entry was still pending and has been removed,
    /// `false` if it had already been resolved (or abandoned). On `false`
    /// the caller should check its receiver once more: the reply may have
    /// raced the abandon.
    pub async fn abandon(&self, id: u64) -> bool {
        let mut slot = self.slot.lock().await;
        let current = std::mem::replace(&mut *slot, HandlerSlot::Default);
        let (rebuilt, removed) = remove_entry(current, id);
        *slot = rebuilt;
        removed
    }

    /// `true` while any request is outstanding.
    pub async fn has_pending(&self) -> bool {
        matches!(*self.slot.lock().await, HandlerSlot::Pending { .. })
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds the slot stack without the entry carrying `id`.
fn remove_entry(slot: HandlerSlot, target: u64) -> (HandlerSlot, bool) {
    match slot {
        HandlerSlot::Default => (HandlerSlot::Default, false),
        HandlerSlot::Pending {
            id,
            reply_tx,
            previous,
        } => {
            if id == target {
                (*previous, true)
            } else {
                let (rebuilt, removed) = remove_entry(*previous, target);
                (
                    HandlerSlot::Pending {
                        id,
                        reply_tx,
                        previous: Box::new(rebuilt),
                    },
                    removed,
                )
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_without_pending_is_a_push() {
        let correlator = Correlator::new();
        let routed = correlator.deliver("NOTIFOKnuevo evento".to_string()).await;
        assert_eq!(routed, Some("NOTIFOKnuevo evento".to_string()));
    }

    #[tokio::test]
    async fn test_pending_consumes_exactly_one_line_then_restores_default() {
        let correlator = Correlator::new();
        let (_id, rx) = correlator.install().await;
        assert!(correlator.has_pending().await);

        // First line resolves the waiter.
        let routed = correlator.deliver("AUTHOK{\"token\":\"xyz\"}".to_string()).await;
        assert_eq!(routed, None);
        assert_eq!(rx.await.unwrap(), "AUTHOK{\"token\":\"xyz\"}");
        assert!(!correlator.has_pending().await);

        // Second line is a push again.
        let routed = correlator.deliver("EVNTSOKmantenimiento".to_string()).await;
        assert_eq!(routed, Some("EVNTSOKmantenimiento".to_string()));
    }

    #[tokio::test]
    async fn test_stacked_waiters_resolve_newest_first() {
        let correlator = Correlator::new();
        let (_outer, outer_rx) = correlator.install().await;
        let (_inner, inner_rx) = correlator.install().await;

        correlator.deliver("first".to_string()).await;
        correlator.deliver("second".to_string()).await;

        assert_eq!(inner_rx.await.unwrap(), "first");
        assert_eq!(outer_rx.await.unwrap(), "second");
        assert!(!correlator.has_pending().await);
    }

    #[tokio::test]
    async fn test_abandon_restores_default_delivery() {
        let correlator = Correlator::new();
        let (id, _rx) = correlator.install().await;

        assert!(correlator.abandon(id).await);
        assert!(!correlator.has_pending().await);

        let routed = correlator.deliver("late reply".to_string()).await;
        assert_eq!(routed, Some("late reply".to_string()));
    }

    #[tokio::test]
    async fn test_abandon_buried_entry_leaves_newer_waiter_current() {
        let correlator = Correlator::new();
        let (outer_id, _outer_rx) = correlator.install().await;
        let (_inner_id, inner_rx) = correlator.install().await;

        // The older entry times out; the newer one must stay current.
        assert!(correlator.abandon(outer_id).await);
        assert!(correlator.has_pending().await);

        correlator.deliver("for inner".to_string()).await;
        assert_eq!(inner_rx.await.unwrap(), "for inner");
        assert!(!correlator.has_pending().await);
    }

    #[tokio::test]
    async fn test_abandon_after_resolution_returns_false() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.install().await;

        correlator.deliver("reply".to_string()).await;
        assert_eq!(rx.await.unwrap(), "reply");

        // The entry is gone; the caller learns the reply already landed.
        assert!(!correlator.abandon(id).await);
    }

    #[tokio::test]
    async fn test_abandon_unknown_id_returns_false() {
        let correlator = Correlator::new();
        assert!(!correlator.abandon(9999).await);
    }

    #[tokio::test]
    async fn test_deliver_with_dropped_receiver_still_restores_default() {
        let correlator = Correlator::new();
        let (_id, rx) = correlator.install().await;
        drop(rx);

        // The send fails, the slot must still unwind.
        let routed = correlator.deliver("orphan".to_string()).await;
        assert_eq!(routed, None);
        assert!(!correlator.has_pending().await);
    }
}
