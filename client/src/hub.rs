// Subscription fan-out hub.
// Invariants: publish iterates a snapshot of the observer list taken
// at call start, re-checking liveness per observer; a panicking
// observer never aborts delivery to the rest. Not a queue: messages
// published with no observers are dropped.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use woltride_core::envelope::Envelope;

type Callback = Arc<dyn Fn(&Envelope) + Send + Sync>;

#[derive(Clone, Default)]
pub struct SubscriptionHub {
    shared: Arc<HubShared>,
}

#[derive(Default)]
struct HubShared {
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

impl HubShared {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle returned by `subscribe`; `unsubscribe` is idempotent and
/// safe to call from inside an observer callback during delivery.
pub struct Subscription {
    shared: Arc<HubShared>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        self.shared
            .subscribers()
            .retain(|(id, _)| *id != self.id);
    }
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; delivery order follows subscription order.
    pub fn subscribe(
        &self,
        callback: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.subscribers().push((id, Arc::new(callback)));
        Subscription {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    /// Deliver `envelope` synchronously to every subscribed observer.
    /// Observers added during the pass do not receive this message;
    /// observers removed during the pass are skipped.
    pub fn publish(&self, envelope: &Envelope) {
        let snapshot: Vec<(u64, Callback)> = self.shared.subscribers().clone();
        for (id, callback) in snapshot {
            let still_subscribed = self
                .shared
                .subscribers()
                .iter()
                .any(|(live_id, _)| *live_id == id);
            if !still_subscribed {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(envelope))).is_err() {
                warn!(subscriber = id, "subscriber panicked during delivery");
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers().len()
    }
}
