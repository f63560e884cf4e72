// Deferred unmutes, keyed by (conversation, actor).
//
// Each mute schedules exactly one unmute. If the same actor is muted again in
// the same conversation before the pending unmute fires, the pending one is
// aborted and replaced, so overlapping mute windows extend instead of racing.

use super::moderation_models::ConversationId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MuteKey {
    pub conversation: ConversationId,
    pub actor_id: u64,
}

struct PendingUnmute {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Clone, Default)]
pub struct MuteScheduler {
    pending: Arc<DashMap<MuteKey, PendingUnmute>>,
    next_generation: Arc<AtomicU64>,
}

impl MuteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `unmute` after `delay`, replacing any unmute still pending for `key`.
    ///
    /// Returns `true` if a pending unmute was superseded.
    pub fn schedule<F, Fut>(&self, key: MuteKey, delay: Duration, unmute: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);

        // Hold the entry while spawning so the task can never observe a missing slot.
        match self.pending.entry(key) {
            Entry::Occupied(mut occupied) => {
                let handle = spawn_unmute(pending, key, generation, delay, unmute);
                let previous = occupied.insert(PendingUnmute { generation, handle });
                previous.handle.abort();
                tracing::debug!(actor_id = key.actor_id, "Extended pending mute");
                true
            }
            Entry::Vacant(vacant) => {
                let handle = spawn_unmute(pending, key, generation, delay, unmute);
                vacant.insert(PendingUnmute { generation, handle });
                false
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_pending(&self, key: &MuteKey) -> bool {
        self.pending.contains_key(key)
    }

    #[allow(dead_code)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn spawn_unmute<F, Fut>(
    pending: Arc<DashMap<MuteKey, PendingUnmute>>,
    key: MuteKey,
    generation: u64,
    delay: Duration,
    unmute: F,
) -> AbortHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        // Only the newest schedule for this key may lift the restriction.
        let still_current = pending
            .remove_if(&key, |_, p| p.generation == generation)
            .is_some();
        if still_current {
            unmute().await;
        }
    })
    .abort_handle()
}
