use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
};

use crate::domain::UpdateId;

/// Update ids remembered before the oldest is evicted.
pub const DEFAULT_DEDUP_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct Window {
    order: VecDeque<UpdateId>,
    members: HashSet<UpdateId>,
}

/// Bounded recency set of inbound update ids.
///
/// Process-local and not persisted: a restart forgets everything.
#[derive(Debug)]
pub struct Deduplicator {
    capacity: usize,
    window: Mutex<Window>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

impl Deduplicator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            window: Mutex::new(Window::default()),
        }
    }

    /// Returns `true` if `id` was already recorded; otherwise records it.
    pub fn seen(&self, id: UpdateId) -> bool {
        let mut w = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if w.members.contains(&id) {
            return true;
        }

        w.members.insert(id);
        w.order.push_back(id);
        if w.order.len() > self.capacity {
            if let Some(oldest) = w.order.pop_front() {
                w.members.remove(&oldest);
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
