use crate::update::CrossCameraUpdate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// Bounded mailbox for cross-camera updates. `push` never blocks: once
/// full, the oldest queued update is evicted to make room for the new
/// one, on the theory that a stale embedding is worthless anyway once a
/// fresher one for the same track is available.
pub struct Inbox {
    queue: parking_lot::Mutex<VecDeque<CrossCameraUpdate>>,
    capacity: usize,
    notify: Notify,
    drops: AtomicU64,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: parking_lot::Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            notify: Notify::new(),
            drops: AtomicU64::new(0),
        }
    }

    pub fn push(&self, update: CrossCameraUpdate) {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(update);
        drop(queue);
        self.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<CrossCameraUpdate> {
        self.queue.lock().pop_front()
    }

    pub async fn recv(&self) -> CrossCameraUpdate {
        loop {
            if let Some(update) = self.try_pop() {
                return update;
            }
            self.notify.notified().await;
        }
    }

    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}
