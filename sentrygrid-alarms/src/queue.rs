use sentrygrid_types::AlarmEvent;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;
use tokio::sync::Notify;

struct QueuedAlarm {
    event: AlarmEvent,
    submitted_at: Instant,
}

impl PartialEq for QueuedAlarm {
    fn eq(&self, other: &Self) -> bool {
        self.event.event_id == other.event.event_id
    }
}
impl Eq for QueuedAlarm {}

impl Ord for QueuedAlarm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.event
            .priority
            .cmp(&other.event.priority)
            .then_with(|| other.submitted_at.cmp(&self.submitted_at))
    }
}
impl PartialOrd for QueuedAlarm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue ordered by `(priority desc, submission time asc)`.
/// `push` never blocks or drops; the alarm path has no real-time deadline
/// the way frame ingestion does, so backpressure here just means the
/// queue grows rather than discarding an alarm.
pub struct AlarmQueue {
    heap: parking_lot::Mutex<BinaryHeap<QueuedAlarm>>,
    notify: Notify,
}

impl AlarmQueue {
    pub fn new() -> Self {
        Self { heap: parking_lot::Mutex::new(BinaryHeap::new()), notify: Notify::new() }
    }

    pub fn push(&self, event: AlarmEvent) {
        self.heap.lock().push(QueuedAlarm { event, submitted_at: Instant::now() });
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_pop(&self) -> Option<(AlarmEvent, Instant)> {
        self.heap.lock().pop().map(|q| (q.event, q.submitted_at))
    }

    pub async fn recv(&self) -> (AlarmEvent, Instant) {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            self.notify.notified().await;
        }
    }
}

impl Default for AlarmQueue {
    fn default() -> Self {
        Self::new()
    }
}
