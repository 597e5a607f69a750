use crate::channel::{build_channel, ChannelImpl, Disposition};
use crate::queue::AlarmQueue;
use crate::stats::{AlarmStats, StatsAccumulator};
use sentrygrid_types::{AlarmChannelConfig, AlarmEvent, WireAlarmEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlarmRouterConfig {
    pub workers: usize,
    pub retry_max: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for AlarmRouterConfig {
    fn default() -> Self {
        Self { workers: 4, retry_max: 3, backoff_base_ms: 100, backoff_max_ms: 2_000 }
    }
}

struct RoutedChannel {
    id: String,
    enabled: bool,
    channel: ChannelImpl,
}

/// Per-event fanout result: how many configured channels accepted the
/// event and how many did not, after retries.
#[derive(Clone, Debug)]
pub struct DispatchOutcome {
    pub event_id: uuid::Uuid,
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
    pub disposition: Disposition,
    pub elapsed: Duration,
}

/// The interface the rule engine and pipeline manager see: a place to
/// hand off an `AlarmEvent` without caring how many channels exist or
/// whether any of them are currently healthy.
pub trait AlarmSink {
    fn submit(&self, event: AlarmEvent);
}

/// Priority-ordered dispatcher that fans each alarm out to every enabled
/// channel in parallel, retrying failed channels with capped exponential
/// backoff before giving up on them.
pub struct AlarmRouter {
    channels: Vec<RoutedChannel>,
    queue: Arc<AlarmQueue>,
    config: AlarmRouterConfig,
    stats: parking_lot::Mutex<StatsAccumulator>,
}

impl AlarmRouter {
    pub async fn new(configs: &[AlarmChannelConfig], config: AlarmRouterConfig) -> std::io::Result<Arc<Self>> {
        let mut channels = Vec::with_capacity(configs.len());
        for cfg in configs {
            let channel = build_channel(&cfg.kind).await?;
            channels.push(RoutedChannel { id: cfg.id.clone(), enabled: cfg.enabled, channel });
        }
        Ok(Arc::new(Self {
            channels,
            queue: Arc::new(AlarmQueue::new()),
            config,
            stats: parking_lot::Mutex::new(StatsAccumulator::default()),
        }))
    }

    pub fn stats(&self) -> AlarmStats {
        self.stats.lock().snapshot(self.queue.len())
    }

    /// Spawns `config.workers` tasks that drain the shared queue until
    /// `cancel` fires. Each worker fans its current event out to every
    /// channel concurrently rather than sharding channels across workers,
    /// so one slow channel never starves the others for the same event.
    pub fn spawn_workers(self: &Arc<Self>, cancel: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.config.workers.max(1))
            .map(|_| {
                let router = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            (event, submitted_at) = router.queue.recv() => {
                                let outcome = router.dispatch_with_retry(&event).await;
                                let elapsed_ms = submitted_at.elapsed().as_secs_f64() * 1000.0;
                                router.stats.lock().record(
                                    outcome.delivered.len() as u64,
                                    outcome.failed.len() as u64,
                                    elapsed_ms,
                                );
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Dispatches immediately, bypassing the queue, intended for manual
    /// verification pushes (`test_mode = true` events) where the caller
    /// wants the outcome synchronously rather than through stats polling.
    pub async fn test_fire(&self, event: AlarmEvent) -> DispatchOutcome {
        self.dispatch_with_retry(&event).await
    }

    async fn dispatch_with_retry(&self, event: &AlarmEvent) -> DispatchOutcome {
        let started = Instant::now();
        let wire: WireAlarmEvent = event.into();

        let results = futures::future::join_all(
            self.channels
                .iter()
                .filter(|c| c.enabled)
                .map(|c| self.send_with_retry(c, &wire)),
        )
        .await;

        let delivered: Vec<String> = results.iter().filter(|(_, ok)| *ok).map(|(id, _)| id.clone()).collect();
        let failed: Vec<String> = results.iter().filter(|(_, ok)| !*ok).map(|(id, _)| id.clone()).collect();

        let disposition = if failed.is_empty() {
            Disposition::Delivered
        } else if delivered.is_empty() {
            Disposition::Failed
        } else {
            Disposition::Partial
        };

        DispatchOutcome { event_id: event.event_id, delivered, failed, disposition, elapsed: started.elapsed() }
    }

    async fn send_with_retry(&self, channel: &RoutedChannel, wire: &WireAlarmEvent) -> (String, bool) {
        let mut attempt = 0;
        loop {
            match channel.channel.send(wire).await {
                Ok(()) => return (channel.id.clone(), true),
                Err(err) => {
                    if attempt >= self.config.retry_max {
                        tracing::warn!(channel = %channel.id, error = %err, "alarm channel exhausted retries");
                        return (channel.id.clone(), false);
                    }
                    let backoff_ms = (self.config.backoff_base_ms.saturating_mul(1 << attempt)).min(self.config.backoff_max_ms);
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl AlarmSink for Arc<AlarmRouter> {
    fn submit(&self, event: AlarmEvent) {
        self.queue.push(event);
    }
}
