use std::collections::VecDeque;
use std::time::{Duration, Instant};

const CYCLE_EMA_SMOOTHING: f64 = 0.2;
const MAX_WINDOW: usize = 20;

/// CPU/GPU/memory gauges sampled once per monitor cycle. The manager
/// never reads these directly; it only aggregates what the probe hands
/// back.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResourceGauges {
    pub cpu_percent: f32,
    pub gpu_percent: f32,
    pub memory_mb: f32,
}

/// Injected so the monitor loop doesn't have to know how to read
/// `/proc` or query a GPU driver; tests and the example binary supply a
/// stub.
pub trait ResourceProbe: Send + Sync {
    fn sample(&self) -> ResourceGauges;
}

pub struct NullProbe;

impl ResourceProbe for NullProbe {
    fn sample(&self) -> ResourceGauges {
        ResourceGauges::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorConfig {
    pub target_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { target_interval_ms: 1000 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonitorSnapshot {
    pub cycle_count: u64,
    pub ema_cycle_ms: f64,
    pub max_cycle_ms: f64,
    pub healthy: bool,
    pub gauges: ResourceGauges,
}

/// Tracks cycle-time EMA plus a trailing-window max, and derives the
/// `healthy` flag from both against `target_interval_ms`.
pub struct MonitorAccumulator {
    target_interval_ms: f64,
    cycle_count: u64,
    ema_cycle_ms: f64,
    recent_cycles_ms: VecDeque<f64>,
    last_tick: Option<Instant>,
}

impl MonitorAccumulator {
    pub fn new(target_interval_ms: u64) -> Self {
        Self {
            target_interval_ms: target_interval_ms as f64,
            cycle_count: 0,
            ema_cycle_ms: 0.0,
            recent_cycles_ms: VecDeque::with_capacity(MAX_WINDOW),
            last_tick: None,
        }
    }

    pub fn record_cycle(&mut self, gauges: ResourceGauges) -> MonitorSnapshot {
        let now = Instant::now();
        let cycle_ms = match self.last_tick {
            Some(prev) => now.duration_since(prev).as_secs_f64() * 1000.0,
            None => self.target_interval_ms,
        };
        self.last_tick = Some(now);
        self.cycle_count += 1;

        self.ema_cycle_ms = if self.cycle_count == 1 {
            cycle_ms
        } else {
            CYCLE_EMA_SMOOTHING * cycle_ms + (1.0 - CYCLE_EMA_SMOOTHING) * self.ema_cycle_ms
        };

        if self.recent_cycles_ms.len() == MAX_WINDOW {
            self.recent_cycles_ms.pop_front();
        }
        self.recent_cycles_ms.push_back(cycle_ms);
        let max_cycle_ms = self.recent_cycles_ms.iter().cloned().fold(0.0_f64, f64::max);

        let healthy = self.ema_cycle_ms <= 0.8 * self.target_interval_ms && max_cycle_ms <= 1.5 * self.target_interval_ms;

        MonitorSnapshot { cycle_count: self.cycle_count, ema_cycle_ms: self.ema_cycle_ms, max_cycle_ms, healthy, gauges }
    }
}

pub fn interval_duration(config: &MonitorConfig) -> Duration {
    Duration::from_millis(config.target_interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cycle_is_healthy_with_no_history() {
        let mut acc = MonitorAccumulator::new(1000);
        let snap = acc.record_cycle(ResourceGauges::default());
        assert!(snap.healthy);
        assert_eq!(snap.cycle_count, 1);
    }

    #[test]
    fn sustained_slow_cycles_flip_unhealthy() {
        let mut acc = MonitorAccumulator::new(1000);
        acc.ema_cycle_ms = 0.0;
        for _ in 0..30 {
            acc.cycle_count += 1;
            acc.ema_cycle_ms = CYCLE_EMA_SMOOTHING * 2000.0 + (1.0 - CYCLE_EMA_SMOOTHING) * acc.ema_cycle_ms;
        }
        let healthy = acc.ema_cycle_ms <= 0.8 * acc.target_interval_ms;
        assert!(!healthy);
    }
}
