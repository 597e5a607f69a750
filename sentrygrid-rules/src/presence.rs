use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct Presence {
    pub(crate) first_inside_ts: Option<Duration>,
    pub(crate) was_inside: bool,
    recent_centers: VecDeque<(f64, f64)>,
}

const VARIANCE_WINDOW: usize = 32;

impl Presence {
    pub(crate) fn new() -> Self {
        Self { first_inside_ts: None, was_inside: false, recent_centers: VecDeque::with_capacity(VARIANCE_WINDOW) }
    }

    pub(crate) fn observe(&mut self, inside: bool, now: Duration, center: (f64, f64)) -> bool {
        let crossed = self.was_inside != inside;
        if inside {
            if self.first_inside_ts.is_none() {
                self.first_inside_ts = Some(now);
                self.recent_centers.clear();
            }
            if self.recent_centers.len() >= VARIANCE_WINDOW {
                self.recent_centers.pop_front();
            }
            self.recent_centers.push_back(center);
        } else {
            self.first_inside_ts = None;
            self.recent_centers.clear();
        }
        self.was_inside = inside;
        crossed
    }

    pub(crate) fn duration_inside(&self, now: Duration) -> Option<Duration> {
        self.first_inside_ts.map(|t| now.saturating_sub(t))
    }

    pub(crate) fn motion_variance(&self) -> Option<f64> {
        if self.recent_centers.len() < 2 {
            return None;
        }
        let n = self.recent_centers.len() as f64;
        let (sx, sy) = self.recent_centers.iter().fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        let (mx, my) = (sx / n, sy / n);
        let var = self
            .recent_centers
            .iter()
            .map(|(x, y)| (x - mx).powi(2) + (y - my).powi(2))
            .sum::<f64>()
            / n;
        Some(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_track_has_near_zero_variance() {
        let mut p = Presence::new();
        for i in 0..10 {
            p.observe(true, Duration::from_secs(i), (10.0, 10.0));
        }
        assert!(p.motion_variance().unwrap() < 1e-6);
    }

    #[test]
    fn exit_resets_duration() {
        let mut p = Presence::new();
        p.observe(true, Duration::from_secs(0), (1.0, 1.0));
        assert!(p.duration_inside(Duration::from_secs(1)).is_some());
        p.observe(false, Duration::from_secs(2), (1.0, 1.0));
        assert!(p.duration_inside(Duration::from_secs(3)).is_none());
    }

    #[test]
    fn crossing_detected_exactly_on_transition() {
        let mut p = Presence::new();
        assert!(!p.observe(false, Duration::from_secs(0), (0.0, 0.0)));
        assert!(p.observe(true, Duration::from_secs(1), (1.0, 1.0)));
        assert!(!p.observe(true, Duration::from_secs(2), (1.0, 1.0)));
        assert!(p.observe(false, Duration::from_secs(3), (1.0, 1.0)));
    }
}
