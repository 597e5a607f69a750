use crate::error::PolygonError;
use serde::{Deserialize, Serialize};

/// Coordinates must land within this range (generous bound on plausible
/// frame sizes; the rule engine additionally checks against the actual
/// frame dimensions it is evaluating against).
const MAX_COORD: f64 = 1_000_000.0;
const MIN_AREA: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// Time-of-day window, in seconds-since-midnight, that may wrap past
/// midnight (`start > end` means the window spans midnight).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_s: u32,
    pub end_s: u32,
}

impl TimeWindow {
    pub fn contains(&self, now_s: u32) -> bool {
        if self.start_s <= self.end_s {
            now_s >= self.start_s && now_s < self.end_s
        } else {
            now_s >= self.start_s || now_s < self.end_s
        }
    }
}

/// Region of interest: a validated simple polygon of at least 3 vertices
/// enclosing non-negligible area.
///
/// Construction is the sole validation gate: a malformed polygon is
/// rejected here and never enters the engine. Once built, every other
/// component can assume an `ROI` is well-formed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ROI {
    pub roi_id: String,
    vertices: Vec<Vertex>,
    pub priority: u8,
    pub time_window: Option<TimeWindow>,
    pub enabled: bool,
}

impl ROI {
    pub fn new(
        roi_id: impl Into<String>,
        vertices: Vec<Vertex>,
        priority: u8,
        time_window: Option<TimeWindow>,
        enabled: bool,
    ) -> Result<Self, PolygonError> {
        validate_polygon(&vertices)?;
        Ok(Self {
            roi_id: roi_id.into(),
            vertices,
            priority: priority.clamp(1, 5),
            time_window,
            enabled,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn is_active_at(&self, now_s: u32) -> bool {
        self.enabled
            && match &self.time_window {
                Some(w) => w.contains(now_s),
                None => true,
            }
    }

    /// Even-odd ray casting; a point exactly on an edge resolves to
    /// inside.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        if point_on_boundary(&self.vertices, px, py) {
            return true;
        }
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            let crosses = (vi.y > py) != (vj.y > py);
            if crosses {
                let x_at_y = vj.x + (py - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
                if px < x_at_y {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn point_on_boundary(vertices: &[Vertex], px: f64, py: f64) -> bool {
    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        if point_on_segment(a, b, px, py) {
            return true;
        }
    }
    false
}

fn point_on_segment(a: Vertex, b: Vertex, px: f64, py: f64) -> bool {
    const EPS: f64 = 1e-9;
    let cross = (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x);
    if cross.abs() > EPS {
        return false;
    }
    let within_x = px >= a.x.min(b.x) - EPS && px <= a.x.max(b.x) + EPS;
    let within_y = py >= a.y.min(b.y) - EPS && py <= a.y.max(b.y) + EPS;
    within_x && within_y
}

/// Shoelace formula; signed area, take abs for the area test.
fn signed_area(vertices: &[Vertex]) -> f64 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn segments_intersect(a1: Vertex, a2: Vertex, b1: Vertex, b2: Vertex) -> bool {
    fn cross(o: Vertex, p: Vertex, q: Vertex) -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    }
    fn on_segment(p: Vertex, q: Vertex, r: Vertex) -> bool {
        r.x <= p.x.max(q.x) && r.x >= p.x.min(q.x) && r.y <= p.y.max(q.y) && r.y >= p.y.min(q.y)
    }

    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0)) {
        return true;
    }
    if d1 == 0.0 && on_segment(b1, b2, a1) {
        return true;
    }
    if d2 == 0.0 && on_segment(b1, b2, a2) {
        return true;
    }
    if d3 == 0.0 && on_segment(a1, a2, b1) {
        return true;
    }
    if d4 == 0.0 && on_segment(a1, a2, b2) {
        return true;
    }
    false
}

fn has_self_intersection(vertices: &[Vertex]) -> bool {
    let n = vertices.len();
    for i in 0..n {
        let a1 = vertices[i];
        let a2 = vertices[(i + 1) % n];
        for j in (i + 1)..n {
            // Adjacent edges share an endpoint by construction; skip them.
            if j == i || (j + 1) % n == i {
                continue;
            }
            let b1 = vertices[j];
            let b2 = vertices[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

pub fn validate_polygon(vertices: &[Vertex]) -> Result<(), PolygonError> {
    if vertices.len() < 3 {
        return Err(PolygonError::InsufficientPoints);
    }
    if vertices
        .iter()
        .any(|v| v.x.abs() > MAX_COORD || v.y.abs() > MAX_COORD || !v.x.is_finite() || !v.y.is_finite())
    {
        return Err(PolygonError::CoordinateOutOfRange);
    }
    if has_self_intersection(vertices) {
        return Err(PolygonError::SelfIntersection);
    }
    if signed_area(vertices).abs() < MIN_AREA {
        return Err(PolygonError::AreaTooSmall);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vertex {
        Vertex { x, y }
    }

    fn square() -> Vec<Vertex> {
        vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0)]
    }

    #[test]
    fn scenario_2_insufficient_points() {
        let verts = vec![v(100.0, 100.0), v(200.0, 100.0)];
        assert_eq!(validate_polygon(&verts), Err(PolygonError::InsufficientPoints));
    }

    #[test]
    fn valid_square_passes() {
        assert!(validate_polygon(&square()).is_ok());
    }

    #[test]
    fn degenerate_line_rejected_for_area() {
        let verts = vec![v(0.0, 0.0), v(10.0, 0.0), v(5.0, 0.0)];
        assert_eq!(validate_polygon(&verts), Err(PolygonError::AreaTooSmall));
    }

    #[test]
    fn self_intersecting_bowtie_rejected() {
        let verts = vec![v(0.0, 0.0), v(10.0, 10.0), v(10.0, 0.0), v(0.0, 10.0)];
        assert_eq!(validate_polygon(&verts), Err(PolygonError::SelfIntersection));
    }

    #[test]
    fn out_of_range_coordinate_rejected() {
        let verts = vec![v(0.0, 0.0), v(1e9, 0.0), v(1e9, 1e9)];
        assert_eq!(validate_polygon(&verts), Err(PolygonError::CoordinateOutOfRange));
    }

    #[test]
    fn point_on_edge_is_inside() {
        let roi = ROI::new("r1", square(), 1, None, true).unwrap();
        assert!(roi.contains_point(0.0, 5.0));
        assert!(roi.contains_point(5.0, 0.0));
    }

    #[test]
    fn point_inside_and_outside() {
        let roi = ROI::new("r1", square(), 1, None, true).unwrap();
        assert!(roi.contains_point(5.0, 5.0));
        assert!(!roi.contains_point(50.0, 50.0));
    }

    #[test]
    fn time_window_wraps_midnight() {
        let w = TimeWindow { start_s: 82800, end_s: 3600 }; // 23:00-01:00
        assert!(w.contains(82900));
        assert!(w.contains(1800));
        assert!(!w.contains(43200));
    }

    proptest::proptest! {
        #[test]
        fn prop_validator_always_decides(
            n in 0usize..6,
            coords in proptest::collection::vec(-5.0f64..5.0, 0..12),
        ) {
            let verts: Vec<Vertex> = coords
                .chunks(2)
                .take(n)
                .filter(|c| c.len() == 2)
                .map(|c| Vertex { x: c[0], y: c[1] })
                .collect();
            // Must not panic and must return exactly one of the typed
            // error codes, or Ok, for any vertex list.
            let _ = validate_polygon(&verts);
        }
    }
}
