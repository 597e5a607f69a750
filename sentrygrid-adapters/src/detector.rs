use crate::error::DetectorError;
use sentrygrid_types::{Detection, DetectionThresholds, Frame};

/// Object detector contract. Implementations own whatever inference
/// backend they wrap; the core never inspects model internals, only the
/// typed `Detection` list that comes back.
pub trait Detector: Send {
    fn detect(&mut self, frame: &Frame, thresholds: &DetectionThresholds) -> Result<Vec<Detection>, DetectorError>;
}

/// Deterministic stand-in used by tests and the example binary: returns a
/// fixed detection list regardless of frame content, filtered by the
/// caller-supplied confidence threshold.
pub struct FixedDetector {
    detections: Vec<Detection>,
}

impl FixedDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl Detector for FixedDetector {
    fn detect(&mut self, _frame: &Frame, thresholds: &DetectionThresholds) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.score >= thresholds.confidence)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrygrid_types::{BBox, CameraId, ClassId};
    use std::sync::Arc;

    fn frame() -> Frame {
        Frame::new(CameraId::new("cam1").unwrap(), 0, 0, 640, 480, Arc::from(vec![0u8; 4]))
    }

    #[test]
    fn filters_below_confidence_threshold() {
        let mut det = FixedDetector::new(vec![
            Detection { class_id: ClassId(0), score: 0.9, bbox: BBox { x: 0, y: 0, w: 10, h: 10 } },
            Detection { class_id: ClassId(0), score: 0.2, bbox: BBox { x: 0, y: 0, w: 10, h: 10 } },
        ]);
        let thresholds = DetectionThresholds { confidence: 0.5, nms: 0.5 };
        let out = det.detect(&frame(), &thresholds).unwrap();
        assert_eq!(out.len(), 1);
    }
}
