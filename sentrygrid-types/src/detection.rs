use crate::frame::BBox;

/// Integer class id, stable within a model. Display names are carried
/// separately; the core uses integer class ids internally and only
/// resolves them to strings for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ClassId(pub u32);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub class_id: ClassId,
    /// Confidence in `[0, 1]`.
    pub score: f32,
    pub bbox: BBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionThresholds {
    pub confidence: f32,
    pub nms: f32,
}
