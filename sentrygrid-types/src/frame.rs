use crate::camera::CameraId;
use std::sync::Arc;

/// A single decoded frame from one camera.
///
/// `sequence_no` is strictly monotonically increasing per camera and
/// reflects only the frames a [`crate::frame::Frame`] source chose to keep
/// (it may drop frames to hit `target_fps`; dropped frames never appear
/// here, so the sequence still has no gaps from the consumer's point of
/// view even though real-world frame numbers might).
#[derive(Clone, Debug)]
pub struct Frame {
    pub camera_id: CameraId,
    pub sequence_no: u64,
    pub capture_ts_ns: u64,
    pub width: u32,
    pub height: u32,
    /// Packed pixel data; format is a matter between the adapter and the
    /// detector/embedder it was built for. Wrapped in `Arc` because a frame
    /// is fanned out, unmodified, to the tracker, the embedder and the
    /// overlay renderer within the same tick.
    pub pixels: Arc<[u8]>,
}

impl Frame {
    pub fn new(
        camera_id: CameraId,
        sequence_no: u64,
        capture_ts_ns: u64,
        width: u32,
        height: u32,
        pixels: Arc<[u8]>,
    ) -> Self {
        Self {
            camera_id,
            sequence_no,
            capture_ts_ns,
            width,
            height,
            pixels,
        }
    }
}

/// Pixel-space axis-aligned box, `x+w <= width` and `y+h <= height` once
/// clipped to the owning frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Clip this box to `width`x`height`. Returns `None` if the clipped
    /// area is zero, signaling the caller to drop the detection.
    pub fn clip(&self, width: u32, height: u32) -> Option<BBox> {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = (self.x.saturating_add(self.w)).min(width);
        let y1 = (self.y.saturating_add(self.h)).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BBox {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        })
    }

    pub fn iou(&self, other: &BBox) -> f64 {
        let ax0 = self.x as f64;
        let ay0 = self.y as f64;
        let ax1 = ax0 + self.w as f64;
        let ay1 = ay0 + self.h as f64;

        let bx0 = other.x as f64;
        let by0 = other.y as f64;
        let bx1 = bx0 + other.w as f64;
        let by1 = by0 + other.h as f64;

        let ix0 = ax0.max(bx0);
        let iy0 = ay0.max(by0);
        let ix1 = ax1.min(bx1);
        let iy1 = ay1.min(by1);

        let iw = (ix1 - ix0).max(0.0);
        let ih = (iy1 - iy0).max(0.0);
        let inter = iw * ih;
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.area() as f64 + other.area() as f64 - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}
