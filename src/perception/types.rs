use serde::{Deserialize, Serialize};

/// Slack allowed when checking unit-range bounds on detector output.
const UNIT_EPSILON: f64 = 1e-6;

/// Detector output box: unit-normalized, origin at the **bottom-left** of the
/// analyzed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetectionBox {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl RawDetectionBox {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// True when the box lies inside the unit square with non-negative size.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (-UNIT_EPSILON..=1.0 + UNIT_EPSILON).contains(&v);
        in_unit(self.origin_x)
            && in_unit(self.origin_y)
            && self.width >= 0.0
            && self.height >= 0.0
            && self.origin_x + self.width <= 1.0 + UNIT_EPSILON
            && self.origin_y + self.height <= 1.0 + UNIT_EPSILON
    }
}

/// Unit-normalized rectangle with its origin at the **top-left** of the
/// analyzed image. This is the input a [`SurfaceMapper`] expects.
///
/// [`SurfaceMapper`]: crate::perception::traits::SurfaceMapper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRect {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl UnitRect {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Inverse of the vertical flip: back to a bottom-left-origin box.
    pub fn to_bottom_left(&self) -> RawDetectionBox {
        RawDetectionBox {
            origin_x: self.origin_x,
            origin_y: 1.0 - self.origin_y - self.height,
            width: self.width,
            height: self.height,
        }
    }
}

/// Rectangle in the destination surface's local point space, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMappedBox {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayMappedBox {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }
}

/// Overlay rectangle: unit-normalized, top-left origin, relative to the
/// destination surface bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDisplayRect {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedDisplayRect {
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Scale back to surface points (`origin * size`, `size * size`).
    pub fn to_surface(&self, bounds: SurfaceBounds) -> DisplayMappedBox {
        DisplayMappedBox {
            origin_x: self.origin_x * bounds.width,
            origin_y: self.origin_y * bounds.height,
            width: self.width * bounds.width,
            height: self.height * bounds.height,
        }
    }
}

/// Destination surface size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBounds {
    pub width: f64,
    pub height: f64,
}

impl SurfaceBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero-area (or NaN) surfaces cannot be normalized against.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Pixel dimensions of the image the detector analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// All boxes produced from one processed frame, in detector order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    pub frame_id: u64,
    pub source: ImageSize,
    #[serde(default)]
    pub boxes: Vec<RawDetectionBox>,
    #[serde(default = "chrono::Utc::now")]
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl DetectionBatch {
    pub fn new(frame_id: u64, source: ImageSize, boxes: Vec<RawDetectionBox>) -> Self {
        Self {
            frame_id,
            source,
            boxes,
            captured_at: chrono::Utc::now(),
        }
    }
}
