use serde::{Deserialize, Serialize};

use crate::perception::types::{DetectionBatch, NormalizedDisplayRect, SurfaceBounds};

/// Events delivered by the detector side, one per processed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    Detections(DetectionBatch),
    /// The frame had no image buffer; treated as "no detections".
    MissingBuffer { frame_id: u64 },
    /// Layout change that must land between the frames around it.
    Resize(SurfaceBounds),
    Stop,
}

/// The published overlay. Each new snapshot replaces the previous one whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    /// `None` until the first frame has been processed.
    pub frame_id: Option<u64>,
    pub bounds: SurfaceBounds,
    pub rects: Vec<NormalizedDisplayRect>,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl OverlaySnapshot {
    pub fn empty(bounds: SurfaceBounds) -> Self {
        Self {
            frame_id: None,
            bounds,
            rects: Vec::new(),
            published_at: chrono::Utc::now(),
        }
    }

    pub fn for_frame(
        frame_id: u64,
        bounds: SurfaceBounds,
        rects: Vec<NormalizedDisplayRect>,
    ) -> Self {
        Self {
            frame_id: Some(frame_id),
            bounds,
            rects,
            published_at: chrono::Utc::now(),
        }
    }
}
