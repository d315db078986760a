use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::overlay_engine::state::{FrameEvent, OverlaySnapshot};
use crate::perception::types::SurfaceBounds;

/// Channels connecting the detector, the UI and the overlay engine.
///
/// - frames: single producer (detector) to the engine, bounded.
/// - surface: written by the UI on layout changes, read by the engine.
/// - overlay: written by the engine only, observed by any number of readers.
/// - taps: lossless per-snapshot streams for consumers that need every overlay.
pub struct OverlayBus {
    pub(crate) frame_tx: mpsc::Sender<FrameEvent>,
    pub(crate) frame_rx: mpsc::Receiver<FrameEvent>,
    pub(crate) surface_tx: Arc<watch::Sender<SurfaceBounds>>,
    pub(crate) overlay_tx: watch::Sender<OverlaySnapshot>,
    pub(crate) taps: Vec<mpsc::UnboundedSender<OverlaySnapshot>>,
}

impl OverlayBus {
    pub fn new(capacity: usize, initial_bounds: SurfaceBounds) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(capacity.max(1));
        let (surface_tx, _) = watch::channel(initial_bounds);
        let (overlay_tx, _) = watch::channel(OverlaySnapshot::empty(initial_bounds));

        Self {
            frame_tx,
            frame_rx,
            surface_tx: Arc::new(surface_tx),
            overlay_tx,
            taps: Vec::new(),
        }
    }

    pub fn frame_sender(&self) -> mpsc::Sender<FrameEvent> {
        self.frame_tx.clone()
    }

    pub fn surface_handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            tx: self.surface_tx.clone(),
        }
    }

    /// Latest-value view of the overlay; intermediate snapshots may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.overlay_tx.subscribe()
    }

    /// Every published snapshot, in order. The stream ends when the engine exits.
    pub fn tap(&mut self) -> mpsc::UnboundedReceiver<OverlaySnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.taps.push(tx);
        rx
    }
}

/// UI-side handle for committing preview surface size changes.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: Arc<watch::Sender<SurfaceBounds>>,
}

impl SurfaceHandle {
    /// Commit new bounds. Batches already in flight keep the bounds they
    /// snapshotted; the next batch sees these.
    pub fn resize(&self, width: f64, height: f64) {
        let bounds = SurfaceBounds::new(width, height);
        let previous = self.tx.send_replace(bounds);
        if previous != bounds {
            tracing::debug!(width, height, "surface resized");
        }
    }

    pub fn current(&self) -> SurfaceBounds {
        *self.tx.borrow()
    }
}
