use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::config::VideoGravity;
use crate::overlay_engine::event_bus::OverlayBus;
use crate::overlay_engine::history::OverlayRecorder;
use crate::overlay_engine::state::{FrameEvent, OverlaySnapshot};
use crate::perception::gravity::PreviewGeometry;
use crate::perception::transform::transform_batch;
use crate::perception::types::{DetectionBatch, SurfaceBounds};

/// Consumes frame events in order, transforms each batch and publishes the
/// result as the new overlay.
pub struct OverlayEngine {
    frame_rx: mpsc::Receiver<FrameEvent>,
    surface_tx: Arc<watch::Sender<SurfaceBounds>>,
    overlay_tx: watch::Sender<OverlaySnapshot>,
    taps: Vec<mpsc::UnboundedSender<OverlaySnapshot>>,
    gravity: VideoGravity,
    recorder: Option<OverlayRecorder>,
    frames_processed: u64,
}

impl OverlayEngine {
    /// Takes the receiving side of `bus`. Senders, surface handles and
    /// subscribers must be obtained from the bus beforehand.
    pub fn new(bus: OverlayBus, gravity: VideoGravity) -> Self {
        let OverlayBus {
            frame_tx,
            frame_rx,
            surface_tx,
            overlay_tx,
            taps,
        } = bus;
        // The engine must not keep its own input channel alive.
        drop(frame_tx);

        Self {
            frame_rx,
            surface_tx,
            overlay_tx,
            taps,
            gravity,
            recorder: None,
            frames_processed: 0,
        }
    }

    pub fn with_recorder(mut self, recorder: Option<OverlayRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Transform one batch against the currently committed surface bounds
    /// and publish it. Returns the published snapshot.
    pub fn process_batch(&mut self, batch: &DetectionBatch) -> OverlaySnapshot {
        let bounds = *self.surface_tx.borrow();

        let invalid = batch.boxes.iter().filter(|b| !b.is_valid()).count();
        if invalid > 0 {
            tracing::warn!(
                frame_id = batch.frame_id,
                invalid,
                "detector produced boxes outside the unit square"
            );
        }

        let geometry = PreviewGeometry::new(batch.source, bounds, self.gravity);
        let rects = transform_batch(&batch.boxes, bounds, &geometry);
        tracing::debug!(
            frame_id = batch.frame_id,
            detections = batch.boxes.len(),
            rects = rects.len(),
            "batch transformed"
        );

        self.publish(OverlaySnapshot::for_frame(batch.frame_id, bounds, rects))
    }

    /// A frame without an image buffer clears the overlay.
    pub fn process_missing(&mut self, frame_id: u64) -> OverlaySnapshot {
        let bounds = *self.surface_tx.borrow();
        tracing::debug!(frame_id, "frame had no image buffer");
        self.publish(OverlaySnapshot::for_frame(frame_id, bounds, Vec::new()))
    }

    /// Commit new surface bounds in stream order, so frames queued before
    /// the resize keep the bounds they were captured under.
    pub fn apply_resize(&mut self, bounds: SurfaceBounds) {
        tracing::debug!(
            width = bounds.width,
            height = bounds.height,
            "surface resized in stream"
        );
        self.surface_tx.send_replace(bounds);
    }

    fn publish(&mut self, snapshot: OverlaySnapshot) -> OverlaySnapshot {
        self.frames_processed += 1;
        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.append(&snapshot) {
                tracing::warn!(error = %e, "overlay recording failed");
            }
        }
        self.taps.retain(|tap| tap.send(snapshot.clone()).is_ok());
        self.overlay_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Process events until `Stop` or until every frame sender is dropped.
    /// Returns the number of frames processed.
    pub async fn run_loop(&mut self) -> u64 {
        tracing::info!(gravity = ?self.gravity, "overlay engine started");
        loop {
            match self.frame_rx.recv().await {
                Some(FrameEvent::Detections(batch)) => {
                    self.process_batch(&batch);
                }
                Some(FrameEvent::MissingBuffer { frame_id }) => {
                    self.process_missing(frame_id);
                }
                Some(FrameEvent::Resize(bounds)) => {
                    self.apply_resize(bounds);
                }
                Some(FrameEvent::Stop) => {
                    tracing::info!("stop requested");
                    break;
                }
                None => {
                    tracing::info!("frame channel closed");
                    break;
                }
            }
        }
        tracing::info!(frames = self.frames_processed, "overlay engine exited");
        self.frames_processed
    }
}
