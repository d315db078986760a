/// Detection replay: feeds recorded detector output into the overlay engine.
///
/// Input is JSON lines, one event per line:
///
/// - a [`DetectionBatch`] object;
/// - `{"frame_id": N, "missing_buffer": true}` for a frame with no image;
/// - `{"surface": {"width": W, "height": H}}` to simulate a layout change.
///
/// Blank lines and lines starting with `#` are ignored. Resizes travel on
/// the frame channel so they take effect exactly where they appear.
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::errors::{OverlayError, OverlayResult};
use crate::overlay_engine::state::FrameEvent;
use crate::perception::types::{DetectionBatch, SurfaceBounds};

pub fn parse_batch_line(line: &str) -> OverlayResult<Option<FrameEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let json: serde_json::Value =
        serde_json::from_str(line).map_err(|e| OverlayError::Replay(e.to_string()))?;

    if let Some(surface) = json.get("surface") {
        let bounds: SurfaceBounds = serde_json::from_value(surface.clone())
            .map_err(|e| OverlayError::Replay(format!("surface: {e}")))?;
        return Ok(Some(FrameEvent::Resize(bounds)));
    }

    if json["missing_buffer"].as_bool() == Some(true) {
        let frame_id = json["frame_id"]
            .as_u64()
            .ok_or_else(|| OverlayError::Replay("missing_buffer line without frame_id".into()))?;
        return Ok(Some(FrameEvent::MissingBuffer { frame_id }));
    }

    let batch: DetectionBatch =
        serde_json::from_value(json).map_err(|e| OverlayError::Replay(e.to_string()))?;
    Ok(Some(FrameEvent::Detections(batch)))
}

/// Forward every event in `reader` to `frames`, then send `Stop`.
/// Malformed lines are logged and skipped. Returns the number of events
/// forwarded, not counting the final `Stop`.
pub async fn replay_lines<R>(reader: R, frames: &mpsc::Sender<FrameEvent>) -> OverlayResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut forwarded = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_batch_line(&line) {
            Ok(Some(event)) => {
                frames
                    .send(event)
                    .await
                    .map_err(|e| OverlayError::Channel(format!("frame channel closed: {e}")))?;
                forwarded += 1;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed replay line");
            }
        }
    }

    frames
        .send(FrameEvent::Stop)
        .await
        .map_err(|e| OverlayError::Channel(format!("frame channel closed: {e}")))?;
    tracing::info!(lines = line_no, events = forwarded, "replay finished");
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoGravity;
    use crate::overlay_engine::engine::OverlayEngine;
    use crate::overlay_engine::event_bus::OverlayBus;
    use crate::perception::types::{ImageSize, RawDetectionBox};

    const DEMO: &str = include_str!("../demos/detections.jsonl");

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_batch_line("").unwrap(), None);
        assert_eq!(parse_batch_line("   ").unwrap(), None);
        assert_eq!(parse_batch_line("# recorded 2024-05-01").unwrap(), None);
    }

    #[test]
    fn parses_detection_batch() {
        let line = concat!(
            r#"{"frame_id":4,"source":{"width":1920,"height":1080},"#,
            r#""boxes":[{"origin_x":0.2,"origin_y":0.3,"width":0.1,"height":0.1}]}"#,
        );
        match parse_batch_line(line).unwrap() {
            Some(FrameEvent::Detections(batch)) => {
                assert_eq!(batch.frame_id, 4);
                assert_eq!(batch.source, ImageSize::new(1920, 1080));
                assert_eq!(batch.boxes, vec![RawDetectionBox::new(0.2, 0.3, 0.1, 0.1)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_missing_buffer_and_resize() {
        assert_eq!(
            parse_batch_line(r#"{"frame_id":12,"missing_buffer":true}"#).unwrap(),
            Some(FrameEvent::MissingBuffer { frame_id: 12 })
        );
        assert_eq!(
            parse_batch_line(r#"{"surface":{"width":640.0,"height":480.0}}"#).unwrap(),
            Some(FrameEvent::Resize(SurfaceBounds::new(640.0, 480.0)))
        );
    }

    #[test]
    fn reports_malformed_lines() {
        assert!(matches!(
            parse_batch_line("{not json"),
            Err(OverlayError::Replay(_))
        ));
        assert!(matches!(
            parse_batch_line(r#"{"frame_id":"x"}"#),
            Err(OverlayError::Replay(_))
        ));
        assert!(matches!(
            parse_batch_line(r#"{"missing_buffer":true}"#),
            Err(OverlayError::Replay(_))
        ));
    }

    #[tokio::test]
    async fn replay_forwards_events_in_file_order() {
        let input = concat!(
            "# header\n",
            r#"{"frame_id":1,"source":{"width":800,"height":500},"boxes":[]}"#,
            "\n",
            "garbage\n",
            r#"{"surface":{"width":320.0,"height":200.0}}"#,
            "\n",
            r#"{"frame_id":2,"missing_buffer":true}"#,
            "\n",
        );
        let mut bus = OverlayBus::new(8, SurfaceBounds::new(800.0, 500.0));
        let tx = bus.frame_sender();

        let forwarded = replay_lines(input.as_bytes(), &tx).await.unwrap();
        assert_eq!(forwarded, 3);

        match bus.frame_rx.recv().await {
            Some(FrameEvent::Detections(batch)) => assert_eq!(batch.frame_id, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            bus.frame_rx.recv().await,
            Some(FrameEvent::Resize(SurfaceBounds::new(320.0, 200.0)))
        );
        assert_eq!(
            bus.frame_rx.recv().await,
            Some(FrameEvent::MissingBuffer { frame_id: 2 })
        );
        assert_eq!(bus.frame_rx.recv().await, Some(FrameEvent::Stop));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn demo_replay_keeps_bounds_per_frame() {
        let mut bus = OverlayBus::new(8, SurfaceBounds::new(800.0, 500.0));
        let tx = bus.frame_sender();
        let mut tap = bus.tap();
        let mut engine = OverlayEngine::new(bus, VideoGravity::ResizeAspectFill);
        let engine_task = tokio::spawn(async move { engine.run_loop().await });

        replay_lines(DEMO.as_bytes(), &tx).await.unwrap();
        drop(tx);
        assert_eq!(engine_task.await.unwrap(), 4);

        let mut bounds_by_frame = Vec::new();
        while let Some(snapshot) = tap.recv().await {
            bounds_by_frame.push((snapshot.frame_id, snapshot.bounds));
        }
        let before = SurfaceBounds::new(800.0, 500.0);
        let after = SurfaceBounds::new(500.0, 500.0);
        assert_eq!(
            bounds_by_frame,
            vec![
                (Some(1), before),
                (Some(2), before),
                (Some(3), before),
                (Some(4), after),
            ]
        );
    }
}
