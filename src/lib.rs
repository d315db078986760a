pub mod config;
pub mod errors;
pub mod overlay_engine;
pub mod perception;
pub mod replay;

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::errors::{OverlayError, OverlayResult};
use crate::overlay_engine::engine::OverlayEngine;
use crate::overlay_engine::event_bus::OverlayBus;
use crate::overlay_engine::history::OverlayRecorder;
use crate::overlay_engine::state::OverlaySnapshot;

/// Entry point for the demo host: replays detector output through the
/// overlay pipeline and prints every published overlay as a JSON line.
pub fn run() -> OverlayResult<()> {
    // Load .env first so it can set RUST_LOG and the config path.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load_config_or_default()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_replay(cfg))
}

async fn run_replay(cfg: AppConfig) -> OverlayResult<()> {
    let last = match &cfg.replay.input {
        Some(path) => {
            tracing::info!(path = %path.display(), "replaying detections from file");
            let file = tokio::fs::File::open(path).await?;
            replay_to_writer(&cfg, BufReader::new(file), std::io::stdout()).await?
        }
        None => {
            tracing::info!("replaying detections from stdin");
            let stdin = BufReader::new(tokio::io::stdin());
            replay_to_writer(&cfg, stdin, std::io::stdout()).await?
        }
    };

    if let Some(path) = &cfg.replay.snapshot_path {
        write_snapshot(path, &last).await?;
    }
    Ok(())
}

/// Replay `reader` through a fresh bus and engine, writing one JSON line per
/// published overlay to `out`. Returns the last published overlay.
async fn replay_to_writer<R, W>(
    cfg: &AppConfig,
    reader: R,
    out: W,
) -> OverlayResult<OverlaySnapshot>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut bus = OverlayBus::new(cfg.pipeline.channel_capacity, cfg.preview.surface_bounds());
    let frame_tx = bus.frame_sender();
    let overlays = bus.tap();
    let last_rx = bus.subscribe();

    let recorder = if cfg.pipeline.record_overlays {
        Some(match &cfg.pipeline.record_dir {
            Some(dir) => OverlayRecorder::in_dir(dir)?,
            None => OverlayRecorder::new()?,
        })
    } else {
        None
    };

    let mut engine = OverlayEngine::new(bus, cfg.preview.gravity).with_recorder(recorder);
    tracing::info!("spawning overlay engine task");
    let engine_task = tokio::spawn(async move { engine.run_loop().await });

    // The sender is dropped with this block even if replay fails midway,
    // so the engine always terminates.
    let replay = async move { replay::replay_lines(reader, &frame_tx).await };
    let (forwarded, printed) = tokio::join!(replay, write_overlays(overlays, out));

    let frames = engine_task
        .await
        .map_err(|e| OverlayError::Channel(format!("engine task join: {e}")))?;
    let forwarded = forwarded?;
    let printed = printed?;
    tracing::info!(forwarded, frames, printed, "replay complete");

    let last = last_rx.borrow().clone();
    Ok(last)
}

/// Write every snapshot from `overlays` as a JSON line until the engine exits.
async fn write_overlays<W: Write>(
    mut overlays: mpsc::UnboundedReceiver<OverlaySnapshot>,
    mut out: W,
) -> OverlayResult<usize> {
    let mut written = 0usize;
    while let Some(snapshot) = overlays.recv().await {
        let line = serde_json::to_string(&snapshot)?;
        writeln!(out, "{line}")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// Render `snapshot` to a PNG at `path`. A degenerate surface has nothing
/// to draw and is skipped. Returns whether a file was written.
async fn write_snapshot(path: &Path, snapshot: &OverlaySnapshot) -> OverlayResult<bool> {
    if snapshot.bounds.is_degenerate() {
        tracing::warn!(
            path = %path.display(),
            width = snapshot.bounds.width,
            height = snapshot.bounds.height,
            "degenerate surface, overlay snapshot skipped"
        );
        return Ok(false);
    }
    let png = perception::annotator::render_overlay_png(snapshot.bounds, &snapshot.rects)?;
    tokio::fs::write(path, png).await?;
    tracing::info!(
        path = %path.display(),
        rects = snapshot.rects.len(),
        "overlay snapshot written"
    );
    Ok(true)
}
