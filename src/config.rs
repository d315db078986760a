use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{OverlayError, OverlayResult};
use crate::perception::types::SurfaceBounds;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "RVR_OVERLAY_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// How the camera image is laid out inside the preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Stretch to fill, ignoring aspect ratio.
    Resize,
    /// Fit inside the surface, letterboxing the remainder.
    ResizeAspect,
    /// Fill the surface, cropping the overflow.
    #[default]
    ResizeAspectFill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default)]
    pub gravity: VideoGravity,
    /// Initial surface size in points; the UI may resize it at runtime.
    #[serde(default = "default_surface_width")]
    pub surface_width: f64,
    #[serde(default = "default_surface_height")]
    pub surface_height: f64,
}

impl PreviewConfig {
    pub fn surface_bounds(&self) -> SurfaceBounds {
        SurfaceBounds::new(self.surface_width, self.surface_height)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            gravity: VideoGravity::default(),
            surface_width: default_surface_width(),
            surface_height: default_surface_height(),
        }
    }
}

fn default_surface_width() -> f64 {
    800.0
}

fn default_surface_height() -> f64 {
    500.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of the frame event channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Append every published overlay to a JSONL session file.
    #[serde(default)]
    pub record_overlays: bool,
    /// Directory for session files. Defaults to the platform data dir.
    #[serde(default)]
    pub record_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            record_overlays: false,
            record_dir: None,
        }
    }
}

fn default_channel_capacity() -> usize {
    32
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON-lines file of detection batches; stdin when absent.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Where to write a PNG of the last published overlay.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

fn resolve_config_path() -> OverlayResult<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found via {CONFIG_ENV}");
            return Ok(candidate);
        }
        return Err(OverlayError::Config(format!(
            "{CONFIG_ENV} points at missing file {}",
            candidate.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("rvr-overlay").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(OverlayError::Config(
        "config.toml not found next to executable, in working directory or user config dir".into(),
    ))
}

pub fn load_config_from(path: &Path) -> OverlayResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        gravity = ?config.preview.gravity,
        "config loaded"
    );
    Ok(config)
}

pub fn load_config() -> OverlayResult<AppConfig> {
    let path = resolve_config_path()?;
    load_config_from(&path)
}

/// Like [`load_config`], but a missing file yields the defaults.
/// A file that exists and fails to parse is still an error.
pub fn load_config_or_default() -> OverlayResult<AppConfig> {
    match load_config() {
        Ok(cfg) => Ok(cfg),
        Err(OverlayError::Config(msg)) => {
            tracing::info!(reason = %msg, "using default config");
            Ok(AppConfig::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.preview.gravity, VideoGravity::ResizeAspectFill);
        assert_eq!(cfg.preview.surface_width, 800.0);
        assert_eq!(cfg.preview.surface_height, 500.0);
        assert_eq!(cfg.pipeline.channel_capacity, 32);
        assert!(!cfg.pipeline.record_overlays);
        assert!(cfg.replay.input.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let src = r#"
            [preview]
            gravity = "resize_aspect"
            surface_width = 1280.0
            surface_height = 720.0

            [pipeline]
            channel_capacity = 4
            record_overlays = true
            record_dir = "/tmp/sessions"

            [replay]
            input = "detections.jsonl"
            snapshot_path = "overlay.png"
        "#;
        let cfg: AppConfig = toml::from_str(src).unwrap();
        assert_eq!(cfg.preview.gravity, VideoGravity::ResizeAspect);
        assert_eq!(cfg.preview.surface_bounds(), SurfaceBounds::new(1280.0, 720.0));
        assert_eq!(cfg.pipeline.channel_capacity, 4);
        assert!(cfg.pipeline.record_overlays);
        assert_eq!(cfg.pipeline.record_dir, Some(PathBuf::from("/tmp/sessions")));
        assert_eq!(cfg.replay.input, Some(PathBuf::from("detections.jsonl")));
        assert_eq!(cfg.replay.snapshot_path, Some(PathBuf::from("overlay.png")));
    }

    #[test]
    fn load_from_file_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[preview\ngravity = 3").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, OverlayError::TomlDe(_)));
    }

    #[test]
    fn load_from_file_reads_gravity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[preview]\ngravity = \"resize\"\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.preview.gravity, VideoGravity::Resize);
    }
}
