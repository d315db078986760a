use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::OverlayResult;
use crate::overlay_engine::state::OverlaySnapshot;

/// Appends every published overlay to `overlay_<session>.jsonl`.
pub struct OverlayRecorder {
    pub session_id: String,
    file_path: PathBuf,
}

impl OverlayRecorder {
    /// Record into the platform data directory (or the working directory).
    pub fn new() -> OverlayResult<Self> {
        Self::in_dir(&data_dir_or_cwd())
    }

    pub fn in_dir(dir: &Path) -> OverlayResult<Self> {
        std::fs::create_dir_all(dir)?;
        let session_id = uuid::Uuid::new_v4().to_string();
        let file_path = dir.join(format!("overlay_{session_id}.jsonl"));
        tracing::info!(path = %file_path.display(), "recording overlays");
        Ok(Self {
            session_id,
            file_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn append(&self, snapshot: &OverlaySnapshot) -> OverlayResult<()> {
        let line = serde_json::to_string(snapshot)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        tracing::trace!(
            path = %self.file_path.display(),
            frame_id = ?snapshot.frame_id,
            "overlay recorded"
        );
        Ok(())
    }
}

/// `<data_local_dir>/rvr-overlay/sessions`, falling back to the working
/// directory.
fn data_dir_or_cwd() -> PathBuf {
    if let Some(base) = dirs::data_local_dir() {
        return base.join("rvr-overlay").join("sessions");
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
