use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use stagehand_coroutine::SchedulerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("target_fps must be at least 1")]
    ZeroFps,
}

/// Frame loop configuration. Every field has a default, so a partial JSON
/// file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Frames per second the headless loop paces itself to.
    pub target_fps: u32,
    /// Stop after this many frames. `None` runs until the scheduler is idle.
    pub max_frames: Option<u64>,
    /// Number of frame times kept for avg/min/max.
    pub timer_history: usize,
    /// Coroutine scheduler settings, nested as `"scheduler": { .. }`.
    pub scheduler: SchedulerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: None,
            timer_history: 120,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded runtime config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}
