//! Bridge configuration
//!
//! Read from a `live2d.toml` next to the host app's assets, or built in code.
//! Every key is optional:
//!
//! ```toml
//! queue_capacity = 64
//! max_commands_per_tick = 32
//! canvas_width_threshold = 1.0
//! clear_color = [0.0, 0.0, 0.0, 0.0]
//! target_fps = 60
//!
//! [surface]
//! translucent = true
//! ```

use std::fs;
use std::path::Path;

use live2d_platform::SurfaceConfig;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Tunables for one view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum number of commands waiting for the render loop
    pub queue_capacity: usize,
    /// Commands applied per frame before the rest are deferred
    pub max_commands_per_tick: usize,
    /// Native canvas width above which portrait surfaces fit by width
    pub canvas_width_threshold: f32,
    /// RGBA clear color for every frame
    pub clear_color: [f32; 4],
    /// Frame rate for the background frame driver
    pub target_fps: u32,
    /// Embedded surface setup
    pub surface: SurfaceConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_commands_per_tick: 32,
            canvas_width_threshold: 1.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            target_fps: 60,
            surface: SurfaceConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BridgeConfig =
            toml::from_str(text).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or fall back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(BridgeError::Config("queue_capacity must be at least 1".into()));
        }
        if self.max_commands_per_tick == 0 {
            return Err(BridgeError::Config(
                "max_commands_per_tick must be at least 1".into(),
            ));
        }
        if self.target_fps == 0 {
            return Err(BridgeError::Config("target_fps must be at least 1".into()));
        }
        Ok(())
    }

    /// Set the queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-tick drain cap
    pub fn max_commands_per_tick(mut self, max: usize) -> Self {
        self.max_commands_per_tick = max;
        self
    }

    /// Set the frame driver rate
    pub fn target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }
}
