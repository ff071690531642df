//! Scanner configuration
//!
//! One component covers both viewfinder variants: crop-to-window with a short
//! cycle, and full-frame with a longer one. Files are JSON; any field left out
//! keeps its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decode::Extraction;
use crate::error::{Result, ScanError};
use crate::mapper::WindowConfig;
use crate::overlay::OverlayStyle;
use crate::source::CameraConstraints;

/// Delay between cycles when cropping to the scan window
pub const CROPPED_CYCLE_DELAY_MS: u64 = 200;
/// Delay between cycles when decoding full frames
pub const FULL_FRAME_CYCLE_DELAY_MS: u64 = 500;

/// Everything the scan loop needs to know up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Which pixels go to the decoder
    pub extraction: Extraction,
    /// Pause after each render, in milliseconds
    pub cycle_delay_ms: u64,
    /// Scan window size relative to the viewport
    pub window: WindowConfig,
    /// Constraints used when opening the source
    pub constraints: CameraConstraints,
    /// Overlay colours and stroke width
    pub style: OverlayStyle,
    /// Stop after this many cycles (unbounded when absent)
    pub max_cycles: Option<u64>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::cropped()
    }
}

impl ScannerConfig {
    /// Crop to the scan window, 200 ms between cycles
    pub fn cropped() -> Self {
        Self {
            extraction: Extraction::CropToWindow,
            cycle_delay_ms: CROPPED_CYCLE_DELAY_MS,
            window: WindowConfig::default(),
            constraints: CameraConstraints::default(),
            style: OverlayStyle::default(),
            max_cycles: None,
        }
    }

    /// Decode the whole frame, 500 ms between cycles
    pub fn full_frame() -> Self {
        Self {
            extraction: Extraction::FullFrame,
            cycle_delay_ms: FULL_FRAME_CYCLE_DELAY_MS,
            ..Self::cropped()
        }
    }

    /// Pause after each render
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        if self.constraints.max_width == 0 || self.constraints.max_height == 0 {
            return Err(ScanError::InvalidConfig(format!(
                "camera constraints must be non-zero, got {}x{}",
                self.constraints.max_width, self.constraints.max_height
            )));
        }
        if self.style.line_width == 0 {
            return Err(ScanError::InvalidConfig("line_width must be at least 1".into()));
        }
        if self.max_cycles == Some(0) {
            return Err(ScanError::InvalidConfig("max_cycles must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
