use serde::{Deserialize, Serialize};

/// Display area in CSS (layout) pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: f32,
    /// Height in CSS pixels
    pub height: f32,
}

impl Viewport {
    /// Create a viewport from CSS pixel dimensions
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Create a viewport from physical pixels and a device pixel ratio
    ///
    /// A non-positive or non-finite ratio is treated as 1.0.
    pub fn from_physical(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: width as f32 / dpr,
            height: height as f32 / dpr,
        }
    }

    /// True when either side is zero, negative or not a number
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }
}

/// Native resolution of the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoDimensions {
    /// Width in video pixels
    pub width: u32,
    /// Height in video pixels
    pub height: u32,
}

impl VideoDimensions {
    /// Create video dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for VideoDimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}
