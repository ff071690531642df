use thiserror::Error;

use crate::models::PixelRect;

/// Reasons a frame source refuses to start.
///
/// Covers everything the host reports when the stream is requested: the user
/// said no, there is nothing to open, or the device cannot honour the
/// requested constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Access to the device was refused.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No device matched the request.
    #[error("no camera device found: {0}")]
    NoDevice(String),

    /// The device exists but cannot satisfy the requested constraints.
    #[error("constraints cannot be satisfied: {0}")]
    ConstraintsUnsatisfiable(String),
}

/// Errors produced by the scan pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The frame source could not be acquired.
    #[error("camera unavailable: {0}")]
    Camera(#[from] CameraError),

    /// The decoder backend failed.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The overlay surface rejected a draw.
    #[error("render failed: {0}")]
    Render(String),

    /// Viewport or video dimensions cannot be mapped.
    #[error(
        "degenerate geometry: viewport {viewport_width}x{viewport_height}, \
         video {video_width}x{video_height}"
    )]
    DegenerateGeometry {
        /// Viewport width in CSS pixels.
        viewport_width: f32,
        /// Viewport height in CSS pixels.
        viewport_height: f32,
        /// Native video width.
        video_width: u32,
        /// Native video height.
        video_height: u32,
    },

    /// The scan window has no pixels inside the frame.
    #[error("scan window {0:?} has no pixels inside the frame")]
    EmptyWindow(PixelRect),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A frame could not be loaded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `run` was called on a loop that already ended.
    #[error("scan loop already {0}")]
    LoopEnded(String),

    /// A blocking worker panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScanError>;
