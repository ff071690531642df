//! Scan-window mapping
//!
//! The viewfinder shows the video scaled to fit the viewport ("contain") and
//! centred, so one axis is letterboxed. The scan window is defined as a fixed
//! percentage of the *viewport*, centred, and has to be converted into the
//! video's native pixel grid before cropping. Backing-store pixels and layout
//! pixels differ per axis; the scale factors always come from the rendered
//! element size, never from an assumed 1:1 ratio.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ScanError};
use crate::models::{PixelRect, Point, Rect, VideoDimensions, Viewport};

/// Default scan window width as a percentage of the viewport width
pub const DEFAULT_PERCENT_WIDE: f32 = 50.0;
/// Default scan window height as a percentage of the viewport height
pub const DEFAULT_PERCENT_TALL: f32 = 8.0;

/// Size of the scan window relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Percentage of the viewport width, in (0, 100]
    pub percent_wide: f32,
    /// Percentage of the viewport height, in (0, 100]
    pub percent_tall: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            percent_wide: DEFAULT_PERCENT_WIDE,
            percent_tall: DEFAULT_PERCENT_TALL,
        }
    }
}

impl WindowConfig {
    /// Reject percentages outside (0, 100]
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("percent_wide", self.percent_wide),
            ("percent_tall", self.percent_tall),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(ScanError::InvalidConfig(format!(
                    "{name} must be in (0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Which axis carries the empty bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Letterbox {
    /// Video spans the full viewport width; bars above and below
    Vertical,
    /// Video spans the full viewport height; bars left and right
    Horizontal,
}

/// Where the video element ends up on screen, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLayout {
    /// Top-left corner of the displayed video inside the viewport
    pub offset: Point,
    /// Rendered width
    pub width: f32,
    /// Rendered height
    pub height: f32,
    /// Letterbox orientation
    pub letterbox: Letterbox,
}

impl DisplayLayout {
    /// Fit `video` inside `viewport` preserving aspect ratio, centred
    pub fn fit(viewport: Viewport, video: VideoDimensions) -> Self {
        let vw = video.width as f32;
        let vh = video.height as f32;
        // Cross-multiplied aspect comparison, no division by a zero side.
        if viewport.width * vh < viewport.height * vw {
            let height = viewport.width * vh / vw;
            Self {
                offset: Point::new(0.0, (viewport.height - height) / 2.0),
                width: viewport.width,
                height,
                letterbox: Letterbox::Vertical,
            }
        } else {
            let width = viewport.height * vw / vh;
            Self {
                offset: Point::new((viewport.width - width) / 2.0, 0.0),
                width,
                height: viewport.height,
                letterbox: Letterbox::Horizontal,
            }
        }
    }

    /// Use a measured element size and position instead of the computed fit
    pub fn measured(offset: Point, width: f32, height: f32) -> Self {
        let letterbox = if offset.y.abs() > offset.x.abs() {
            Letterbox::Vertical
        } else {
            Letterbox::Horizontal
        };
        Self {
            offset,
            width,
            height,
            letterbox,
        }
    }

    /// On-screen rectangle of the video
    pub fn rect(&self) -> Rect {
        Rect::new(self.offset.x, self.offset.y, self.width, self.height)
    }
}

/// Immutable result of mapping one viewport onto one video stream
///
/// Recomputed on every resize or stream dimension change and handed by value
/// to the extraction and drawing steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapping {
    viewport: Viewport,
    video: VideoDimensions,
    layout: DisplayLayout,
    scale_x: f32,
    scale_y: f32,
    css_window: Rect,
    video_window: Rect,
}

impl ViewportMapping {
    /// Map the configured window for a video displayed with the default fit
    pub fn compute(
        viewport: Viewport,
        video: VideoDimensions,
        window: &WindowConfig,
    ) -> Result<Self> {
        check_geometry(viewport, video)?;
        Self::with_layout(viewport, video, DisplayLayout::fit(viewport, video), window)
    }

    /// Map the configured window for a video with a known rendered layout
    pub fn with_layout(
        viewport: Viewport,
        video: VideoDimensions,
        layout: DisplayLayout,
        window: &WindowConfig,
    ) -> Result<Self> {
        check_geometry(viewport, video)?;
        if !(layout.width > 0.0 && layout.height > 0.0) {
            return Err(degenerate(viewport, video));
        }
        window.validate()?;

        let scale_x = video.width as f32 / layout.width;
        let scale_y = video.height as f32 / layout.height;

        let css_window = Rect::centered(
            Point::new(viewport.width / 2.0, viewport.height / 2.0),
            viewport.width * window.percent_wide / 100.0,
            viewport.height * window.percent_tall / 100.0,
        );

        let mapped = Rect::new(
            (css_window.left - layout.offset.x) * scale_x,
            (css_window.top - layout.offset.y) * scale_y,
            css_window.width * scale_x,
            css_window.height * scale_y,
        );
        let frame = Rect::new(0.0, 0.0, video.width as f32, video.height as f32);
        let video_window = frame.intersect(&mapped);
        if video_window != mapped {
            warn!(
                ?mapped,
                ?video_window,
                "scan window extends past the letterboxed video, clipped"
            );
        }

        Ok(Self {
            viewport,
            video,
            layout,
            scale_x,
            scale_y,
            css_window,
            video_window,
        })
    }

    /// Viewport this mapping was computed for
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Video dimensions this mapping was computed for
    pub fn video(&self) -> VideoDimensions {
        self.video
    }

    /// Rendered placement of the video
    pub fn layout(&self) -> DisplayLayout {
        self.layout
    }

    /// Backing-store pixels per CSS pixel, per axis
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Scan window in viewport (CSS) coordinates
    pub fn css_window(&self) -> Rect {
        self.css_window
    }

    /// Scan window in video pixel coordinates, clipped to the frame
    pub fn video_window(&self) -> Rect {
        self.video_window
    }

    /// Scan window snapped to whole video pixels
    pub fn pixel_window(&self) -> PixelRect {
        self.video_window
            .to_pixel_rect(self.video.width, self.video.height)
    }

    /// True when part of the window fell outside the displayed video
    pub fn is_clipped(&self) -> bool {
        let unclipped_w = self.css_window.width * self.scale_x;
        let unclipped_h = self.css_window.height * self.scale_y;
        (self.video_window.width - unclipped_w).abs() > 1e-3 * unclipped_w.max(1.0)
            || (self.video_window.height - unclipped_h).abs() > 1e-3 * unclipped_h.max(1.0)
    }

    /// Convert a viewport point into video pixels
    pub fn css_to_video(&self, p: Point) -> Point {
        p.translate(-self.layout.offset.x, -self.layout.offset.y)
            .scale(self.scale_x, self.scale_y)
    }

    /// Convert a video pixel into viewport coordinates
    pub fn video_to_css(&self, p: Point) -> Point {
        p.scale(1.0 / self.scale_x, 1.0 / self.scale_y)
            .offset_by(self.layout.offset)
    }
}

fn check_geometry(viewport: Viewport, video: VideoDimensions) -> Result<()> {
    if viewport.is_degenerate() || video.is_empty() {
        return Err(degenerate(viewport, video));
    }
    Ok(())
}

fn degenerate(viewport: Viewport, video: VideoDimensions) -> ScanError {
    ScanError::DegenerateGeometry {
        viewport_width: viewport.width,
        viewport_height: viewport.height,
        video_width: video.width,
        video_height: video.height,
    }
}
