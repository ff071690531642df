//! Frame sources
//!
//! A `FrameSource` stands in for the camera: it is opened once with a set of
//! constraints and then yields frames at native resolution. Metadata (the
//! stream's dimensions) is whatever the first frame reports.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CameraError, Result, ScanError};
use crate::models::VideoDimensions;
use crate::tools::{frame_paths, load_rgba_within};

/// Which camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Constraints passed when requesting the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConstraints {
    /// Preferred camera
    pub facing: FacingMode,
    /// Largest acceptable frame width
    pub max_width: u32,
    /// Largest acceptable frame height
    pub max_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            max_width: 1920,
            max_height: 1080,
        }
    }
}

impl CameraConstraints {
    /// Reject constraints no device could satisfy
    pub fn check(&self) -> std::result::Result<(), CameraError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CameraError::ConstraintsUnsatisfiable(format!(
                "max resolution {}x{}",
                self.max_width, self.max_height
            )));
        }
        Ok(())
    }

    /// True when a frame of this size respects the maxima
    pub fn admits(&self, dims: VideoDimensions) -> bool {
        dims.width <= self.max_width && dims.height <= self.max_height
    }
}

/// One captured frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number, starting at 0
    pub index: u64,
    /// Pixels at native resolution
    pub image: RgbaImage,
}

impl Frame {
    /// Native dimensions of this frame
    pub fn dimensions(&self) -> VideoDimensions {
        VideoDimensions::new(self.image.width(), self.image.height())
    }
}

/// A camera-like producer of frames
pub trait FrameSource: Send {
    /// Acquire the device. Called once before any frame is requested.
    fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = std::result::Result<(), CameraError>> + Send;

    /// Wait for the next frame
    fn next_frame(&mut self) -> impl Future<Output = Result<Frame>> + Send;
}

/// Replays image files as a looping video feed
///
/// Frames larger than the constraints are downscaled on load, so the native
/// size reported downstream always honours the requested maxima.
#[derive(Debug)]
pub struct ImageSequenceSource {
    root: PathBuf,
    paths: Vec<PathBuf>,
    constraints: CameraConstraints,
    cursor: usize,
    served: u64,
}

impl ImageSequenceSource {
    /// Source backed by an image file or a directory of images
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: Vec::new(),
            constraints: CameraConstraints::default(),
            cursor: 0,
            served: 0,
        }
    }

    /// Path this source reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct frames found on open
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True before a successful open, or when nothing was found
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn acquisition_error(root: &Path, err: io::Error) -> CameraError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{}: {err}", root.display()))
        }
        _ => CameraError::NoDevice(format!("{}: {err}", root.display())),
    }
}

impl FrameSource for ImageSequenceSource {
    async fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> std::result::Result<(), CameraError> {
        constraints.check()?;
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || frame_paths(&root))
            .await
            .map_err(|e| CameraError::NoDevice(e.to_string()))?
            .map_err(|e| acquisition_error(&self.root, e))?;
        if paths.is_empty() {
            return Err(CameraError::NoDevice(format!(
                "no frames under {}",
                self.root.display()
            )));
        }
        info!(
            root = %self.root.display(),
            frames = paths.len(),
            facing = ?constraints.facing,
            "frame source opened"
        );
        self.paths = paths;
        self.constraints = *constraints;
        self.cursor = 0;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame> {
        if self.paths.is_empty() {
            return Err(CameraError::NoDevice(format!(
                "{} was not opened",
                self.root.display()
            ))
            .into());
        }
        let path = self.paths[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.paths.len();
        let (max_w, max_h) = (self.constraints.max_width, self.constraints.max_height);
        let image = tokio::task::spawn_blocking(move || load_rgba_within(&path, max_w, max_h))
            .await??;
        let index = self.served;
        self.served += 1;
        debug!(index, width = image.width(), height = image.height(), "frame loaded");
        Ok(Frame { index, image })
    }
}

/// In-memory frames, cycled in order
///
/// Can be built to reject `open`, which is how acquisition failures are
/// exercised without a device.
#[derive(Debug, Clone, Default)]
pub struct StillFrameSource {
    frames: Vec<RgbaImage>,
    refusal: Option<CameraError>,
    opened: bool,
    served: u64,
}

impl StillFrameSource {
    /// Source that repeats the given frames
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Source whose `open` always fails with `err`
    pub fn refusing(err: CameraError) -> Self {
        Self {
            refusal: Some(err),
            ..Self::default()
        }
    }

    /// Frames handed out so far
    pub fn served(&self) -> u64 {
        self.served
    }
}

impl FrameSource for StillFrameSource {
    async fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> std::result::Result<(), CameraError> {
        if let Some(err) = &self.refusal {
            return Err(err.clone());
        }
        constraints.check()?;
        if self.frames.is_empty() {
            return Err(CameraError::NoDevice("no frames supplied".into()));
        }
        if let Some(oversized) = self
            .frames
            .iter()
            .map(|f| VideoDimensions::new(f.width(), f.height()))
            .find(|d| !constraints.admits(*d))
        {
            return Err(CameraError::ConstraintsUnsatisfiable(format!(
                "frame {}x{} exceeds {}x{}",
                oversized.width, oversized.height, constraints.max_width, constraints.max_height
            )));
        }
        self.opened = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame> {
        if !self.opened {
            return Err(ScanError::Camera(CameraError::NoDevice(
                "source was not opened".into(),
            )));
        }
        let slot = (self.served % self.frames.len() as u64) as usize;
        let frame = Frame {
            index: self.served,
            image: self.frames[slot].clone(),
        };
        self.served += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn still_source_cycles_frames() {
        let mut source = StillFrameSource::new(vec![RgbaImage::new(4, 3), RgbaImage::new(8, 6)]);
        source.open(&CameraConstraints::default()).await.unwrap();
        let dims: Vec<_> = [
            source.next_frame().await.unwrap(),
            source.next_frame().await.unwrap(),
            source.next_frame().await.unwrap(),
        ]
        .iter()
        .map(|f| (f.index, f.dimensions()))
        .collect();
        assert_eq!(
            dims,
            vec![
                (0, VideoDimensions::new(4, 3)),
                (1, VideoDimensions::new(8, 6)),
                (2, VideoDimensions::new(4, 3)),
            ]
        );
    }

    #[tokio::test]
    async fn refusing_source_reports_error() {
        let mut source = StillFrameSource::refusing(CameraError::PermissionDenied("user".into()));
        let err = source.open(&CameraConstraints::default()).await.unwrap_err();
        assert_eq!(err, CameraError::PermissionDenied("user".into()));
        assert!(source.next_frame().await.is_err());
    }

    #[tokio::test]
    async fn oversized_still_frames_violate_constraints() {
        let mut source = StillFrameSource::new(vec![RgbaImage::new(4000, 10)]);
        let err = source.open(&CameraConstraints::default()).await.unwrap_err();
        assert!(matches!(err, CameraError::ConstraintsUnsatisfiable(_)));
    }

    #[tokio::test]
    async fn zero_constraints_are_unsatisfiable() {
        let mut source = StillFrameSource::new(vec![RgbaImage::new(4, 4)]);
        let constraints = CameraConstraints {
            max_width: 0,
            ..CameraConstraints::default()
        };
        assert!(matches!(
            source.open(&constraints).await,
            Err(CameraError::ConstraintsUnsatisfiable(_))
        ));
    }

    #[tokio::test]
    async fn image_sequence_missing_root_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageSequenceSource::new(dir.path().join("missing"));
        let err = source.open(&CameraConstraints::default()).await.unwrap_err();
        assert!(matches!(err, CameraError::NoDevice(_)));
    }

    #[tokio::test]
    async fn image_sequence_empty_dir_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageSequenceSource::new(dir.path());
        assert!(matches!(
            source.open(&CameraConstraints::default()).await,
            Err(CameraError::NoDevice(_))
        ));
    }

    #[tokio::test]
    async fn image_sequence_loops_and_downscales() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(64, 32).save(dir.path().join("0.png")).unwrap();
        RgbaImage::new(16, 16).save(dir.path().join("1.png")).unwrap();
        let mut source = ImageSequenceSource::new(dir.path());
        let constraints = CameraConstraints {
            max_width: 32,
            max_height: 32,
            ..CameraConstraints::default()
        };
        source.open(&constraints).await.unwrap();
        assert_eq!(source.len(), 2);
        let a = source.next_frame().await.unwrap();
        let b = source.next_frame().await.unwrap();
        let c = source.next_frame().await.unwrap();
        assert_eq!(a.dimensions(), VideoDimensions::new(32, 16));
        assert_eq!(b.dimensions(), VideoDimensions::new(16, 16));
        assert_eq!(c.dimensions(), a.dimensions());
        assert_eq!(c.index, 2);
    }
}
