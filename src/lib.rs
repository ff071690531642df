//! RustQR Scan - live barcode scanning over a camera-like frame feed
//!
//! Frames arrive from a [`FrameSource`], a fixed scan window (50% of the
//! viewport wide, 8% tall, centred) is mapped onto the letterboxed video, the
//! window's pixels go to a [`SymbolDecoder`], and every symbol found is
//! outlined on an [`OverlaySink`]. The [`ScanLoop`] repeats that with a fixed
//! pause until its [`CancelToken`] fires.
//!
//! ```no_run
//! use rust_qr_scan::{
//!     CancelToken, CanvasOverlay, ImageSequenceSource, RqrrDecoder, ScanLoop, ScannerConfig,
//!     Viewport, viewport_channel,
//! };
//!
//! # async fn demo() -> rust_qr_scan::Result<()> {
//! let (_resize, viewport) = viewport_channel(Viewport::new(390.0, 844.0));
//! let mut scan = ScanLoop::new(
//!     ImageSequenceSource::new("frames/"),
//!     RqrrDecoder::new(),
//!     CanvasOverlay::default(),
//!     viewport,
//!     ScannerConfig::cropped(),
//! );
//! let report = scan.run(&CancelToken::new()).await?;
//! println!("{} cycles", report.cycles);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Cooperative cancellation
pub mod cancel;
/// Scanner configuration (presets, JSON files)
pub mod config;
/// Extraction and the decoder seam
pub mod decode;
/// Error types
pub mod error;
/// Viewport to video mapping of the scan window
pub mod mapper;
/// Core data structures (Point, Rect, DecodedSymbol, etc.)
pub mod models;
/// Overlay layers, outlines and the symbol list
pub mod overlay;
/// The decode, render and wait cycle
pub mod scan_loop;
/// Camera-like frame producers
pub mod source;
/// Image loading helpers shared by sources and the CLI
pub mod tools;
/// Utility functions (grayscale conversion)
pub mod utils;

pub use cancel::CancelToken;
pub use config::ScannerConfig;
pub use decode::{DecodeInvoker, DecodeOutcome, Extraction, RqrrDecoder, SymbolDecoder, extract};
pub use error::{CameraError, Result, ScanError};
pub use mapper::{DisplayLayout, ViewportMapping, WindowConfig};
pub use models::{DecodedSymbol, PixelRect, Point, Rect, Symbology, VideoDimensions, Viewport};
pub use overlay::{CanvasOverlay, OverlaySink, OverlayStyle};
pub use scan_loop::{LoopState, ScanLoop, ScanReport, viewport_channel};
pub use source::{
    CameraConstraints, FacingMode, Frame, FrameSource, ImageSequenceSource, StillFrameSource,
};
