//! Utility functions for frame processing
//!
//! - Grayscale conversion (RGBA to luminance) for the decoder

pub mod grayscale;
