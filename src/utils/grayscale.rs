//! Convert RGBA frames to luminance for the decoder
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
//!
//! Alpha is ignored: frames coming off a camera are opaque.
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames with at least this many pixels are converted row-parallel
pub const PARALLEL_PIXEL_THRESHOLD: usize = 640 * 480;

#[inline]
fn luma(px: &[u8]) -> u8 {
    let lum = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    lum.min(255) as u8
}

/// Convert an RGBA buffer to grayscale on the calling thread
///
/// Only the first `width * height` pixels are read; a short buffer yields a
/// short output instead of panicking.
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pixel_count = width * height;
    rgba.chunks_exact(4).take(pixel_count).map(luma).collect()
}

/// Convert RGBA to grayscale using parallel processing
/// Processes rows in parallel for multi-core speedup
pub fn rgba_to_grayscale_parallel(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 || height == 0 || rgba.len() < width * height * 4 {
        return rgba_to_grayscale(rgba, width, height);
    }
    let mut gray = vec![0u8; width * height];

    gray.par_chunks_mut(width)
        .zip(rgba.par_chunks(width * 4))
        .for_each(|(row, src)| {
            for (out, px) in row.iter_mut().zip(src.chunks_exact(4)) {
                *out = luma(px);
            }
        });

    gray
}

/// Pick the serial or parallel path by frame size
pub fn rgba_to_grayscale_auto(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width * height >= PARALLEL_PIXEL_THRESHOLD {
        rgba_to_grayscale_parallel(rgba, width, height)
    } else {
        rgba_to_grayscale(rgba, width, height)
    }
}
