//! Decode invocation
//!
//! Cuts the scan window (or the whole frame) out of the current frame and
//! hands it to a `SymbolDecoder`. Decoding itself belongs to the backend; this
//! module only decides *what* pixels the backend sees and remembers where they
//! came from, so outlines can be placed back onto the overlay.

mod rqrr_backend;

pub use rqrr_backend::{RqrrDecoder, decode_rqrr};

use std::future::Future;
use std::time::{Duration, Instant};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::mapper::ViewportMapping;
use crate::models::{DecodedSymbol, PixelRect, Point};
use crate::source::Frame;

/// Which pixels are submitted to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Only the mapped scan window
    #[default]
    CropToWindow,
    /// The entire frame
    FullFrame,
}

/// Pixels cut from a frame, with their placement in it
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Sub-image handed to the decoder
    pub image: RgbaImage,
    /// Region of the frame the sub-image covers
    pub region: PixelRect,
}

impl Extracted {
    /// Offset to add to decoder-local points to land in frame space
    pub fn origin(&self) -> Point {
        self.region.origin()
    }
}

/// Cut the pixels for one decode call out of `frame`
///
/// In crop mode the window is clipped to the frame actually received, so a
/// frame that arrives smaller than the mapping expects never reads out of
/// bounds.
pub fn extract(
    frame: &RgbaImage,
    mapping: &ViewportMapping,
    extraction: Extraction,
) -> Result<Extracted> {
    match extraction {
        Extraction::FullFrame => Ok(Extracted {
            image: frame.clone(),
            region: PixelRect::full(frame.width(), frame.height()),
        }),
        Extraction::CropToWindow => {
            let region = mapping
                .pixel_window()
                .clamp_to(frame.width(), frame.height());
            if region.is_empty() {
                return Err(ScanError::EmptyWindow(region));
            }
            let image =
                image::imageops::crop_imm(frame, region.x, region.y, region.width, region.height)
                    .to_image();
            Ok(Extracted { image, region })
        }
    }
}

/// External symbol decoder
///
/// Receives an RGBA buffer and resolves to the symbols found in it, with
/// polygons in that buffer's own coordinates.
pub trait SymbolDecoder: Send {
    /// Decode every symbol in `image`
    fn decode(
        &mut self,
        image: RgbaImage,
    ) -> impl Future<Output = Result<Vec<DecodedSymbol>>> + Send;
}

/// Result of one decode call
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    /// Symbols in decoder-local coordinates
    pub symbols: Vec<DecodedSymbol>,
    /// Region of the frame that was decoded
    pub region: PixelRect,
    /// Time spent in the decoder
    pub elapsed: Duration,
}

impl DecodeOutcome {
    /// Offset from decoder-local to frame coordinates
    pub fn origin(&self) -> Point {
        self.region.origin()
    }
}

/// Owns the decoder and the extraction policy
///
/// `invoke` takes `&mut self`, so a second call cannot start while the first
/// one is still pending.
#[derive(Debug)]
pub struct DecodeInvoker<D> {
    decoder: D,
    extraction: Extraction,
    calls: u64,
}

impl<D: SymbolDecoder> DecodeInvoker<D> {
    /// Wrap a decoder
    pub fn new(decoder: D, extraction: Extraction) -> Self {
        Self {
            decoder,
            extraction,
            calls: 0,
        }
    }

    /// Extraction mode in use
    pub fn extraction(&self) -> Extraction {
        self.extraction
    }

    /// Decode calls completed so far
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// The wrapped decoder
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Extract from `frame` and await the decoder
    pub async fn invoke(
        &mut self,
        frame: &Frame,
        mapping: &ViewportMapping,
    ) -> Result<DecodeOutcome> {
        let Extracted { image, region } = extract(&frame.image, mapping, self.extraction)?;
        let start = Instant::now();
        let symbols = self.decoder.decode(image).await?;
        let elapsed = start.elapsed();
        self.calls += 1;
        debug!(
            frame = frame.index,
            ?region,
            symbols = symbols.len(),
            ?elapsed,
            "decode finished"
        );
        Ok(DecodeOutcome {
            symbols,
            region,
            elapsed,
        })
    }
}

/// One-shot synchronous decode of a frame with the built-in backend
///
/// Returns the symbols together with the offset that maps their polygons into
/// frame coordinates.
pub fn decode_frame(
    frame: &RgbaImage,
    mapping: &ViewportMapping,
    extraction: Extraction,
) -> Result<(Vec<DecodedSymbol>, Point)> {
    let extracted = extract(frame, mapping, extraction)?;
    let symbols = decode_rqrr(&extracted.image);
    Ok((symbols, extracted.origin()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::WindowConfig;
    use crate::models::{VideoDimensions, Viewport};
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    fn mapping_for(width: u32, height: u32) -> ViewportMapping {
        ViewportMapping::compute(
            Viewport::new(width as f32 / 2.0, height as f32 / 2.0),
            VideoDimensions::new(width, height),
            &WindowConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_crop_uses_pixel_window() {
        let frame = gradient(200, 100);
        let mapping = mapping_for(200, 100);
        let extracted = extract(&frame, &mapping, Extraction::CropToWindow).unwrap();
        assert_eq!(extracted.region, mapping.pixel_window());
        assert_eq!(extracted.image.width(), extracted.region.width);
        // top-left pixel of the crop is the frame pixel at the region origin
        let r = extracted.region;
        assert_eq!(extracted.image.get_pixel(0, 0), frame.get_pixel(r.x, r.y));
        assert_eq!(extracted.origin(), Point::new(r.x as f32, r.y as f32));
    }

    #[test]
    fn test_full_frame_has_zero_origin() {
        let frame = gradient(64, 48);
        let mapping = mapping_for(64, 48);
        let extracted = extract(&frame, &mapping, Extraction::FullFrame).unwrap();
        assert_eq!(extracted.region, PixelRect::full(64, 48));
        assert_eq!(extracted.origin(), Point::default());
        assert_eq!(extracted.image, frame);
    }

    #[test]
    fn test_crop_of_smaller_frame_is_clamped() {
        let mapping = mapping_for(400, 200);
        let frame = gradient(100, 50);
        // window starts at x=100, the frame ends there
        assert!(matches!(
            extract(&frame, &mapping, Extraction::CropToWindow),
            Err(ScanError::EmptyWindow(_))
        ));
    }

    #[test]
    fn test_decode_frame_on_blank_image_finds_nothing() {
        let frame = RgbaImage::from_pixel(320, 240, Rgba([255, 255, 255, 255]));
        let mapping = mapping_for(320, 240);
        let (symbols, origin) = decode_frame(&frame, &mapping, Extraction::CropToWindow).unwrap();
        assert!(symbols.is_empty());
        assert_eq!(origin, mapping.pixel_window().origin());
    }

    struct CountingDecoder {
        seen: Vec<(u32, u32)>,
    }

    impl SymbolDecoder for CountingDecoder {
        async fn decode(&mut self, image: RgbaImage) -> Result<Vec<DecodedSymbol>> {
            self.seen.push(image.dimensions());
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_invoker_passes_cropped_buffer() {
        let mapping = mapping_for(200, 100);
        let frame = Frame {
            index: 7,
            image: gradient(200, 100),
        };
        let mut invoker =
            DecodeInvoker::new(CountingDecoder { seen: Vec::new() }, Extraction::CropToWindow);
        let outcome = invoker.invoke(&frame, &mapping).await.unwrap();
        let w = mapping.pixel_window();
        assert_eq!(invoker.decoder().seen, vec![(w.width, w.height)]);
        assert_eq!(outcome.region, w);
        assert_eq!(invoker.calls(), 1);
    }
}
