use image::RgbaImage;
use tracing::{debug, trace};

use super::SymbolDecoder;
use crate::error::Result;
use crate::models::{DecodedSymbol, Point, Symbology};
use crate::utils::grayscale::rgba_to_grayscale_auto;

/// QR decoder backed by `rqrr`
///
/// Grid detection is CPU bound, so each call runs on Tokio's blocking pool and
/// the scan loop only awaits its completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Create the decoder
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for RqrrDecoder {
    async fn decode(&mut self, image: RgbaImage) -> Result<Vec<DecodedSymbol>> {
        let symbols = tokio::task::spawn_blocking(move || decode_rqrr(&image)).await?;
        Ok(symbols)
    }
}

/// Decode every QR grid in an RGBA buffer on the calling thread
///
/// Grids that are located but fail to decode are skipped; they are not
/// errors for a live feed, the next frame gets another chance.
pub fn decode_rqrr(image: &RgbaImage) -> Vec<DecodedSymbol> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let gray = rgba_to_grayscale_auto(image.as_raw(), width, height);
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| gray[y * width + x]);
    let grids = prepared.detect_grids();
    trace!(grids = grids.len(), width, height, "grids located");

    let mut symbols = Vec::with_capacity(grids.len());
    for grid in grids {
        let mut payload = Vec::new();
        match grid.decode_to(&mut payload) {
            Ok(_) => {
                let polygon = grid
                    .bounds
                    .iter()
                    .map(|p| Point::new(p.x as f32, p.y as f32))
                    .collect();
                symbols.push(DecodedSymbol::new(Symbology::QrCode, polygon, payload));
            }
            Err(err) => debug!(?err, "grid located but not decodable"),
        }
    }
    symbols
}
