use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::Point;

/// Barcode family reported by a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    /// QR Code (Model 2)
    QrCode,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// Code 39
    Code39,
    /// Code 128
    Code128,
    /// Interleaved 2 of 5
    I25,
    /// PDF417
    Pdf417,
    /// Data Matrix
    DataMatrix,
}

impl Symbology {
    /// Label shown in the symbol list
    pub fn type_name(&self) -> &'static str {
        match self {
            Symbology::QrCode => "QR-Code",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code39 => "CODE-39",
            Symbology::Code128 => "CODE-128",
            Symbology::I25 => "I2/5",
            Symbology::Pdf417 => "PDF417",
            Symbology::DataMatrix => "DataMatrix",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One symbol recognised in a decoded image
///
/// The polygon is in the coordinate space of the image handed to the decoder,
/// not the full frame. Text is decoded from the raw payload on first access.
#[derive(Debug, Clone)]
pub struct DecodedSymbol {
    symbology: Symbology,
    polygon: Vec<Point>,
    payload: Vec<u8>,
    text: OnceLock<String>,
}

impl DecodedSymbol {
    /// Create a symbol from its outline and raw payload bytes
    pub fn new(symbology: Symbology, polygon: Vec<Point>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            symbology,
            polygon,
            payload: payload.into(),
            text: OnceLock::new(),
        }
    }

    /// Barcode family
    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    /// Label for the symbol list
    pub fn type_name(&self) -> &'static str {
        self.symbology.type_name()
    }

    /// Outline in decoder-local coordinates
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// Raw payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text; invalid UTF-8 is replaced rather than rejected
    pub fn decode(&self) -> &str {
        self.text
            .get_or_init(|| String::from_utf8_lossy(&self.payload).into_owned())
    }

    /// Outline moved into another coordinate space by `offset`
    pub fn translated_polygon(&self, offset: Point) -> Vec<Point> {
        self.polygon.iter().map(|p| p.offset_by(offset)).collect()
    }
}
