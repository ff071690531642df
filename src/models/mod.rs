pub mod point;
pub mod rect;
pub mod symbol;
pub mod viewport;

pub use point::Point;
pub use rect::{PixelRect, Rect};
pub use symbol::{DecodedSymbol, Symbology};
pub use viewport::{VideoDimensions, Viewport};
