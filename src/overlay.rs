//! Overlay rendering
//!
//! Two layers sit on top of the video, both at native video resolution: the
//! window layer with the translucent scan-window box (repainted only when the
//! mapping changes) and the symbol layer (wiped and redrawn every cycle). A
//! text list and a status line complete the surface.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{Color, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::error::{Result, ScanError};
use crate::mapper::ViewportMapping;
use crate::models::{DecodedSymbol, Point, VideoDimensions};

/// Colours and stroke width used on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Fill of the scan-window box, RGBA
    pub window_fill: [u8; 4],
    /// Stroke of symbol outlines, RGBA
    pub stroke: [u8; 4],
    /// Stroke width in video pixels
    pub line_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            window_fill: [255, 5, 5, 51],
            stroke: [5, 255, 5, 128],
            line_width: 6,
        }
    }
}

impl OverlayStyle {
    fn window_paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.window_fill;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        // Box edges land on whole video pixels
        paint.anti_alias = false;
        paint
    }

    fn stroke_paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.stroke;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint
    }

    fn outline_stroke(&self) -> Stroke {
        Stroke {
            width: self.line_width as f32,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        }
    }
}

/// Row shown in the symbol list
pub fn list_row(index: usize, symbol: &DecodedSymbol) -> String {
    format!(
        "#{index}: Type: {}; Value: \"{}\"",
        symbol.type_name(),
        symbol.decode()
    )
}

/// Where the scan loop draws
pub trait OverlaySink: Send {
    /// Paint the scan-window feedback box for a fresh mapping
    fn show_scan_window(&mut self, mapping: &ViewportMapping) -> Result<()>;

    /// Replace everything drawn for the previous cycle with `symbols`
    ///
    /// `origin` is added to every polygon point to move it from decoder-local
    /// coordinates into overlay coordinates.
    fn render(&mut self, symbols: &[DecodedSymbol], origin: Point) -> Result<()>;

    /// Show a terminal error in place of the camera view
    fn show_error(&mut self, message: &str) -> Result<()>;
}

/// In-memory overlay: two pixmap layers plus the list and status text
///
/// Layers stay unallocated until the first mapping arrives.
#[derive(Debug, Clone)]
pub struct CanvasOverlay {
    style: OverlayStyle,
    window_layer: Option<Pixmap>,
    symbol_layer: Option<Pixmap>,
    outlines: Vec<Vec<Point>>,
    rows: Vec<String>,
    status: Option<String>,
}

impl Default for CanvasOverlay {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

impl CanvasOverlay {
    /// Empty overlay; layers are sized on the first mapping
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            window_layer: None,
            symbol_layer: None,
            outlines: Vec::new(),
            rows: Vec::new(),
            status: None,
        }
    }

    /// Style in use
    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Layer holding the scan-window box
    pub fn window_layer(&self) -> Option<&Pixmap> {
        self.window_layer.as_ref()
    }

    /// Layer holding symbol outlines
    pub fn symbol_layer(&self) -> Option<&Pixmap> {
        self.symbol_layer.as_ref()
    }

    /// Outlines drawn in the last cycle, in overlay coordinates
    pub fn outlines(&self) -> &[Vec<Point>] {
        &self.outlines
    }

    /// List rows from the last cycle
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Error message, if the loop failed
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Both layers flattened, symbols on top, as straight-alpha RGBA
    ///
    /// `None` until a mapping has sized the layers.
    pub fn composite(&self) -> Option<RgbaImage> {
        let mut flat = self.window_layer.clone()?;
        if let Some(symbols) = &self.symbol_layer {
            flat.draw_pixmap(
                0,
                0,
                symbols.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        Some(to_rgba_image(&flat))
    }

    fn ensure_size(&mut self, video: VideoDimensions) -> Result<()> {
        let sized = self
            .window_layer
            .as_ref()
            .is_some_and(|p| (p.width(), p.height()) == (video.width, video.height));
        if sized {
            return Ok(());
        }
        let layer = || {
            Pixmap::new(video.width, video.height).ok_or_else(|| {
                ScanError::Render(format!(
                    "cannot allocate {}x{} overlay layer",
                    video.width, video.height
                ))
            })
        };
        self.window_layer = Some(layer()?);
        self.symbol_layer = Some(layer()?);
        Ok(())
    }
}

impl OverlaySink for CanvasOverlay {
    fn show_scan_window(&mut self, mapping: &ViewportMapping) -> Result<()> {
        self.ensure_size(mapping.video())?;
        let paint = self.style.window_paint();
        let Some(layer) = self.window_layer.as_mut() else {
            return Ok(());
        };
        layer.fill(Color::TRANSPARENT);

        let w = mapping.video_window();
        if let Some(rect) = tiny_skia::Rect::from_xywh(w.left, w.top, w.width, w.height) {
            layer.fill_rect(rect, &paint, Transform::identity(), None);
        }
        Ok(())
    }

    fn render(&mut self, symbols: &[DecodedSymbol], origin: Point) -> Result<()> {
        self.outlines.clear();
        self.rows.clear();

        let paint = self.style.stroke_paint();
        let stroke = self.style.outline_stroke();
        let mut layer = self.symbol_layer.as_mut();
        if let Some(layer) = layer.as_deref_mut() {
            layer.fill(Color::TRANSPARENT);
        }

        for (index, symbol) in symbols.iter().enumerate() {
            let outline = symbol.translated_polygon(origin);
            if let (Some(layer), Some(path)) = (layer.as_deref_mut(), outline_path(&outline)) {
                layer.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            self.outlines.push(outline);
            self.rows.push(list_row(index, symbol));
        }
        Ok(())
    }

    fn show_error(&mut self, message: &str) -> Result<()> {
        self.status = Some(message.to_string());
        Ok(())
    }
}

/// Closed path through `points`; `None` for fewer than two points
fn outline_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

/// Demultiplied copy of a pixmap
pub fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
