use super::Point;

/// Axis-aligned rectangle with floating point edges
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Width (never negative)
    pub width: f32,
    /// Height (never negative)
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle; negative extents collapse to zero
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle of `width` x `height` centred on `center`
    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Top-left corner
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Centre point
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// True when the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlap of two rectangles (zero-sized at the clamp point when disjoint)
    pub fn intersect(&self, other: &Rect) -> Rect {
        if self.contains_rect(other) {
            return *other;
        }
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// True when `other` lies completely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Snap outward to whole pixels and clamp to a `max_width` x `max_height` grid
    pub fn to_pixel_rect(&self, max_width: u32, max_height: u32) -> PixelRect {
        let clamp = |v: f32, max: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else if v >= max as f32 {
                max
            } else {
                v as u32
            }
        };
        let x0 = clamp(self.left.floor(), max_width);
        let y0 = clamp(self.top.floor(), max_height);
        let x1 = clamp(self.right().ceil(), max_width);
        let y1 = clamp(self.bottom().ceil(), max_height);
        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Integer rectangle on a pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelRect {
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelRect {
    /// Whole-image rectangle
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// True when no pixel is covered
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left corner as a float point
    pub fn origin(&self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }

    /// Clip to a `width` x `height` image
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}
