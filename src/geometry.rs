//! Panel-space rectangles.

use embedded_graphics::prelude::{Point, Size as EgSize};
use embedded_graphics::primitives::Rectangle;

use crate::pixel::BYTES_PER_PIXEL;

/// Visible surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelSize {
    pub width: u16,
    pub height: u16,
}

impl PanelSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Highest addressable column and row.
    #[inline]
    pub const fn max_coord(&self) -> (u16, u16) {
        (self.width.saturating_sub(1), self.height.saturating_sub(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// The whole panel.
    pub const fn full(size: PanelSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Payload size of this rectangle on the wire.
    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Exclusive right edge, widened so it cannot overflow.
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Exclusive bottom edge, widened so it cannot overflow.
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    /// Non-empty and fully inside `size`.
    pub const fn fits_within(&self, size: PanelSize) -> bool {
        !self.is_empty() && self.right() <= size.width as u32 && self.bottom() <= size.height as u32
    }

    /// Overlap of two rectangles, `None` when they do not touch.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x) as u32;
        let y0 = self.y.max(other.y) as u32;
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
    }

    /// Clip an embedded-graphics rectangle (signed, unbounded) to the panel.
    pub fn clip_from(area: &Rectangle, size: PanelSize) -> Option<Rect> {
        let bounds = Rectangle::new(
            Point::zero(),
            EgSize::new(size.width as u32, size.height as u32),
        );
        let inter = area.intersection(&bounds);
        if inter.size.width == 0 || inter.size.height == 0 {
            return None;
        }
        Some(Rect::new(
            inter.top_left.x as u16,
            inter.top_left.y as u16,
            inter.size.width as u16,
            inter.size.height as u16,
        ))
    }
}

impl From<Rect> for Rectangle {
    fn from(r: Rect) -> Self {
        Rectangle::new(
            Point::new(r.x as i32, r.y as i32),
            EgSize::new(r.width as u32, r.height as u32),
        )
    }
}
