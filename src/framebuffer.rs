//! Off-screen pixel surface.
//!
//! Storage is borrowed, not allocated: firmware leaks one PSRAM allocation
//! per buffer at startup and hands the slices in here.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::ConfigError;
use crate::geometry::{PanelSize, Rect};
use crate::pixel::{write_wire, Pixel, BYTES_PER_PIXEL};
use crate::streamer::PixelSource;

pub struct FrameBuffer<'a> {
    pixels: &'a mut [Pixel],
    size: PanelSize,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(pixels: &'a mut [Pixel], size: PanelSize) -> Result<Self, ConfigError> {
        if size.width == 0 || size.height == 0 {
            return Err(ConfigError::ZeroSize);
        }
        let expected = size.pixel_count();
        if pixels.len() != expected {
            return Err(ConfigError::BufferSize { expected, actual: pixels.len() });
        }
        Ok(Self { pixels, size })
    }

    /// Reinterpret raw `u16` storage (already in wire order) as a buffer.
    pub fn from_raw(raw: &'a mut [u16], size: PanelSize) -> Result<Self, ConfigError> {
        Self::new(bytemuck::cast_slice_mut(raw), size)
    }

    #[inline]
    pub fn panel_size(&self) -> PanelSize {
        self.size
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.size.width as usize + x as usize
    }

    /// Panics if `(x, y)` is outside the buffer.
    #[inline]
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Pixel) {
        let i = self.index(x, y);
        self.pixels[i] = color;
    }

    #[inline]
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<Pixel> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Fill the part of `rect` that lies inside the buffer.
    pub fn fill_rect(&mut self, rect: &Rect, color: Pixel) {
        let Some(r) = rect.intersection(&Rect::full(self.size)) else {
            return;
        };
        for y in r.y..r.y + r.height {
            let start = self.index(r.x, y);
            self.pixels[start..start + r.width as usize].fill(color);
        }
    }

    pub fn fill(&mut self, color: Pixel) {
        self.pixels.fill(color);
    }

    /// Copy a packed `rect.width * rect.height` block into `rect`, clipped to
    /// the buffer.
    pub fn blit(&mut self, rect: &Rect, src: &[Pixel]) {
        debug_assert_eq!(src.len(), rect.pixel_count());
        let Some(r) = rect.intersection(&Rect::full(self.size)) else {
            return;
        };
        let src_w = rect.width as usize;
        let dx = (r.x - rect.x) as usize;
        for row in 0..r.height {
            let src_start = (row + r.y - rect.y) as usize * src_w + dx;
            let dst_start = self.index(r.x, r.y + row);
            let n = r.width as usize;
            self.pixels[dst_start..dst_start + n].copy_from_slice(&src[src_start..src_start + n]);
        }
    }

    pub fn row(&self, y: u16) -> &[Pixel] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.size.width as usize]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &*self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut *self.pixels
    }
}

impl PixelSource for FrameBuffer<'_> {
    fn covers(&self, rect: &Rect) -> bool {
        rect.fits_within(self.size)
    }

    fn write_rect(&self, rect: &Rect, out: &mut [u8]) {
        let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
        // Full-width rects are one contiguous run.
        if rect.x == 0 && rect.width == self.size.width {
            let start = self.index(0, rect.y);
            write_wire(&self.pixels[start..start + rect.pixel_count()], out);
            return;
        }
        for (row, dst) in out.chunks_exact_mut(row_bytes).enumerate() {
            let start = self.index(rect.x, rect.y + row as u16);
            write_wire(&self.pixels[start..start + rect.width as usize], dst);
        }
    }
}

impl OriginDimensions for FrameBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.size.width as u32, self.size.height as u32)
    }
}

impl DrawTarget for FrameBuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Rgb565>>,
    {
        let (w, h) = (self.size.width as i32, self.size.height as i32);
        for embedded_graphics::Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 || p.x >= w || p.y >= h {
                continue;
            }
            self.set_pixel(p.x as u16, p.y as u16, c.into());
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        if let Some(r) = Rect::clip_from(area, self.size) {
            self.fill_rect(&r, color.into());
        }
        Ok(())
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.fill(color.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    fn storage(size: PanelSize) -> Vec<Pixel> {
        vec![Pixel::BLACK; size.pixel_count()]
    }

    #[test]
    fn new_rejects_mismatched_storage() {
        let mut px = vec![Pixel::BLACK; 10];
        assert_eq!(
            FrameBuffer::new(&mut px, PanelSize::new(4, 4)).err(),
            Some(ConfigError::BufferSize { expected: 16, actual: 10 })
        );
    }

    #[test]
    fn fill_rect_clips_to_buffer() {
        let size = PanelSize::new(8, 4);
        let mut px = storage(size);
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        fb.fill_rect(&Rect::new(6, 2, 5, 5), Pixel::RED);
        assert_eq!(fb.get_pixel(5, 2), Some(Pixel::BLACK));
        assert_eq!(fb.get_pixel(6, 2), Some(Pixel::RED));
        assert_eq!(fb.get_pixel(7, 3), Some(Pixel::RED));
        assert_eq!(fb.pixels().iter().filter(|p| **p == Pixel::RED).count(), 4);
    }

    #[test]
    fn blit_places_rows_at_offset() {
        let size = PanelSize::new(6, 6);
        let mut px = storage(size);
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        let block = [Pixel::RED, Pixel::GREEN, Pixel::BLUE, Pixel::WHITE];
        fb.blit(&Rect::new(2, 3, 2, 2), &block);
        assert_eq!(&fb.row(3)[2..4], &[Pixel::RED, Pixel::GREEN]);
        assert_eq!(&fb.row(4)[2..4], &[Pixel::BLUE, Pixel::WHITE]);
        assert_eq!(fb.get_pixel(1, 3), Some(Pixel::BLACK));
    }

    #[test]
    fn blit_partially_offscreen() {
        let size = PanelSize::new(4, 4);
        let mut px = storage(size);
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        let block = [Pixel::RED, Pixel::GREEN, Pixel::BLUE, Pixel::WHITE];
        fb.blit(&Rect::new(3, 3, 2, 2), &block);
        assert_eq!(fb.get_pixel(3, 3), Some(Pixel::RED));
        assert_eq!(fb.pixels().iter().filter(|p| **p != Pixel::BLACK).count(), 1);
    }

    #[test]
    fn draw_target_clips_negative_coordinates() {
        let size = PanelSize::new(10, 10);
        let mut px = storage(size);
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        Rectangle::new(Point::new(-3, -3), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::YELLOW))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.get_pixel(1, 1), Some(Pixel::YELLOW));
        assert_eq!(fb.get_pixel(2, 2), Some(Pixel::BLACK));
        assert_eq!(fb.pixels().iter().filter(|p| **p == Pixel::YELLOW).count(), 4);
    }

    #[test]
    fn strided_strip_matches_row_bytes() {
        let size = PanelSize::new(4, 3);
        let mut px = storage(size);
        let mut fb = FrameBuffer::new(&mut px, size).unwrap();
        fb.set_pixel(1, 1, Pixel::YELLOW);
        fb.set_pixel(2, 2, Pixel::BLUE);
        let rect = Rect::new(1, 1, 2, 2);
        let mut out = [0u8; 8];
        fb.write_rect(&rect, &mut out);
        let mut expect = Vec::new();
        for p in [Pixel::YELLOW, Pixel::BLACK, Pixel::BLACK, Pixel::BLUE] {
            expect.extend_from_slice(&p.to_wire());
        }
        assert_eq!(out.to_vec(), expect);
    }
}
