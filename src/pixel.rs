//! 16-bit 5-6-5 pixels stored in panel wire order.
//!
//! The panel's memory-write command expects each pixel as a big-endian byte
//! pair. A [`Pixel`] keeps that pair pre-swapped, so the little-endian memory
//! image of a `[Pixel]` is exactly the byte stream clocked out on the bus and
//! no conversion happens mid-pipeline.

use bytemuck::{Pod, Zeroable};
use embedded_graphics::pixelcolor::{raw::RawU16, Rgb565};
use embedded_graphics::prelude::*;

pub const BYTES_PER_PIXEL: usize = 2;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Pixel(pub u16);

impl Pixel {
    pub const BLACK: Self = Self::from_rgb888(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::from_rgb888(0xFF, 0xFF, 0xFF);
    pub const RED: Self = Self::from_rgb888(0xFF, 0x00, 0x00);
    pub const GREEN: Self = Self::from_rgb888(0x00, 0xFF, 0x00);
    pub const BLUE: Self = Self::from_rgb888(0x00, 0x00, 0xFF);
    pub const YELLOW: Self = Self::from_rgb888(0xFF, 0xFF, 0x00);

    /// Pack 8-bit channels. Bit layout is fixed by the panel's byte order:
    /// low byte `RRRRRGGG`, high byte `GGGBBBBB`.
    #[inline]
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (r as u16, g as u16, b as u16);
        Self(((r >> 3) << 3) | (g >> 5) | (((g >> 2) & 0x7) << 13) | ((b >> 3) << 8))
    }

    /// Truncated channels as `(r5, g6, b5)`.
    #[inline]
    pub const fn channels(self) -> (u8, u8, u8) {
        let v = self.0;
        let r5 = (v >> 3) & 0x1F;
        let g6 = ((v & 0x7) << 3) | ((v >> 13) & 0x7);
        let b5 = (v >> 8) & 0x1F;
        (r5 as u8, g6 as u8, b5 as u8)
    }

    /// Channels widened back to 8 bits (low bits zero).
    #[inline]
    pub const fn to_rgb888(self) -> (u8, u8, u8) {
        let (r5, g6, b5) = self.channels();
        (r5 << 3, g6 << 2, b5 << 3)
    }

    /// The two bytes sent on the wire for this pixel, in order.
    #[inline]
    pub const fn to_wire(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl From<Rgb565> for Pixel {
    #[inline]
    fn from(c: Rgb565) -> Self {
        Self(c.into_storage().swap_bytes())
    }
}

impl From<Pixel> for Rgb565 {
    #[inline]
    fn from(p: Pixel) -> Self {
        Rgb565::from(RawU16::new(p.0.swap_bytes()))
    }
}

/// Copy `pixels` into `out` as wire bytes. `out` must hold exactly
/// `pixels.len() * BYTES_PER_PIXEL` bytes.
#[inline]
pub fn write_wire(pixels: &[Pixel], out: &mut [u8]) {
    debug_assert_eq!(out.len(), pixels.len() * BYTES_PER_PIXEL);

    #[cfg(target_endian = "little")]
    out.copy_from_slice(bytemuck::cast_slice(pixels));

    #[cfg(not(target_endian = "little"))]
    for (dst, px) in out.chunks_exact_mut(BYTES_PER_PIXEL).zip(pixels) {
        dst.copy_from_slice(&px.to_wire());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(r: u16, g: u16, b: u16) -> u16 {
        ((r >> 3) << 3) | (g >> 5) | (((g >> 2) & 0x7) << 13) | ((b >> 3) << 8)
    }

    #[test]
    fn packing_matches_panel_layout() {
        for &(r, g, b) in &[(0u8, 0u8, 0u8), (255, 255, 0), (0x12, 0x34, 0x56), (200, 3, 255)] {
            assert_eq!(
                Pixel::from_rgb888(r, g, b).0,
                reference(r as u16, g as u16, b as u16)
            );
        }
        assert_eq!(Pixel::YELLOW.0, 0xE0FF);
        assert_eq!(Pixel::YELLOW.to_wire(), [0xFF, 0xE0]);
    }

    #[test]
    fn redecoding_truncated_channels_is_stable() {
        for r in (0..=255u16).step_by(7) {
            for g in (0..=255u16).step_by(5) {
                for b in (0..=255u16).step_by(11) {
                    let p = Pixel::from_rgb888(r as u8, g as u8, b as u8);
                    let (r8, g8, b8) = p.to_rgb888();
                    assert_eq!(Pixel::from_rgb888(r8, g8, b8), p);
                }
            }
        }
    }

    #[test]
    fn rgb565_interop_is_a_byte_swap() {
        let c = Rgb565::new(31, 63, 0);
        let p = Pixel::from(c);
        assert_eq!(p, Pixel::YELLOW);
        assert_eq!(Rgb565::from(p), c);
        assert_eq!(p.channels(), (31, 63, 0));
    }

    #[test]
    fn wire_bytes_follow_pixel_order() {
        let px = [Pixel::YELLOW, Pixel::BLUE];
        let mut out = [0u8; 4];
        write_wire(&px, &mut out);
        assert_eq!(&out[..2], &Pixel::YELLOW.to_wire());
        assert_eq!(&out[2..], &Pixel::BLUE.to_wire());
    }
}
