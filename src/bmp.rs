//! Uncompressed 24-bit BMP decoding.
//!
//! Assets are embedded in flash with `include_bytes!`, so decoding works on
//! a byte slice and writes straight into pixel storage.

use core::fmt;

use log::info;

use crate::pixel::Pixel;

const MAGIC: u16 = 0x4D42; // "BM"
const HEADER_LEN: usize = 54;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmpError {
    Truncated { needed: usize, available: usize },
    BadMagic(u16),
    Unsupported { bits_per_pixel: u16, compression: u32 },
    BadDimensions { width: i32, height: i32 },
    DestinationTooSmall { needed: usize, available: usize },
}

impl fmt::Display for BmpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "bitmap truncated: need {} bytes, have {}", needed, available)
            }
            Self::BadMagic(m) => write!(f, "not a bitmap (magic 0x{:04X})", m),
            Self::Unsupported { bits_per_pixel, compression } => write!(
                f,
                "unsupported bitmap: {} bpp, compression {}",
                bits_per_pixel, compression
            ),
            Self::BadDimensions { width, height } => write!(f, "bad bitmap size {}x{}", width, height),
            Self::DestinationTooSmall { needed, available } => {
                write!(f, "destination holds {} pixels, bitmap has {}", available, needed)
            }
        }
    }
}

/// Header fields needed to walk the pixel rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpInfo {
    pub width: u16,
    pub height: u16,
    /// Rows stored first-to-last instead of bottom-up.
    pub top_down: bool,
    pub data_offset: usize,
    /// Bytes per stored row, padded to four.
    pub stride: usize,
}

impl BmpInfo {
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[inline]
fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

#[inline]
fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

pub fn parse_header(bytes: &[u8]) -> Result<BmpInfo, BmpError> {
    if bytes.len() < HEADER_LEN {
        return Err(BmpError::Truncated { needed: HEADER_LEN, available: bytes.len() });
    }
    let magic = le_u16(bytes, 0);
    if magic != MAGIC {
        return Err(BmpError::BadMagic(magic));
    }
    let data_offset = le_u32(bytes, 10) as usize;
    let width = le_u32(bytes, 18) as i32;
    let height = le_u32(bytes, 22) as i32;
    let bits_per_pixel = le_u16(bytes, 28);
    let compression = le_u32(bytes, 30);

    if bits_per_pixel != 24 || compression != 0 {
        return Err(BmpError::Unsupported { bits_per_pixel, compression });
    }
    let rows = height.unsigned_abs();
    if width <= 0 || rows == 0 || width > u16::MAX as i32 || rows > u16::MAX as u32 {
        return Err(BmpError::BadDimensions { width, height });
    }

    let stride = (width as usize * 3 + 3) & !3;
    let info = BmpInfo {
        width: width as u16,
        height: rows as u16,
        top_down: height < 0,
        data_offset,
        stride,
    };
    // 32-bit targets: a large header must not wrap the size.
    let needed = stride
        .checked_mul(info.height as usize)
        .and_then(|n| n.checked_add(data_offset))
        .ok_or(BmpError::Truncated { needed: usize::MAX, available: bytes.len() })?;
    if bytes.len() < needed {
        return Err(BmpError::Truncated { needed, available: bytes.len() });
    }
    Ok(info)
}

/// Decode into `out` row-major, top row first. `out` may be larger than
/// the image; only the first `width * height` pixels are written.
pub fn decode(bytes: &[u8], out: &mut [Pixel]) -> Result<BmpInfo, BmpError> {
    let info = parse_header(bytes)?;
    let needed = info.pixel_count();
    if out.len() < needed {
        return Err(BmpError::DestinationTooSmall { needed, available: out.len() });
    }
    info!("bitmap {}x{}{}", info.width, info.height, if info.top_down { " top-down" } else { "" });

    let w = info.width as usize;
    let h = info.height as usize;
    for (y, dst) in out[..needed].chunks_exact_mut(w).enumerate() {
        let stored = if info.top_down { y } else { h - 1 - y };
        let start = info.data_offset + stored * info.stride;
        let row = &bytes[start..start + w * 3];
        for (px, bgr) in dst.iter_mut().zip(row.chunks_exact(3)) {
            *px = Pixel::from_rgb888(bgr[2], bgr[1], bgr[0]);
        }
    }
    Ok(info)
}
