//! Line-chunked pixel streaming.
//!
//! Every transfer is bounded by the transport's maximum transfer size, so a
//! full frame goes out as a series of full-width strips. Each strip is one
//! address window plus one staged payload, and is retired before the next
//! strip is queued.

use log::{debug, warn};

use crate::error::{ConfigError, PanelError, TransportError};
use crate::geometry::{PanelSize, Rect};
use crate::pixel::{write_wire, Pixel, BYTES_PER_PIXEL};
use crate::transport::PanelTransport;
use crate::window::{set_window, WINDOW_TRANSACTIONS};

/// Anything that can produce the pixels of a rectangle in wire order.
pub trait PixelSource {
    /// Whether `rect` can be produced from this source.
    fn covers(&self, rect: &Rect) -> bool;

    /// Fill `out` (exactly `rect.byte_len()` bytes) with `rect`, row-major.
    fn write_rect(&self, rect: &Rect, out: &mut [u8]);
}

/// A packed block holding exactly the rectangle's pixels.
impl PixelSource for [Pixel] {
    fn covers(&self, rect: &Rect) -> bool {
        self.len() == rect.pixel_count()
    }

    fn write_rect(&self, _rect: &Rect, out: &mut [u8]) {
        write_wire(self, out);
    }
}

/// One color for every pixel of the rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solid(pub Pixel);

impl PixelSource for Solid {
    fn covers(&self, _rect: &Rect) -> bool {
        true
    }

    fn write_rect(&self, _rect: &Rect, out: &mut [u8]) {
        let wire = self.0.to_wire();
        for px in out.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&wire);
        }
    }
}

/// Send `rect` of `source` to the panel and wait for completion.
///
/// Nothing is queued unless the whole payload fits in one transfer; larger
/// requests fail with `Oversized` and must be split by the caller.
pub fn stream<T, S>(
    transport: &mut T,
    size: PanelSize,
    rect: &Rect,
    source: &S,
) -> Result<(), PanelError<T::Error>>
where
    T: PanelTransport,
    S: PixelSource + ?Sized,
{
    if !rect.fits_within(size) || !source.covers(rect) {
        warn!("rejecting rect {:?} on {}x{} panel", rect, size.width, size.height);
        return Err(PanelError::OutOfBounds);
    }

    let total = rect.byte_len();
    let max = transport.max_transfer_size();
    if total > max {
        warn!("refusing {} byte transfer (max {})", total, max);
        return Err(TransportError::Oversized { requested: total, max }.into());
    }

    let depth = transport.queue_depth();
    if transport.pending() + WINDOW_TRANSACTIONS + 1 > depth {
        return Err(TransportError::QueueFull { depth }.into());
    }

    let payload = {
        let region = transport.stage(total)?;
        source.write_rect(rect, region.bytes);
        region.into_transaction()
    };
    set_window(transport, size, rect)?;
    transport.queue_transfer(payload)?;
    transport.await_all_queued()?;
    Ok(())
}

/// Decomposition of the panel into full-width strips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripPlan {
    size: PanelSize,
    strip_lines: u16,
}

impl StripPlan {
    pub fn new(size: PanelSize, strip_lines: u16, max_transfer_size: usize) -> Result<Self, ConfigError> {
        if size.width == 0 || size.height == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if strip_lines == 0 {
            return Err(ConfigError::ZeroStrip);
        }
        let strip_bytes = size.width as usize * strip_lines as usize * BYTES_PER_PIXEL;
        if strip_bytes > max_transfer_size {
            return Err(ConfigError::StripTooTall { strip_bytes, max: max_transfer_size });
        }
        Ok(Self { size, strip_lines })
    }

    pub fn size(&self) -> PanelSize {
        self.size
    }

    pub fn strip_lines(&self) -> u16 {
        self.strip_lines
    }

    /// Number of strips, the last one possibly shorter.
    pub fn count(&self) -> usize {
        (self.size.height as usize).div_ceil(self.strip_lines as usize)
    }

    pub fn strips(&self) -> Strips {
        Strips { plan: *self, next_y: 0 }
    }
}

/// Strips of a [`StripPlan`], top to bottom.
#[derive(Clone, Debug)]
pub struct Strips {
    plan: StripPlan,
    next_y: u16,
}

impl Iterator for Strips {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        let height = self.plan.size.height;
        if self.next_y >= height {
            return None;
        }
        let lines = self.plan.strip_lines.min(height - self.next_y);
        let strip = Rect::new(0, self.next_y, self.plan.size.width, lines);
        self.next_y += lines;
        Some(strip)
    }
}

/// Send a whole frame strip by strip. Returns the number of strips sent.
pub fn flush_frame<T, S>(
    transport: &mut T,
    plan: &StripPlan,
    frame: &S,
) -> Result<usize, PanelError<T::Error>>
where
    T: PanelTransport,
    S: PixelSource + ?Sized,
{
    let mut sent = 0;
    for strip in plan.strips() {
        debug!("strip {} rows {}..{}", sent, strip.y, strip.bottom());
        stream(transport, plan.size(), &strip, frame)?;
        sent += 1;
    }
    Ok(sent)
}

/// Paint `rect` directly on the panel with `color`, as many rows per
/// transfer as fit. Returns the number of transfers.
pub fn fill_rect<T: PanelTransport>(
    transport: &mut T,
    size: PanelSize,
    rect: &Rect,
    color: Pixel,
) -> Result<usize, PanelError<T::Error>> {
    if !rect.fits_within(size) {
        return Err(PanelError::OutOfBounds);
    }
    let row_bytes = rect.width as usize * BYTES_PER_PIXEL;
    let max = transport.max_transfer_size();
    let rows_per_chunk = (max / row_bytes).min(u16::MAX as usize) as u16;
    if rows_per_chunk == 0 {
        return Err(TransportError::Oversized { requested: row_bytes, max }.into());
    }

    let source = Solid(color);
    let mut y = rect.y;
    let mut remaining = rect.height;
    let mut chunks = 0;
    while remaining > 0 {
        let lines = remaining.min(rows_per_chunk);
        let chunk = Rect::new(rect.x, y, rect.width, lines);
        stream(transport, size, &chunk, &source)?;
        y += lines;
        remaining -= lines;
        chunks += 1;
    }
    debug!("filled {:?} in {} transfers", rect, chunks);
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_TRANSFER_SIZE, PARALLEL_LINES};

    const PANEL: PanelSize = PanelSize::new(320, 240);

    #[test]
    fn default_plan_is_fifteen_strips_of_sixteen_rows() {
        let plan = StripPlan::new(PANEL, PARALLEL_LINES, DEFAULT_MAX_TRANSFER_SIZE).unwrap();
        assert_eq!(plan.count(), 15);
        let strips: Vec<Rect> = plan.strips().collect();
        assert_eq!(strips.len(), 15);
        assert!(strips.iter().all(|s| s.width == 320 && s.height == 16 && s.x == 0));
        assert_eq!(strips[14].y, 224);
    }

    #[test]
    fn strips_cover_every_row_once() {
        for &(height, lines) in &[(240u16, 16u16), (240, 7), (100, 30), (1, 16), (17, 16)] {
            let size = PanelSize::new(50, height);
            let plan = StripPlan::new(size, lines, 50 * 30 * 2).unwrap();
            let mut expect_y = 0u32;
            for strip in plan.strips() {
                assert_eq!(strip.y as u32, expect_y);
                assert!(strip.height > 0 && strip.height <= lines);
                expect_y = strip.bottom();
            }
            assert_eq!(expect_y, height as u32);
            assert_eq!(plan.strips().count(), plan.count());
        }
    }

    #[test]
    fn plan_rejects_strip_over_transfer_limit() {
        assert_eq!(
            StripPlan::new(PANEL, 17, DEFAULT_MAX_TRANSFER_SIZE),
            Err(ConfigError::StripTooTall { strip_bytes: 10880, max: 10240 })
        );
        assert_eq!(StripPlan::new(PANEL, 0, 10240), Err(ConfigError::ZeroStrip));
    }

    #[test]
    fn solid_source_repeats_wire_bytes() {
        let mut out = [0u8; 6];
        Solid(Pixel::YELLOW).write_rect(&Rect::new(0, 0, 3, 1), &mut out);
        assert_eq!(out, [0xFF, 0xE0, 0xFF, 0xE0, 0xFF, 0xE0]);
    }

    #[test]
    fn packed_slice_covers_only_its_own_size() {
        let px = [Pixel::RED; 12];
        assert!(px[..].covers(&Rect::new(5, 5, 4, 3)));
        assert!(!px[..].covers(&Rect::new(0, 0, 4, 4)));
    }
}
