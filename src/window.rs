//! Address-window encoding.
//!
//! A rectangle becomes three commands: column address set, row (page)
//! address set, and memory write. After the memory-write opcode the
//! controller treats every data byte as pixel data until the next command.

use crate::error::TransportError;
use crate::geometry::{PanelSize, Rect};
use crate::transport::{PanelTransport, Transaction};

pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;

/// Descriptors queued by [`set_window`].
pub const WINDOW_TRANSACTIONS: usize = 5;

/// Start/end column and row of `rect`, ends clamped to the panel.
pub fn window_bounds(rect: &Rect, size: PanelSize) -> ([u16; 2], [u16; 2]) {
    debug_assert!(!rect.is_empty(), "degenerate window");
    let (max_col, max_row) = size.max_coord();
    let end_col = (rect.right().saturating_sub(1)).min(max_col as u32) as u16;
    let end_row = (rect.bottom().saturating_sub(1)).min(max_row as u32) as u16;
    ([rect.x, end_col], [rect.y, end_row])
}

#[inline]
fn be_pair(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}

/// Queue the column/row window for `rect` followed by memory write.
///
/// Callers validate `rect` first; an empty rectangle is not special-cased.
pub fn set_window<T: PanelTransport>(
    transport: &mut T,
    size: PanelSize,
    rect: &Rect,
) -> Result<(), TransportError<T::Error>> {
    let (cols, rows) = window_bounds(rect, size);

    transport.queue_transfer(Transaction::command(CASET))?;
    transport.queue_transfer(Transaction::data(&be_pair(cols[0], cols[1])))?;
    transport.queue_transfer(Transaction::command(RASET))?;
    transport.queue_transfer(Transaction::data(&be_pair(rows[0], rows[1])))?;
    transport.queue_transfer(Transaction::command(RAMWR))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingTransport;
    use crate::transport::DcLine;

    const PANEL: PanelSize = PanelSize::new(320, 240);

    #[test]
    fn window_sequence_is_caset_raset_ramwr() {
        let mut rec = RecordingTransport::new(0, 16);
        set_window(&mut rec, PANEL, &Rect::new(0x0110, 16, 32, 16)).unwrap();
        assert_eq!(rec.pending(), WINDOW_TRANSACTIONS);
        rec.await_all_queued().unwrap();

        assert_eq!(
            rec.wire,
            vec![
                (DcLine::Command, vec![CASET]),
                (DcLine::Data, vec![0x01, 0x10, 0x01, 0x2F]),
                (DcLine::Command, vec![RASET]),
                (DcLine::Data, vec![0x00, 0x10, 0x00, 0x1F]),
                (DcLine::Command, vec![RAMWR]),
            ]
        );
    }

    #[test]
    fn bounds_are_exact_inside_the_panel() {
        for &(x, y, w, h) in &[(0u16, 0u16, 1u16, 1u16), (0, 0, 320, 240), (100, 50, 60, 40), (319, 239, 1, 1)] {
            let (cols, rows) = window_bounds(&Rect::new(x, y, w, h), PANEL);
            assert_eq!(cols, [x, x + w - 1]);
            assert_eq!(rows, [y, y + h - 1]);
        }
    }

    #[test]
    fn ends_clamp_to_last_addressable_pixel() {
        let (cols, rows) = window_bounds(&Rect::new(300, 230, 60, 40), PANEL);
        assert_eq!(cols, [300, 319]);
        assert_eq!(rows, [230, 239]);
    }

    #[test]
    fn full_queue_is_reported() {
        let mut rec = RecordingTransport::new(0, 3);
        assert_eq!(
            set_window(&mut rec, PANEL, &Rect::new(0, 0, 1, 1)),
            Err(TransportError::QueueFull { depth: 3 })
        );
    }
}
