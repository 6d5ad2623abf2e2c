//! Controller init tables and the startup command runner.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::PanelModel;
use crate::error::TransportError;
use crate::transport::PanelTransport;

/// Bit in `databytes`: wait after sending this entry.
pub const DELAY_FLAG: u8 = 0x80;
/// `databytes` value that terminates a table.
pub const END_OF_TABLE: u8 = 0xFF;
/// Parameter-count bits of `databytes`.
pub const LEN_MASK: u8 = 0x1F;

pub const INIT_DELAY_MS: u32 = 100;

/// One entry of an init table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitCommand {
    pub cmd: u8,
    pub data: [u8; 16],
    pub databytes: u8,
}

impl InitCommand {
    pub const fn new(cmd: u8, params: &[u8], databytes: u8) -> Self {
        let mut data = [0u8; 16];
        let mut i = 0;
        while i < params.len() && i < data.len() {
            data[i] = params[i];
            i += 1;
        }
        Self { cmd, data, databytes }
    }

    pub const fn end() -> Self {
        Self::new(0x00, &[], END_OF_TABLE)
    }

    #[inline]
    pub const fn is_end(&self) -> bool {
        self.databytes == END_OF_TABLE
    }

    /// Parameter bytes actually sent. The declared length wins over the
    /// number of bytes listed in `data`.
    #[inline]
    pub fn params(&self) -> &[u8] {
        let len = ((self.databytes & LEN_MASK) as usize).min(self.data.len());
        &self.data[..len]
    }

    #[inline]
    pub const fn wants_delay(&self) -> bool {
        self.databytes & DELAY_FLAG != 0
    }
}

const fn c(cmd: u8, params: &[u8], databytes: u8) -> InitCommand {
    InitCommand::new(cmd, params, databytes)
}

/// ST7789, 320x240 landscape (MX | MV), 16 bpp.
pub static ST7789_INIT: [InitCommand; 16] = [
    c(0x36, &[(1 << 5) | (1 << 6)], 1),
    c(0x3A, &[0x55], 1),
    c(0xB2, &[0x0C, 0x0C, 0x00, 0x33, 0x33], 5),
    c(0xB7, &[0x45], 1),
    c(0xBB, &[0x2B], 1),
    c(0xC0, &[0x2C], 1),
    c(0xC2, &[0x01, 0xFF], 2),
    c(0xC3, &[0x11], 1),
    c(0xC4, &[0x20], 1),
    c(0xC6, &[0x0F], 1),
    // Power control 1. Only the first parameter is declared.
    c(0xD0, &[0xA4, 0xA1], 1),
    c(
        0xE0,
        &[0xD0, 0x00, 0x05, 0x0E, 0x15, 0x0D, 0x37, 0x43, 0x47, 0x09, 0x15, 0x12, 0x16, 0x19],
        14,
    ),
    c(
        0xE1,
        &[0xD0, 0x00, 0x05, 0x0D, 0x0C, 0x06, 0x2D, 0x44, 0x40, 0x0E, 0x1C, 0x18, 0x16, 0x19],
        14,
    ),
    c(0x11, &[], DELAY_FLAG),
    c(0x29, &[], DELAY_FLAG),
    InitCommand::end(),
];

/// ILI9341, landscape with BGR order, 16 bpp.
pub static ILI9341_INIT: [InitCommand; 25] = [
    c(0xCF, &[0x00, 0x83, 0x30], 3),
    c(0xED, &[0x64, 0x03, 0x12, 0x81], 4),
    c(0xE8, &[0x85, 0x01, 0x79], 3),
    c(0xCB, &[0x39, 0x2C, 0x00, 0x34, 0x02], 5),
    c(0xF7, &[0x20], 1),
    c(0xEA, &[0x00, 0x00], 2),
    c(0xC0, &[0x26], 1),
    c(0xC1, &[0x11], 1),
    c(0xC5, &[0x35, 0x3E], 2),
    c(0xC7, &[0xBE], 1),
    c(0x36, &[0x28], 1),
    c(0x3A, &[0x55], 1),
    c(0xB1, &[0x00, 0x1B], 2),
    c(0xF2, &[0x08], 1),
    c(0x26, &[0x01], 1),
    c(
        0xE0,
        &[0x1F, 0x1A, 0x18, 0x0A, 0x0F, 0x06, 0x45, 0x87, 0x32, 0x0A, 0x07, 0x02, 0x07, 0x05, 0x00],
        15,
    ),
    c(
        0xE1,
        &[0x00, 0x25, 0x27, 0x05, 0x10, 0x09, 0x3A, 0x78, 0x4D, 0x05, 0x18, 0x0D, 0x38, 0x3A, 0x1F],
        15,
    ),
    c(0x2A, &[0x00, 0x00, 0x00, 0xEF], 4),
    c(0x2B, &[0x00, 0x00, 0x01, 0x3F], 4),
    c(0x2C, &[], 0),
    c(0xB7, &[0x07], 1),
    c(0xB6, &[0x0A, 0x82, 0x27, 0x00], 4),
    c(0x11, &[], DELAY_FLAG),
    c(0x29, &[], DELAY_FLAG),
    InitCommand::end(),
];

pub fn table(model: PanelModel) -> &'static [InitCommand] {
    match model {
        PanelModel::St7789 => &ST7789_INIT,
        PanelModel::Ili9341 => &ILI9341_INIT,
    }
}

/// Send `table` up to its terminator with polling writes. Returns the
/// number of commands sent.
pub fn run_init_sequence<T, D>(
    transport: &mut T,
    table: &[InitCommand],
    delay: &mut D,
) -> Result<usize, TransportError<T::Error>>
where
    T: PanelTransport,
    D: DelayNs,
{
    let mut sent = 0;
    for entry in table.iter().take_while(|e| !e.is_end()) {
        debug!("init cmd 0x{:02X} ({} params)", entry.cmd, entry.params().len());
        transport.send_command(entry.cmd)?;
        transport.send_data(entry.params())?;
        if entry.wants_delay() {
            delay.delay_ms(INIT_DELAY_MS);
        }
        sent += 1;
    }
    info!("panel init: {} commands", sent);
    Ok(sent)
}
