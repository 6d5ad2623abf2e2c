//! Display setup: SPI2 with DMA, D/C transport and panel bring-up.
//
// - SPI runs in mode 0 at `PanelConfig::spi_hz`.
// - CS is owned by `ExclusiveDevice`; D/C is driven by the transport.
// - The staging area bounds the largest single transfer (one strip). The
//   bus streams it through a single-descriptor DMA chunk, so the strip is not
//   held twice in DMA memory.

use esp_backtrace as _;

use esp_hal::{
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::Output,
    spi::master::{Config, Spi, SpiDmaBus},
    spi::Mode,
    time::Rate,
    Blocking,
};

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use crate::config::{PanelConfig, DMA_CHUNK_SIZE};
use crate::error::PanelError;
use crate::lcd::Lcd;
use crate::transport::{PanelTransport, SpiTransport};
use crate::wiring::DisplayPins;

// A tiny busy-wait delay that satisfies embedded-hal 1.0 DelayNs.
pub struct SpinDelay;

impl embedded_hal::delay::DelayNs for SpinDelay {
    #[inline]
    fn delay_ns(&mut self, ns: u32) {
        let mut n = ns / 50 + 1;
        while n != 0 {
            core::hint::spin_loop();
            n -= 1;
        }
    }
    #[inline]
    fn delay_us(&mut self, us: u32) {
        for _ in 0..us {
            self.delay_ns(1_000);
        }
    }
    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}

pub type SpiDev<'a> = ExclusiveDevice<SpiDmaBus<'a, Blocking>, Output<'a>, NoDelay>;

pub type Transport<'a> = SpiTransport<'a, SpiDev<'a>, Output<'a>>;

pub type DisplayType<'a> = Lcd<Transport<'a>, Output<'a>>;

pub type DisplayError<'a> = PanelError<<Transport<'a> as PanelTransport>::Error>;

/// Bring up SPI2 and the panel. `staging` must hold at least one strip
/// (`config.strip_bytes()`).
pub fn setup_display<'a>(
    display_pins: DisplayPins<'a>,
    staging: &'a mut [u8],
    config: PanelConfig,
) -> Result<DisplayType<'a>, DisplayError<'a>> {
    let DisplayPins {
        spi2,
        sck,
        mosi,
        cs,
        dc,
        rst,
        bl,
        dma_ch0,
    } = display_pins;

    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_hz(config.spi_hz))
            .with_mode(Mode::_0),
    )
    .expect("SPI2 config rejected")
    .with_sck(sck)
    .with_mosi(mosi)
    .with_dma(dma_ch0);

    // Write-only bus: the RX side only needs to exist.
    let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(32, DMA_CHUNK_SIZE);
    let rx = DmaRxBuf::new(rx_desc, rx_buf).expect("DMA RX buffer");
    let tx = DmaTxBuf::new(tx_desc, tx_buf).expect("DMA TX buffer");

    let spi_bus: SpiDmaBus<'_, Blocking> = spi.with_buffers(rx, tx);
    let spi_dev = ExclusiveDevice::new(spi_bus, cs, NoDelay).expect("LCD CS pin");

    let transport = SpiTransport::new(spi_dev, dc, staging);
    let mut delay = SpinDelay;
    Lcd::new(transport, config, Some(rst), Some(bl), &mut delay)
}
