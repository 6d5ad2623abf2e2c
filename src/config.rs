//! Panel configuration.
//!
//! Built the same way the HAL configs are: start from `Default` (or a named
//! preset) and chain `with_*` calls, then `validate()` once at startup.

use crate::error::ConfigError;
use crate::geometry::PanelSize;
use crate::pixel::BYTES_PER_PIXEL;
use crate::streamer::StripPlan;

pub const DEFAULT_WIDTH: u16 = 320;
pub const DEFAULT_HEIGHT: u16 = 240;

/// Rows per full-frame strip ("parallel lines").
pub const PARALLEL_LINES: u16 = 16;

/// One full-width strip of `PARALLEL_LINES` rows.
pub const DEFAULT_MAX_TRANSFER_SIZE: usize =
    DEFAULT_WIDTH as usize * PARALLEL_LINES as usize * BYTES_PER_PIXEL;

/// DMA bounce chunk of the firmware SPI bus. The bus copies each staged
/// payload through it piecewise, so it stays one descriptor long instead of
/// mirroring the whole staging area.
pub const DMA_CHUNK_SIZE: usize = 4092;

/// Transactions that may be queued before `await_all_queued`.
pub const DEFAULT_QUEUE_DEPTH: usize = 7;

pub const DEFAULT_SPI_HZ: u32 = 40_000_000;

/// Controller whose init table is sent at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelModel {
    St7789,
    Ili9341,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferMode {
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub size: PanelSize,
    pub max_transfer_size: usize,
    pub strip_lines: u16,
    pub model: PanelModel,
    pub buffering: BufferMode,
    pub spi_hz: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            size: PanelSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE,
            strip_lines: PARALLEL_LINES,
            model: PanelModel::St7789,
            buffering: BufferMode::Double,
            spi_hz: DEFAULT_SPI_HZ,
        }
    }
}

impl PanelConfig {
    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.size = PanelSize::new(width, height);
        self
    }

    pub fn with_max_transfer_size(mut self, bytes: usize) -> Self {
        self.max_transfer_size = bytes;
        self
    }

    pub fn with_strip_lines(mut self, lines: u16) -> Self {
        self.strip_lines = lines;
        self
    }

    pub fn with_model(mut self, model: PanelModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_buffering(mut self, buffering: BufferMode) -> Self {
        self.buffering = buffering;
        self
    }

    pub fn with_frequency(mut self, hz: u32) -> Self {
        self.spi_hz = hz;
        self
    }

    /// Bytes in one strip of `strip_lines` full-width rows.
    pub fn strip_bytes(&self) -> usize {
        self.size.width as usize * self.strip_lines as usize * BYTES_PER_PIXEL
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.strip_lines == 0 {
            return Err(ConfigError::ZeroStrip);
        }
        if self.strip_bytes() > self.max_transfer_size {
            return Err(ConfigError::StripTooTall {
                strip_bytes: self.strip_bytes(),
                max: self.max_transfer_size,
            });
        }
        Ok(())
    }

    /// Full-frame strip decomposition for this panel.
    pub fn strip_plan(&self) -> Result<StripPlan, ConfigError> {
        self.validate()?;
        StripPlan::new(self.size, self.strip_lines, self.max_transfer_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strip_fills_one_transfer_exactly() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.strip_bytes(), cfg.max_transfer_size);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn dma_chunk_is_one_word_aligned_descriptor() {
        assert!(DMA_CHUNK_SIZE <= 4095);
        assert_eq!(DMA_CHUNK_SIZE % 4, 0);
        assert!(DMA_CHUNK_SIZE < DEFAULT_MAX_TRANSFER_SIZE);
    }

    #[test]
    fn strip_taller_than_transfer_is_rejected() {
        let cfg = PanelConfig::default().with_strip_lines(17);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::StripTooTall { strip_bytes: 320 * 17 * 2, max: 10240 })
        );
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = PanelConfig::default()
            .with_size(240, 320)
            .with_model(PanelModel::Ili9341)
            .with_buffering(BufferMode::Single)
            .with_strip_lines(20)
            .with_frequency(26_000_000);
        assert_eq!(cfg.size, PanelSize::new(240, 320));
        assert_eq!(cfg.model, PanelModel::Ili9341);
        assert_eq!(cfg.buffering, BufferMode::Single);
        assert_eq!(cfg.spi_hz, 26_000_000);
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(PanelConfig::default().with_size(0, 10).validate(), Err(ConfigError::ZeroSize));
    }
}
