//! Panel facade: reset, init table, backlight and the streaming helpers.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::{error, info};

use crate::config::PanelConfig;
use crate::error::{ConfigError, PanelError};
use crate::flip::{FlipController, FrameReport};
use crate::framebuffer::FrameBuffer;
use crate::geometry::Rect;
use crate::init::{self, INIT_DELAY_MS};
use crate::pixel::Pixel;
use crate::streamer::{self, PixelSource, StripPlan};
use crate::transport::PanelTransport;

pub const RESET_HOLD_MS: u32 = 100;

pub struct Lcd<T, P> {
    transport: T,
    config: PanelConfig,
    plan: StripPlan,
    rst: Option<P>,
    backlight: Option<P>,
}

fn drive<P: OutputPin, E>(pin: &mut P, state: PinState, name: &str) -> Result<(), PanelError<E>> {
    pin.set_state(state).map_err(|e| {
        error!("{} pin: {:?}", name, e);
        PanelError::Gpio
    })
}

impl<T, P> Lcd<T, P>
where
    T: PanelTransport,
    P: OutputPin,
{
    /// Reset the controller, send the init table for `config.model` and
    /// switch the backlight on.
    pub fn new(
        transport: T,
        config: PanelConfig,
        rst: Option<P>,
        backlight: Option<P>,
        delay: &mut impl DelayNs,
    ) -> Result<Self, PanelError<T::Error>> {
        let plan = config.strip_plan()?;
        let max = transport.max_transfer_size();
        if config.strip_bytes() > max {
            return Err(ConfigError::StripTooTall { strip_bytes: config.strip_bytes(), max }.into());
        }

        let mut lcd = Self { transport, config, plan, rst, backlight };
        lcd.reset(delay)?;
        lcd.init(delay)?;
        lcd.set_backlight(true)?;
        info!(
            "{:?} ready: {}x{}, {} strips of {} lines",
            config.model,
            config.size.width,
            config.size.height,
            plan.count(),
            plan.strip_lines()
        );
        Ok(lcd)
    }

    /// Hardware reset. Without a reset pin this only waits.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), PanelError<T::Error>> {
        if let Some(rst) = self.rst.as_mut() {
            drive::<_, T::Error>(rst, PinState::Low, "reset")?;
            delay.delay_ms(RESET_HOLD_MS);
            drive::<_, T::Error>(rst, PinState::High, "reset")?;
        }
        delay.delay_ms(INIT_DELAY_MS);
        Ok(())
    }

    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<usize, PanelError<T::Error>> {
        let table = init::table(self.config.model);
        Ok(init::run_init_sequence(&mut self.transport, table, delay)?)
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), PanelError<T::Error>> {
        match self.backlight.as_mut() {
            Some(bl) => drive(bl, PinState::from(on), "backlight"),
            None => Ok(()),
        }
    }

    pub fn stream<S: PixelSource + ?Sized>(&mut self, rect: &Rect, source: &S) -> Result<(), PanelError<T::Error>> {
        streamer::stream(&mut self.transport, self.config.size, rect, source)
    }

    pub fn fill_rect(&mut self, rect: &Rect, color: Pixel) -> Result<usize, PanelError<T::Error>> {
        streamer::fill_rect(&mut self.transport, self.config.size, rect, color)
    }

    pub fn flush_frame(&mut self, frame: &FrameBuffer<'_>) -> Result<usize, PanelError<T::Error>> {
        streamer::flush_frame(&mut self.transport, &self.plan, frame)
    }

    /// Run one flip of `flip` against this panel.
    pub fn tick<'a, F>(&mut self, flip: &mut FlipController<'a>, draw: F) -> Result<FrameReport, PanelError<T::Error>>
    where
        F: FnOnce(&mut FrameBuffer<'a>),
    {
        flip.tick(&mut self.transport, &self.plan, draw)
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn plan(&self) -> &StripPlan {
        &self.plan
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> (T, Option<P>, Option<P>) {
        (self.transport, self.rst, self.backlight)
    }
}
