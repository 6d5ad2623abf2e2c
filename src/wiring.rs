// Board pin mapping for the ESP32-S3 devkit with an SPI LCD on SPI2.
//! The following wiring is assumed:
//! - LCD SCK  => GPIO12
//! - LCD MOSI => GPIO11
//! - LCD CS   => GPIO10
//! - LCD D/C  => GPIO9
//! - LCD RST  => GPIO8
//! - LCD BL   => GPIO7
//! - LED      => GPIO2
//! - Button left  => GPIO0
//! - Button right => GPIO14
//! - Button fire  => GPIO21
//! - GND => GND
//! - 3.3V => 3.3V
//! Buttons short to GND when pressed (internal pull-ups are enabled).

use esp_backtrace as _;
use esp_hal::gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, DMA_CH0, GPIO11, GPIO12, SPI2};

/// Everything `display::setup_display` consumes.
pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub sck: GPIO12<'a>,
    pub mosi: GPIO11<'a>,
    pub cs: Output<'a>,
    pub dc: Output<'a>,
    pub rst: Output<'a>,
    pub bl: Output<'a>,
    pub dma_ch0: DMA_CH0<'a>,
}

pub struct BoardPins<'a> {
    pub led: Output<'a>,
    pub btn_left: Input<'a>,
    pub btn_right: Input<'a>,
    pub btn_fire: Input<'a>,
    pub display_pins: DisplayPins<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    // Heartbeat LED
    let led = Output::new(p.GPIO2, Level::Low, OutputConfig::default());

    // buttons
    let mut btn_left = Input::new(p.GPIO0, InputConfig::default().with_pull(Pull::Up));
    let mut btn_right = Input::new(p.GPIO14, InputConfig::default().with_pull(Pull::Up));
    let mut btn_fire = Input::new(p.GPIO21, InputConfig::default().with_pull(Pull::Up));
    btn_left.listen(Event::AnyEdge);
    btn_right.listen(Event::AnyEdge);
    btn_fire.listen(Event::AnyEdge);

    // LCD control pins; SCK/MOSI stay raw for the SPI driver
    let cs = Output::new(p.GPIO10, Level::High, OutputConfig::default());
    let dc = Output::new(p.GPIO9, Level::Low, OutputConfig::default());
    let rst = Output::new(p.GPIO8, Level::High, OutputConfig::default());
    let bl = Output::new(p.GPIO7, Level::Low, OutputConfig::default());

    (
        io,
        BoardPins {
            led,
            btn_left,
            btn_right,
            btn_fire,
            display_pins: DisplayPins {
                spi2: p.SPI2,
                sck: p.GPIO12,
                mosi: p.GPIO11,
                cs,
                dc,
                rst,
                bl,
                dma_ch0: p.DMA_CH0,
            },
        },
    )
}
