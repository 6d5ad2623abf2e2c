//! SPI LCD demo
//! ========================================
//! cargo run --release --features esp32s3
//! ========================================
//!
//! Scrolling stars, a ship steered with the left/right buttons and a bullet
//! fired with the third button, drawn into PSRAM frame buffers and streamed
//! to the panel strip by strip. The LED blinks once a second.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Application descriptor checked by the bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

// Module imports
use lcd_pipeline::{
    bmp,
    display::setup_display,
    input::{handle_button, sample_controls, ButtonState},
    scene::{Scene, Sprite, SHIP_HEIGHT, SHIP_WIDTH},
    tick::{Divider, Ticker},
    wiring::{init_board_pins, BoardPins},
    BufferMode, FlipController, FrameBuffer, PanelConfig, Pixel, Rect,
};

// Core imports
use core::fmt::Display;
use esp_backtrace as _;

// ESP-HAL imports
use esp_hal::{
    handler, main, psram, ram,
    timer::systimer::{SystemTimer, Unit},
    Config,
};

use esp_println::println;
use log::{debug, error, info, warn};

// Allocator for PSRAM
extern crate alloc;
use alloc::{boxed::Box, vec};

static SHIP_BMP: &[u8] = include_bytes!("../../assets/ship.bmp");

// Shared resources for buttons
static BUTTON_LEFT: ButtonState<'static> = ButtonState::new("Left");
static BUTTON_RIGHT: ButtonState<'static> = ButtonState::new("Right");
static BUTTON_FIRE: ButtonState<'static> = ButtonState::new("Fire");

const DEBOUNCE_MS: u64 = 40;
// 10 ms base tick, LED toggles every 100 ticks.
const TICK_MS: u64 = 10;
const LED_TICKS: u32 = 100;
const FRAME_TICKS: u32 = 4;

fn now_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

fn fatal(what: &str, e: impl Display) -> ! {
    error!("{}: {}", what, e);
    panic!("{} failed", what);
}

// Interrupt handler
#[handler]
#[ram]
fn handler() {
    let now = now_ms();
    handle_button(&BUTTON_LEFT, now, DEBOUNCE_MS);
    handle_button(&BUTTON_RIGHT, now, DEBOUNCE_MS);
    handle_button(&BUTTON_FIRE, now, DEBOUNCE_MS);
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);
    println!("lcd_pipeline starting");

    let peripherals = esp_hal::init(Config::default());

    esp_alloc::psram_allocator!(&peripherals.PSRAM, psram);

    let (mut io, pins) = init_board_pins(peripherals);
    let BoardPins {
        mut led,
        btn_left,
        btn_right,
        btn_fire,
        display_pins,
    } = pins;

    // Stash buttons in global state
    critical_section::with(|cs| {
        BUTTON_LEFT.input.borrow_ref_mut(cs).replace(btn_left);
        BUTTON_RIGHT.input.borrow_ref_mut(cs).replace(btn_right);
        BUTTON_FIRE.input.borrow_ref_mut(cs).replace(btn_fire);
    });
    io.set_interrupt_handler(handler);

    // -------------------- Display --------------------
    let config = PanelConfig::default();
    let staging: &'static mut [u8] = Box::leak(vec![0u8; config.strip_bytes()].into_boxed_slice());
    let mut lcd = setup_display(display_pins, staging, config).unwrap_or_else(|e| fatal("display init", e));

    // Bring-up pattern: the whole panel in yellow, one transfer per chunk.
    match lcd.fill_rect(&Rect::full(config.size), Pixel::YELLOW) {
        Ok(chunks) => info!("test fill sent in {} transfers", chunks),
        Err(e) => fatal("test fill", e),
    }

    let pixel_count = config.size.pixel_count();
    let front: &'static mut [Pixel] = Box::leak(vec![Pixel::BLACK; pixel_count].into_boxed_slice());
    let front = FrameBuffer::new(front, config.size).unwrap_or_else(|e| fatal("front buffer", e));
    let mut flip = match config.buffering {
        BufferMode::Single => FlipController::single(front),
        BufferMode::Double => {
            let back: &'static mut [Pixel] = Box::leak(vec![Pixel::BLACK; pixel_count].into_boxed_slice());
            let back = FrameBuffer::new(back, config.size).unwrap_or_else(|e| fatal("back buffer", e));
            FlipController::double(front, back).unwrap_or_else(|e| fatal("buffer set", e))
        }
    };

    // -------------------- Assets --------------------
    let ship_px: &'static mut [Pixel] =
        Box::leak(vec![Pixel::BLACK; SHIP_WIDTH as usize * SHIP_HEIGHT as usize].into_boxed_slice());
    let sprite = match bmp::decode(SHIP_BMP, ship_px) {
        Ok(info) if info.width == SHIP_WIDTH && info.height == SHIP_HEIGHT => Some(Sprite {
            width: info.width,
            height: info.height,
            pixels: &*ship_px,
        }),
        Ok(info) => {
            warn!("ship bitmap is {}x{}, drawing vector ship", info.width, info.height);
            None
        }
        Err(e) => {
            warn!("ship bitmap: {}", e);
            None
        }
    };

    // Test image: the decoded ship, centred over the bring-up fill.
    if let Some(s) = sprite.as_ref() {
        let at = Rect::new(
            config.size.width.saturating_sub(s.width) / 2,
            config.size.height.saturating_sub(s.height) / 2,
            s.width,
            s.height,
        );
        if let Err(e) = lcd.stream(&at, s.pixels) {
            fatal("test image", e);
        }
    }

    // -------------------- Main loop --------------------
    let mut scene = Scene::new(config.size, now_ms() as u32);
    let mut ticker = Ticker::new(TICK_MS, now_ms());
    let mut led_div = Divider::new(LED_TICKS);
    let mut frame_div = Divider::new(FRAME_TICKS);
    let mut frames: u32 = 0;

    info!("{:?} buffering, frame every {} ms", flip.mode(), FRAME_TICKS as u64 * TICK_MS);

    loop {
        let ticks = ticker.poll(now_ms());
        if ticks == 0 {
            core::hint::spin_loop();
            continue;
        }

        for _ in 0..led_div.advance(ticks) {
            led.toggle();
        }
        if frame_div.advance(ticks) == 0 {
            continue;
        }

        scene.update(sample_controls(&BUTTON_LEFT, &BUTTON_RIGHT, &BUTTON_FIRE));
        match lcd.tick(&mut flip, |fb| scene.draw(fb, sprite.as_ref())) {
            Ok(report) => {
                frames = frames.wrapping_add(1);
                if frames % 100 == 0 {
                    debug!("frame {}: {:?}", frames, report);
                }
            }
            Err(e) => fatal("frame", e),
        }
    }
}
