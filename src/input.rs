//! Button handling for the scene controls.
//!
//! Button inputs live in `critical_section` mutexes so the GPIO interrupt
//! handler and the main loop can both reach them. The handler only latches
//! debounced presses; the main loop samples held levels and takes latched
//! presses once per tick.

use esp_backtrace as _;

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};
use critical_section::Mutex;
use log::debug;

use esp_hal::gpio::Input;

use crate::scene::Controls;

// Button state struct
pub struct ButtonState<'a> {
    pub input: Mutex<RefCell<Option<Input<'a>>>>,
    pub last_level: Mutex<Cell<bool>>,
    pub last_interrupt: Mutex<Cell<u64>>,
    pub pressed: AtomicBool,
    pub name: &'static str,
}

impl ButtonState<'_> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            input: Mutex::new(RefCell::new(None)),
            last_level: Mutex::new(Cell::new(true)),
            last_interrupt: Mutex::new(Cell::new(0)),
            pressed: AtomicBool::new(false),
            name,
        }
    }
}

// Handle button edge interrupts; latches a press on a debounced falling edge
pub fn handle_button(btn: &ButtonState, now_ms: u64, debounce_ms: u64) {
    critical_section::with(|cs| {
        let mut binding = btn.input.borrow_ref_mut(cs);
        let Some(input) = binding.as_mut() else {
            return;
        };

        if !input.is_interrupt_set() {
            return;
        }
        input.clear_interrupt();

        let level_is_low = input.is_low();
        let last_high = btn.last_level.borrow(cs).get();
        btn.last_level.borrow(cs).set(!level_is_low);

        if last_high && level_is_low {
            let last_debounce = btn.last_interrupt.borrow(cs).get();
            if now_ms.saturating_sub(last_debounce) > debounce_ms {
                btn.last_interrupt.borrow(cs).set(now_ms);
                btn.pressed.store(true, Ordering::Release);
                debug!("{} pressed", btn.name);
            }
        }
    });
}

/// Button currently held down (active low).
pub fn is_held(btn: &ButtonState) -> bool {
    critical_section::with(|cs| {
        btn.input
            .borrow_ref(cs)
            .as_ref()
            .map(|b| b.is_low())
            .unwrap_or(false)
    })
}

/// Latched press since the last call.
pub fn take_press(btn: &ButtonState) -> bool {
    btn.pressed.swap(false, Ordering::AcqRel)
}

/// Steering follows held levels, fire is edge-triggered.
pub fn sample_controls(left: &ButtonState, right: &ButtonState, fire: &ButtonState) -> Controls {
    Controls {
        left: is_held(left),
        right: is_held(right),
        fire: take_press(fire),
    }
}
