//! Recording SPI device and D/C pin sharing one bus log.
#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};

/// What the panel saw, decoded by D/C level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wire {
    Cmd(u8),
    Data(Vec<u8>),
}

#[derive(Default)]
pub struct Bus {
    pub dc_high: bool,
    /// One entry per SPI write, tagged with the D/C level at the time.
    pub writes: Vec<(bool, Vec<u8>)>,
}

impl Bus {
    pub fn wire(&self) -> Vec<Wire> {
        let mut out = Vec::new();
        for (dc_high, bytes) in &self.writes {
            if *dc_high {
                out.push(Wire::Data(bytes.clone()));
            } else {
                out.extend(bytes.iter().map(|b| Wire::Cmd(*b)));
            }
        }
        out
    }

    /// Payloads written with D/C high that are longer than an address pair.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(dc, b)| *dc && b.len() > 4)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

pub type SharedBus = Rc<RefCell<Bus>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedFault;

impl spi::Error for InjectedFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct MockSpi {
    bus: SharedBus,
    /// Fail the write with this index into `Bus::writes`.
    pub fail_at: Option<usize>,
}

impl spi::ErrorType for MockSpi {
    type Error = InjectedFault;
}

impl SpiDevice<u8> for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), InjectedFault> {
        let mut bus = self.bus.borrow_mut();
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                if self.fail_at == Some(bus.writes.len()) {
                    self.fail_at = None;
                    return Err(InjectedFault);
                }
                let level = bus.dc_high;
                bus.writes.push((level, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

pub struct MockDc {
    bus: SharedBus,
}

impl digital::ErrorType for MockDc {
    type Error = Infallible;
}

impl OutputPin for MockDc {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.bus.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.bus.borrow_mut().dc_high = true;
        Ok(())
    }
}

/// Reset/backlight stand-in that remembers its levels.
#[derive(Default)]
pub struct MockPin {
    pub levels: Vec<bool>,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.push(true);
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub fn rig() -> (SharedBus, MockSpi, MockDc) {
    let bus = SharedBus::default();
    let spi = MockSpi { bus: bus.clone(), fail_at: None };
    let dc = MockDc { bus: bus.clone() };
    (bus, spi, dc)
}

pub fn solid_bytes(wire: [u8; 2], pixels: usize) -> Vec<u8> {
    wire.repeat(pixels)
}
