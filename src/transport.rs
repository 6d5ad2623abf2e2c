//! Command/data transport to the panel controller.
//!
//! Commands and their parameters travel over the same serial bus; a separate
//! data/command (D/C) line tells the controller which is which. Each queued
//! [`Transaction`] carries a [`DcLine`] tag and the transport's pre-transfer
//! hook drives the D/C pin from that tag immediately before clocking the
//! transaction, so commands and data can be queued back to back.
//!
//! Bulk payloads are copied into a staging area owned by the transport
//! (DMA-capable memory on target) before they are queued. Descriptors are
//! therefore plain values and the source buffer is free again as soon as it
//! has been staged.

use core::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use heapless::Vec;
use log::{error, trace, warn};

use crate::config::DEFAULT_QUEUE_DEPTH;
use crate::error::TransportError;

/// Level of the D/C line while a transaction is clocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DcLine {
    Command,
    Data,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Up to four bytes carried in the descriptor itself.
    Inline { bytes: [u8; 4], len: u8 },
    /// A region of the transport's staging area.
    Staged { offset: usize, len: usize },
}

/// One queued transfer descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub line: DcLine,
    pub payload: Payload,
}

impl Transaction {
    pub const fn command(opcode: u8) -> Self {
        Self {
            line: DcLine::Command,
            payload: Payload::Inline { bytes: [opcode, 0, 0, 0], len: 1 },
        }
    }

    /// Short data transaction, at most four bytes.
    pub fn data(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= 4);
        let len = bytes.len().min(4);
        let mut inline = [0u8; 4];
        inline[..len].copy_from_slice(&bytes[..len]);
        Self {
            line: DcLine::Data,
            payload: Payload::Inline { bytes: inline, len: len as u8 },
        }
    }

    pub fn len(&self) -> usize {
        match self.payload {
            Payload::Inline { len, .. } => len as usize,
            Payload::Staged { len, .. } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writable slice of the staging area, returned by [`PanelTransport::stage`].
pub struct StagedRegion<'s> {
    offset: usize,
    pub bytes: &'s mut [u8],
}

impl<'s> StagedRegion<'s> {
    /// `bytes` must start at `offset` within the transport's staging area.
    pub fn new(offset: usize, bytes: &'s mut [u8]) -> Self {
        Self { offset, bytes }
    }

    /// Data transaction that clocks this region once queued.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            line: DcLine::Data,
            payload: Payload::Staged { offset: self.offset, len: self.bytes.len() },
        }
    }
}

/// Physical command/data exchange with flow control.
pub trait PanelTransport {
    type Error: fmt::Debug;

    /// Largest payload a single transfer may carry.
    fn max_transfer_size(&self) -> usize;

    /// Descriptors that may be queued before `await_all_queued`.
    fn queue_depth(&self) -> usize;

    /// Descriptors queued and not yet retired.
    fn pending(&self) -> usize;

    /// One command byte with D/C low. Returns once the byte is on the wire.
    fn send_command(&mut self, opcode: u8) -> Result<(), TransportError<Self::Error>>;

    /// Payload with D/C high. An empty payload succeeds without bus traffic.
    fn send_data(&mut self, bytes: &[u8]) -> Result<(), TransportError<Self::Error>>;

    /// Reserve `len` bytes of staging memory for the next bulk payload.
    fn stage(&mut self, len: usize) -> Result<StagedRegion<'_>, TransportError<Self::Error>>;

    fn queue_transfer(&mut self, txn: Transaction) -> Result<(), TransportError<Self::Error>>;

    /// Block until every queued transaction has completed, then recycle the
    /// descriptor pool and staging area.
    fn await_all_queued(&mut self) -> Result<(), TransportError<Self::Error>>;
}

impl<T: PanelTransport + ?Sized> PanelTransport for &mut T {
    type Error = T::Error;

    fn max_transfer_size(&self) -> usize {
        T::max_transfer_size(self)
    }

    fn queue_depth(&self) -> usize {
        T::queue_depth(self)
    }

    fn pending(&self) -> usize {
        T::pending(self)
    }

    fn send_command(&mut self, opcode: u8) -> Result<(), TransportError<Self::Error>> {
        T::send_command(self, opcode)
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), TransportError<Self::Error>> {
        T::send_data(self, bytes)
    }

    fn stage(&mut self, len: usize) -> Result<StagedRegion<'_>, TransportError<Self::Error>> {
        T::stage(self, len)
    }

    fn queue_transfer(&mut self, txn: Transaction) -> Result<(), TransportError<Self::Error>> {
        T::queue_transfer(self, txn)
    }

    fn await_all_queued(&mut self) -> Result<(), TransportError<Self::Error>> {
        T::await_all_queued(self)
    }
}

/// Reject descriptors that could not be clocked: inline payloads longer than
/// four bytes, and staged regions outside what `stage` has handed out.
pub fn check_descriptor<E>(txn: &Transaction, staged: usize, max: usize) -> Result<(), TransportError<E>> {
    match txn.payload {
        Payload::Inline { len, .. } if len > 4 => Err(TransportError::Oversized { requested: len as usize, max: 4 }),
        Payload::Staged { len, .. } if len > max => Err(TransportError::Oversized { requested: len, max }),
        Payload::Staged { offset, len } if offset.saturating_add(len) > staged => {
            Err(TransportError::Oversized { requested: offset.saturating_add(len), max: staged })
        }
        _ => Ok(()),
    }
}

/// Bus-level failure of an [`SpiTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError<SpiE, DcE> {
    Spi(SpiE),
    Dc(DcE),
}

/// [`PanelTransport`] over an embedded-hal `SpiDevice` (which owns CS) and a
/// D/C output pin.
pub struct SpiTransport<'d, SPI, DC, const DEPTH: usize = DEFAULT_QUEUE_DEPTH> {
    spi: SPI,
    dc: DC,
    staging: &'d mut [u8],
    staged: usize,
    queue: Vec<Transaction, DEPTH>,
}

type SpiResult<SPI, DC> = Result<
    (),
    BusError<<SPI as embedded_hal::spi::ErrorType>::Error, <DC as embedded_hal::digital::ErrorType>::Error>,
>;

impl<'d, SPI, DC, const DEPTH: usize> SpiTransport<'d, SPI, DC, DEPTH>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    /// `staging` bounds the largest single transfer; size it for one strip.
    pub fn new(spi: SPI, dc: DC, staging: &'d mut [u8]) -> Self {
        Self {
            spi,
            dc,
            staging,
            staged: 0,
            queue: Vec::new(),
        }
    }

    /// Give back the bus and pin.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    // Polling writes must not overtake queued descriptors.
    fn drain_before_polling(&mut self) -> Result<(), TransportError<<Self as PanelTransport>::Error>> {
        if self.queue.is_empty() {
            return Ok(());
        }
        warn!("polling write with {} transactions queued, retiring them first", self.queue.len());
        self.await_all_queued()
    }

    // Runs right before a transaction is clocked.
    fn pre_transfer(&mut self, line: DcLine) -> SpiResult<SPI, DC> {
        let level = match line {
            DcLine::Command => self.dc.set_low(),
            DcLine::Data => self.dc.set_high(),
        };
        level.map_err(BusError::Dc)
    }

    fn clock(&mut self, txn: Transaction) -> SpiResult<SPI, DC> {
        if txn.is_empty() {
            return Ok(());
        }
        self.pre_transfer(txn.line)?;
        let written = match txn.payload {
            Payload::Inline { bytes, len } => self.spi.write(&bytes[..len as usize]),
            Payload::Staged { offset, len } => self.spi.write(&self.staging[offset..offset + len]),
        };
        written.map_err(BusError::Spi)
    }
}

impl<'d, SPI, DC, const DEPTH: usize> PanelTransport for SpiTransport<'d, SPI, DC, DEPTH>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    type Error = BusError<SPI::Error, DC::Error>;

    #[inline]
    fn max_transfer_size(&self) -> usize {
        self.staging.len()
    }

    #[inline]
    fn queue_depth(&self) -> usize {
        DEPTH
    }

    #[inline]
    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn send_command(&mut self, opcode: u8) -> Result<(), TransportError<Self::Error>> {
        self.drain_before_polling()?;
        self.clock(Transaction::command(opcode)).map_err(TransportError::Fault)
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), TransportError<Self::Error>> {
        if bytes.is_empty() {
            return Ok(());
        }
        let max = self.max_transfer_size();
        if bytes.len() > max {
            return Err(TransportError::Oversized { requested: bytes.len(), max });
        }
        self.drain_before_polling()?;
        self.pre_transfer(DcLine::Data).map_err(TransportError::Fault)?;
        self.spi
            .write(bytes)
            .map_err(|e| TransportError::Fault(BusError::Spi(e)))
    }

    fn stage(&mut self, len: usize) -> Result<StagedRegion<'_>, TransportError<Self::Error>> {
        let remaining = self.staging.len() - self.staged;
        if len > remaining {
            return Err(TransportError::Oversized { requested: len, max: remaining });
        }
        let end = self.staged + len;
        let offset = self.staged;
        self.staged = end;
        Ok(StagedRegion {
            offset,
            bytes: &mut self.staging[offset..end],
        })
    }

    fn queue_transfer(&mut self, txn: Transaction) -> Result<(), TransportError<Self::Error>> {
        check_descriptor::<Self::Error>(&txn, self.staged, self.staging.len())?;
        self.queue
            .push(txn)
            .map_err(|_| TransportError::QueueFull { depth: DEPTH })
    }

    fn await_all_queued(&mut self) -> Result<(), TransportError<Self::Error>> {
        let mut result = Ok(());
        for i in 0..self.queue.len() {
            let txn = self.queue[i];
            if let Err(e) = self.clock(txn) {
                error!("transaction {} of {} failed: {:?}", i + 1, self.queue.len(), e);
                result = Err(TransportError::Fault(e));
                break;
            }
        }
        trace!("retired {} transactions, {} staged bytes", self.queue.len(), self.staged);

        // Descriptors and staging are reused by the next batch.
        self.queue.clear();
        self.staged = 0;
        result
    }
}
