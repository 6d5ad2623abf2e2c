//! In-memory transport for unit tests.

use std::vec;
use std::vec::Vec;

use crate::error::TransportError;
use crate::transport::{check_descriptor, DcLine, PanelTransport, Payload, StagedRegion, Transaction};

/// Records every byte that would have reached the bus, grouped per
/// transaction, in clocking order.
pub(crate) struct RecordingTransport {
    max: usize,
    depth: usize,
    staging: Vec<u8>,
    staged: usize,
    queue: Vec<Transaction>,
    pub wire: Vec<(DcLine, Vec<u8>)>,
    /// Staged payloads only.
    pub payloads: Vec<Vec<u8>>,
    pub batches: usize,
}

impl RecordingTransport {
    pub fn new(max: usize, depth: usize) -> Self {
        Self {
            max,
            depth,
            staging: vec![0; max],
            staged: 0,
            queue: Vec::new(),
            wire: Vec::new(),
            payloads: Vec::new(),
            batches: 0,
        }
    }
}

impl PanelTransport for RecordingTransport {
    type Error = ();

    fn max_transfer_size(&self) -> usize {
        self.max
    }

    fn queue_depth(&self) -> usize {
        self.depth
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn send_command(&mut self, opcode: u8) -> Result<(), TransportError<()>> {
        if !self.queue.is_empty() {
            self.await_all_queued()?;
        }
        self.wire.push((DcLine::Command, vec![opcode]));
        Ok(())
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), TransportError<()>> {
        if bytes.len() > self.max {
            return Err(TransportError::Oversized { requested: bytes.len(), max: self.max });
        }
        if !bytes.is_empty() {
            if !self.queue.is_empty() {
                self.await_all_queued()?;
            }
            self.wire.push((DcLine::Data, bytes.to_vec()));
        }
        Ok(())
    }

    fn stage(&mut self, len: usize) -> Result<StagedRegion<'_>, TransportError<()>> {
        let remaining = self.max - self.staged;
        if len > remaining {
            return Err(TransportError::Oversized { requested: len, max: remaining });
        }
        let end = self.staged + len;
        let offset = self.staged;
        self.staged = end;
        Ok(StagedRegion::new(offset, &mut self.staging[offset..end]))
    }

    fn queue_transfer(&mut self, txn: Transaction) -> Result<(), TransportError<()>> {
        check_descriptor::<()>(&txn, self.staged, self.max)?;
        if self.queue.len() == self.depth {
            return Err(TransportError::QueueFull { depth: self.depth });
        }
        self.queue.push(txn);
        Ok(())
    }

    fn await_all_queued(&mut self) -> Result<(), TransportError<()>> {
        for txn in self.queue.drain(..) {
            let bytes = match txn.payload {
                Payload::Inline { bytes, len } => bytes[..len as usize].to_vec(),
                Payload::Staged { offset, len } => {
                    let staged = self.staging[offset..offset + len].to_vec();
                    self.payloads.push(staged.clone());
                    staged
                }
            };
            self.wire.push((txn.line, bytes));
        }
        self.staged = 0;
        self.batches += 1;
        Ok(())
    }
}
