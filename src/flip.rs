//! Single/double buffer flip protocol.
//!
//! One tick is `begin_frame`, drawing, `end_frame`, `present`. With two
//! buffers the compositor draws into the slot that is not waiting to go out,
//! and `present` sends the frame completed on the *previous* tick, so the
//! panel always runs one frame behind the compositor. `present` blocks until
//! the transport has retired the frame, which keeps at most one buffer in
//! flight and makes the sent buffer safe to draw into on the next tick.

use log::{debug, trace, warn};

use crate::config::BufferMode;
use crate::error::{ConfigError, PanelError};
use crate::framebuffer::FrameBuffer;
use crate::streamer::{flush_frame, StripPlan};
use crate::transport::PanelTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Front,
    Back,
}

impl Slot {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Slot::Front => 0,
            Slot::Back => 1,
        }
    }

    #[inline]
    pub const fn other(self) -> Slot {
        match self {
            Slot::Front => Slot::Back,
            Slot::Back => Slot::Front,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipState {
    Idle,
    Writing(Slot),
    Transmitting(Slot),
}

enum Buffers<'a> {
    Single(FrameBuffer<'a>),
    Double([FrameBuffer<'a>; 2]),
}

/// What one [`FlipController::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub drawn: Slot,
    pub transmitted: Option<Slot>,
    pub strips: usize,
}

pub struct FlipController<'a> {
    buffers: Buffers<'a>,
    state: FlipState,
    // Finished by the last `end_frame`, not yet handed to `present`.
    completed: Option<Slot>,
    // Double mode: completed on an earlier tick, sent by the next `present`.
    pending: Option<Slot>,
}

impl<'a> FlipController<'a> {
    pub fn single(buffer: FrameBuffer<'a>) -> Self {
        Self {
            buffers: Buffers::Single(buffer),
            state: FlipState::Idle,
            completed: None,
            pending: None,
        }
    }

    /// Both buffers must have the same size.
    pub fn double(front: FrameBuffer<'a>, back: FrameBuffer<'a>) -> Result<Self, ConfigError> {
        if front.panel_size() != back.panel_size() {
            return Err(ConfigError::BufferSize {
                expected: front.panel_size().pixel_count(),
                actual: back.panel_size().pixel_count(),
            });
        }
        Ok(Self {
            buffers: Buffers::Double([front, back]),
            state: FlipState::Idle,
            completed: None,
            pending: None,
        })
    }

    pub fn mode(&self) -> BufferMode {
        match self.buffers {
            Buffers::Single(_) => BufferMode::Single,
            Buffers::Double(_) => BufferMode::Double,
        }
    }

    pub fn state(&self) -> FlipState {
        self.state
    }

    /// Slot waiting to be sent by the next `present` (double mode).
    pub fn pending(&self) -> Option<Slot> {
        self.pending
    }

    /// `None` for `Back` in single mode.
    pub fn buffer(&self, slot: Slot) -> Option<&FrameBuffer<'a>> {
        match (&self.buffers, slot) {
            (Buffers::Single(fb), Slot::Front) => Some(fb),
            (Buffers::Single(_), Slot::Back) => None,
            (Buffers::Double(fbs), s) => Some(&fbs[s.index()]),
        }
    }

    fn buffer_mut(&mut self, slot: Slot) -> Option<&mut FrameBuffer<'a>> {
        match (&mut self.buffers, slot) {
            (Buffers::Single(fb), Slot::Front) => Some(fb),
            (Buffers::Single(_), Slot::Back) => None,
            (Buffers::Double(fbs), s) => Some(&mut fbs[s.index()]),
        }
    }

    /// Start writing a frame and return the buffer to draw into.
    pub fn begin_frame<E>(&mut self) -> Result<&mut FrameBuffer<'a>, PanelError<E>> {
        if self.state != FlipState::Idle || self.completed.is_some() {
            return Err(PanelError::InvalidState);
        }
        let slot = match self.buffers {
            Buffers::Single(_) => Slot::Front,
            Buffers::Double(_) => self.pending.map_or(Slot::Front, Slot::other),
        };
        trace!("begin frame in {:?}", slot);
        self.state = FlipState::Writing(slot);
        self.buffer_mut(slot).ok_or(PanelError::InvalidState)
    }

    /// The buffer currently being written, if any.
    pub fn current(&mut self) -> Option<&mut FrameBuffer<'a>> {
        match self.state {
            FlipState::Writing(slot) => self.buffer_mut(slot),
            _ => None,
        }
    }

    /// Mark the frame being written as complete.
    pub fn end_frame<E>(&mut self) -> Result<Slot, PanelError<E>> {
        let FlipState::Writing(slot) = self.state else {
            return Err(PanelError::InvalidState);
        };
        self.state = FlipState::Idle;
        self.completed = Some(slot);
        Ok(slot)
    }

    /// Send the frame due this tick and wait for it. Returns the slot sent
    /// and the number of strips, or `None` on the first double-buffered tick.
    pub fn present<T: PanelTransport>(
        &mut self,
        transport: &mut T,
        plan: &StripPlan,
    ) -> Result<Option<(Slot, usize)>, PanelError<T::Error>> {
        if self.state != FlipState::Idle {
            return Err(PanelError::InvalidState);
        }
        let size = match &self.buffers {
            Buffers::Single(fb) => fb.panel_size(),
            Buffers::Double(fbs) => fbs[0].panel_size(),
        };
        if size != plan.size() {
            warn!(
                "{}x{} buffers cannot be sent with a {}x{} strip plan",
                size.width,
                size.height,
                plan.size().width,
                plan.size().height
            );
            return Err(ConfigError::BufferSize {
                expected: plan.size().pixel_count(),
                actual: size.pixel_count(),
            }
            .into());
        }
        let Some(completed) = self.completed.take() else {
            return Err(PanelError::InvalidState);
        };
        let due = match self.buffers {
            Buffers::Single(_) => Some(completed),
            Buffers::Double(_) => self.pending.replace(completed),
        };
        let Some(slot) = due else {
            debug!("first frame held in {:?}", completed);
            return Ok(None);
        };

        self.state = FlipState::Transmitting(slot);
        let fb = match (&self.buffers, slot) {
            (Buffers::Single(fb), _) => fb,
            (Buffers::Double(fbs), s) => &fbs[s.index()],
        };
        let sent = flush_frame(transport, plan, fb);
        self.state = FlipState::Idle;
        let strips = sent?;
        trace!("presented {:?} in {} strips", slot, strips);
        Ok(Some((slot, strips)))
    }

    /// One complete flip: draw into the write buffer, then present.
    pub fn tick<T, F>(
        &mut self,
        transport: &mut T,
        plan: &StripPlan,
        draw: F,
    ) -> Result<FrameReport, PanelError<T::Error>>
    where
        T: PanelTransport,
        F: FnOnce(&mut FrameBuffer<'a>),
    {
        draw(self.begin_frame::<T::Error>()?);
        let drawn = self.end_frame::<T::Error>()?;
        let sent = self.present(transport, plan)?;
        Ok(FrameReport {
            drawn,
            transmitted: sent.map(|(slot, _)| slot),
            strips: sent.map_or(0, |(_, n)| n),
        })
    }
}
