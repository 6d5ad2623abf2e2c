//! Fixed-period pacing.

/// Delay-until ticker. Deadlines advance by whole periods from the start
/// time, so late polls never accumulate drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticker {
    period_ms: u64,
    next_ms: u64,
}

impl Ticker {
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        let period_ms = period_ms.max(1);
        Self { period_ms, next_ms: now_ms + period_ms }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Deadline of the next tick.
    pub fn deadline(&self) -> u64 {
        self.next_ms
    }

    /// Number of ticks that elapsed up to `now_ms` since the last poll.
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        if now_ms < self.next_ms {
            return 0;
        }
        let n = (now_ms - self.next_ms) / self.period_ms + 1;
        self.next_ms += n * self.period_ms;
        n.min(u32::MAX as u64) as u32
    }
}

/// Fires once every `every` ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Divider {
    every: u32,
    count: u32,
}

impl Divider {
    pub const fn new(every: u32) -> Self {
        Self { every: if every == 0 { 1 } else { every }, count: 0 }
    }

    /// Count one tick; true when the divider wraps.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            return true;
        }
        false
    }

    /// Count `n` ticks; returns how many times the divider wrapped.
    pub fn advance(&mut self, n: u32) -> u32 {
        let total = self.count as u64 + n as u64;
        self.count = (total % self.every as u64) as u32;
        (total / self.every as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_fires_on_period_boundaries() {
        let mut t = Ticker::new(10, 1000);
        assert_eq!(t.poll(1005), 0);
        assert_eq!(t.poll(1010), 1);
        assert_eq!(t.poll(1019), 0);
        assert_eq!(t.poll(1020), 1);
        assert_eq!(t.deadline(), 1030);
    }

    #[test]
    fn late_poll_catches_up_without_drift() {
        let mut t = Ticker::new(10, 0);
        assert_eq!(t.poll(37), 3);
        assert_eq!(t.deadline(), 40);
        assert_eq!(t.poll(40), 1);
    }

    #[test]
    fn divider_wraps_every_n() {
        let mut d = Divider::new(100);
        let fired = (0..250).filter(|_| d.tick()).count();
        assert_eq!(fired, 2);
        assert_eq!(d.advance(49), 0);
        assert_eq!(d.advance(1), 1);
        assert_eq!(d.advance(250), 2);
    }
}
