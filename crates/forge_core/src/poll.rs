//! Tick admission and backoff for background polling.
//!
//! The ticker itself runs in the engine; this decides what a tick is allowed to do.

/// Default cap on the number of ticks skipped after repeated failures.
pub const DEFAULT_MAX_BACKOFF_TICKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_backoff_ticks: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_backoff_ticks: DEFAULT_MAX_BACKOFF_TICKS,
        }
    }
}

/// Ticks to skip after `consecutive_failures` failed list refreshes.
///
/// Doubles per failure starting at one, capped at `max_ticks`.
pub fn backoff_ticks(consecutive_failures: u32, max_ticks: u32) -> u32 {
    if consecutive_failures == 0 {
        return 0;
    }
    let exp = (consecutive_failures - 1).min(31);
    (1u32 << exp).min(max_ticks)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Polling is stopped; the tick is ignored.
    Inactive,
    /// Requests of an earlier tick are still outstanding.
    Outstanding,
    /// Backing off after failures; `remaining` ticks left to skip after this one.
    BackingOff { remaining: u32 },
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PollState {
    config: PollConfig,
    active: bool,
    epoch: u64,
    consecutive_failures: u32,
    skip_remaining: u32,
    ticks_run: u64,
}

impl PollState {
    pub(crate) fn new(config: PollConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Identifies the current polling session; requests from older sessions are stale.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns false when polling was already running.
    pub(crate) fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.epoch += 1;
        self.consecutive_failures = 0;
        self.skip_remaining = 0;
        true
    }

    /// Returns false when polling was not running.
    pub(crate) fn stop(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        true
    }

    pub(crate) fn admit(&mut self, outstanding: usize) -> TickDecision {
        if !self.active {
            return TickDecision::Inactive;
        }
        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            return TickDecision::BackingOff {
                remaining: self.skip_remaining,
            };
        }
        if outstanding > 0 {
            return TickDecision::Outstanding;
        }
        self.ticks_run += 1;
        TickDecision::Run
    }

    pub(crate) fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.skip_remaining = 0;
    }

    /// Returns the number of ticks that will now be skipped.
    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.skip_remaining = backoff_ticks(self.consecutive_failures, self.config.max_backoff_ticks);
        self.skip_remaining
    }
}
