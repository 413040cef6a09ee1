//! Software timer bank.
//!
//! One hardware tick source drives several software timers, each with
//! its own reload value.  The main loop advances the bank by the elapsed
//! milliseconds and polls each timer's fired flag.
//!
//! ```text
//!   elapsed ms ──▶ advance() ──┬──▶ [app tick     2500/100/1000 ms] ─▶ fired?
//!                              ├──▶ [ambient      30 s            ] ─▶ fired?
//!                              └──▶ [level test   1 h             ] ─▶ fired?
//! ```
//!
//! A timer that falls more than one period behind fires once, not once
//! per missed period.

use log::{debug, info};

/// Maximum number of concurrent timers (stack-allocated).
pub const MAX_TIMERS: usize = 4;

/// Slot index of a timer in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(usize);

#[derive(Debug, Clone)]
struct SoftTimer {
    label: &'static str,
    reload_ms: u32,
    remaining_ms: u32,
    fired: bool,
}

pub struct TickScheduler {
    timers: [Option<SoftTimer>; MAX_TIMERS],
}

impl TickScheduler {
    pub const fn new() -> Self {
        Self {
            timers: [None, None, None, None],
        }
    }

    /// Add a timer.  Returns `None` if every slot is taken or
    /// the period is zero.
    pub fn add(&mut self, label: &'static str, period_ms: u32) -> Option<TimerId> {
        if period_ms == 0 {
            return None;
        }
        let (i, slot) = self.timers.iter_mut().enumerate().find(|(_, s)| s.is_none())?;
        info!("Scheduler: added '{}' every {} ms at slot {}", label, period_ms, i);
        *slot = Some(SoftTimer {
            label,
            reload_ms: period_ms,
            remaining_ms: period_ms,
            fired: false,
        });
        Some(TimerId(i))
    }

    /// Change a timer's period.  The new period starts counting now.
    pub fn set_reload(&mut self, id: TimerId, period_ms: u32) {
        if period_ms == 0 {
            return;
        }
        if let Some(t) = self.timer_mut(id) {
            if t.reload_ms != period_ms {
                debug!("Scheduler: '{}' period {} -> {} ms", t.label, t.reload_ms, period_ms);
            }
            t.reload_ms = period_ms;
            t.remaining_ms = period_ms;
        }
    }

    /// Count down every timer by `elapsed_ms`.
    pub fn advance(&mut self, elapsed_ms: u32) {
        for t in self.timers.iter_mut().flatten() {
            if elapsed_ms < t.remaining_ms {
                t.remaining_ms -= elapsed_ms;
                continue;
            }
            let overshoot = (elapsed_ms - t.remaining_ms) % t.reload_ms;
            t.remaining_ms = t.reload_ms - overshoot;
            t.fired = true;
        }
    }

    /// `true` if the timer fired since the last call.
    pub fn test_and_clear(&mut self, id: TimerId) -> bool {
        self.timer_mut(id).is_some_and(|t| core::mem::take(&mut t.fired))
    }

    pub fn period_ms(&self, id: TimerId) -> Option<u32> {
        self.timers.get(id.0)?.as_ref().map(|t| t.reload_ms)
    }

    /// Milliseconds until the timer next fires.
    pub fn remaining_ms(&self, id: TimerId) -> Option<u32> {
        self.timers.get(id.0)?.as_ref().map(|t| t.remaining_ms)
    }

    fn timer_mut(&mut self, id: TimerId) -> Option<&mut SoftTimer> {
        self.timers.get_mut(id.0)?.as_mut()
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
