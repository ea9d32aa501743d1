//! Time budget
//!
//! Works out how long the device may idle before something is due and which
//! idle mode to use for it. The arithmetic lives here; the lifecycle carries
//! the plans out against the platform.

use inkwake_protocol::NEVER;

use crate::config::Timing;
use crate::state::PersistentState;

/// Microseconds per tenth of a second
pub const US_PER_DS: u64 = 100_000;

/// How the device waits out a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepMode {
    /// Stay awake; used for short waits and whenever the radio is on
    BusyWait,
    /// CPU paused, memory kept
    LightSleep,
    /// Everything off except retained memory; ends in a reboot
    DeepSleep,
}

/// One idle period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepPlan {
    pub mode: SleepMode,
    pub duration_ds: i32,
    /// Battery countdown weight for this period
    pub battery_mult: i32,
}

impl SleepPlan {
    pub fn duration_us(&self) -> u64 {
        self.duration_ds.max(0) as u64 * US_PER_DS
    }
}

/// Tenths of a second until the next event is due
///
/// The battery check is not time critical, so its contribution is a loose
/// ceiling derived from the full period at the fastest drain that could
/// apply, rather than the live battery countdown. This keeps a pending
/// checkup from forcing a short sleep.
pub fn next_deadline(state: &PersistentState, timing: &Timing, radio_on: bool) -> i32 {
    let mult = if radio_on {
        timing.mult_radio_on
    } else {
        timing.mult_deep_sleep
    };
    let battery_ceiling = ceil_div(timing.battery_check_period, mult);
    state
        .request_countdown_ds
        .min(state.screensaver_countdown_ds)
        .min(battery_ceiling)
}

fn ceil_div(value: i32, divisor: i32) -> i32 {
    let divisor = divisor.max(1);
    value / divisor + i32::from(value % divisor != 0)
}

/// Pick the cheapest idle mode that still wakes in time
///
/// Returns `None` when something is already due.
pub fn plan_sleep(timing: &Timing, delay_ds: i32, radio_on: bool) -> Option<SleepPlan> {
    if delay_ds <= 0 {
        return None;
    }
    let (mode, battery_mult) = if radio_on {
        (SleepMode::BusyWait, timing.mult_radio_on)
    } else if delay_ds < timing.min_light_sleep_ds {
        (SleepMode::BusyWait, timing.mult_awake)
    } else if delay_ds < timing.min_deep_sleep_ds {
        (SleepMode::LightSleep, timing.mult_light_sleep)
    } else {
        (SleepMode::DeepSleep, timing.mult_deep_sleep)
    };
    Some(SleepPlan {
        mode,
        duration_ds: delay_ds,
        battery_mult,
    })
}

/// Whole tenths of a second between two clock readings, rounded to nearest
///
/// Saturates at [`NEVER`]; a clock that went backwards counts as no time.
pub fn elapsed_ds(prev_us: u64, now_us: u64) -> i32 {
    let delta = now_us.saturating_sub(prev_us);
    if delta >= US_PER_DS * NEVER as u64 {
        return NEVER;
    }
    ((delta + US_PER_DS / 2) / US_PER_DS) as i32
}

/// Charges time spent working to the countdowns
///
/// Sleeps already decrement the countdowns for their nominal length. Each
/// cycle the tracker measures the real time since the previous checkpoint
/// and charges whatever exceeds the last sleep at the radio-on weight, since
/// the radio may have been up for part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTracker {
    prev_us: u64,
    prev_delay_ds: i32,
}

impl ElapsedTracker {
    pub fn new(now_us: u64) -> Self {
        Self {
            prev_us: now_us,
            prev_delay_ds: 0,
        }
    }

    /// Account for time since the last checkpoint and start a new one
    pub fn account(&mut self, state: &mut PersistentState, timing: &Timing, now_us: u64) {
        let elapsed = elapsed_ds(self.prev_us, now_us);
        if elapsed > self.prev_delay_ds {
            state.elapse(elapsed - self.prev_delay_ds, timing.mult_radio_on);
        }
        self.prev_us = now_us;
        self.prev_delay_ds = 0;
    }

    /// Record that the countdowns were already charged for `delay_ds`
    pub fn slept(&mut self, delay_ds: i32) {
        self.prev_delay_ds = delay_ds;
    }
}
