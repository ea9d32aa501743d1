//! Simulated MCU: clock, sleep and retained memory
//!
//! Time is virtual. Sleeps advance the clock immediately and, with a
//! non-zero time scale, also block for a proportion of the requested time.
//! Real time spent working (HTTP, decoding) shows up on the clock as well.

use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use inkwake_core::PersistentState;
use inkwake_hal::{MonotonicClock, RetainedMemory, SleepControl, WakeCause};
use log::{debug, info};

pub struct SimPlatform {
    epoch: Instant,
    /// Simulated time that was not spent in real time
    skipped_us: u64,
    time_scale: f64,
    wake: WakeCause,
    retained: Option<PersistentState>,
    halted: bool,
}

impl SimPlatform {
    pub fn new(time_scale: f64) -> Self {
        Self {
            epoch: Instant::now(),
            skipped_us: 0,
            time_scale,
            wake: WakeCause::ColdBoot,
            retained: None,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn pass(&mut self, us: u64) {
        let real = Duration::from_micros(us).mul_f64(self.time_scale);
        if !real.is_zero() {
            thread::sleep(real);
        }
        let real_us = u64::try_from(real.as_micros()).unwrap_or(u64::MAX);
        self.skipped_us = self.skipped_us.saturating_add(us.saturating_sub(real_us));
    }
}

impl MonotonicClock for SimPlatform {
    fn now_us(&self) -> u64 {
        let real_us = u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX);
        real_us.saturating_add(self.skipped_us)
    }
}

impl DelayNs for SimPlatform {
    fn delay_ns(&mut self, ns: u32) {
        self.pass(u64::from(ns) / 1000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.pass(u64::from(ms) * 1000);
    }
}

impl SleepControl for SimPlatform {
    fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    fn light_sleep_us(&mut self, us: u64) {
        debug!("light sleep {} us", us);
        self.pass(us);
    }

    /// Returns after the sleep; the caller models the reboot
    fn deep_sleep_us(&mut self, us: u64) {
        info!("deep sleep {:.1} s", us as f64 / 1e6);
        self.pass(us);
        self.wake = WakeCause::Timer;
    }

    fn halt(&mut self) {
        info!("device halted");
        self.halted = true;
    }
}

impl RetainedMemory<PersistentState> for SimPlatform {
    fn store(&mut self, value: &PersistentState) {
        self.retained = Some(*value);
    }

    fn load(&self) -> Option<PersistentState> {
        self.retained
    }
}
