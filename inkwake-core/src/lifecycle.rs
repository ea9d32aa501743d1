//! Wake/sleep lifecycle
//!
//! [`Lifecycle`] owns the persistent state and the board for one power-on
//! session. A session starts with [`Lifecycle::boot`] and then runs
//! [`Lifecycle::cycle`] until the device deep sleeps or halts. Deep sleep ends
//! the session: on hardware it never returns, and a hosted platform starts a
//! fresh session with a timer wake cause.
//!
//! Each cycle:
//!
//! 1. Charge the time spent working since the last checkpoint
//! 2. Find the next deadline and sleep until it
//! 3. Run whatever is due, always in the order battery, request, screensaver

use embedded_hal::delay::DelayNs;
use inkwake_display::{EinkDisplay, PngDecoder};
use inkwake_hal::{HttpClient, MonotonicClock, RetainedMemory, SleepControl, WakeCause, WifiRadio};
use inkwake_protocol::NEVER;

use crate::catalog::StatusImageKind;
use crate::config::{ConfigError, DeviceConfig};
use crate::logging::{debug, error, info, warn};
use crate::scheduler::{next_deadline, plan_sleep, ElapsedTracker, SleepMode, SleepPlan};
use crate::state::PersistentState;
use crate::status;
use crate::transport;

/// Everything the controller needs from the MCU itself
pub trait Platform:
    MonotonicClock + SleepControl + RetainedMemory<PersistentState> + DelayNs
{
}

impl<T> Platform for T where
    T: MonotonicClock + SleepControl + RetainedMemory<PersistentState> + DelayNs
{
}

/// The peripherals of one device
pub struct Board<P, D, W, H> {
    pub platform: P,
    pub display: D,
    pub radio: W,
    pub http: H,
}

/// What a session step ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cycle {
    /// Keep cycling
    Continue,
    /// Deep sleep entered; state is in retained memory
    PoweredDown,
    /// Battery too low; the device is stopped for good
    Halted,
}

/// Lifecycle controller for one power-on session
pub struct Lifecycle<P, D, W, H> {
    config: DeviceConfig,
    board: Board<P, D, W, H>,
    state: PersistentState,
    decoder: PngDecoder,
    tracker: ElapsedTracker,
}

impl<P, D, W, H> Lifecycle<P, D, W, H>
where
    P: Platform,
    D: EinkDisplay,
    W: WifiRadio,
    H: HttpClient,
{
    pub fn new(config: DeviceConfig, board: Board<P, D, W, H>) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = PersistentState::initial(
            config.initial_schedule,
            config.timing.battery_check_period,
        );
        let tracker = ElapsedTracker::new(board.platform.now_us());
        Ok(Self {
            config,
            board,
            state,
            decoder: PngDecoder::new(),
            tracker,
        })
    }

    /// Restore state after a timer wake, or set the device up from scratch
    pub fn boot(&mut self) -> Cycle {
        if self.board.platform.wake_cause() == WakeCause::Timer {
            if let Some(state) = self.board.platform.load() {
                info!("Timer wake, restoring state");
                self.state = state;
                self.tracker = ElapsedTracker::new(self.board.platform.now_us());
                return Cycle::Continue;
            }
            warn!("Timer wake without retained state");
        }

        info!("Cold boot");
        self.board.display.set_rotation(self.config.rotation);
        if !self.battery_ok() {
            return Cycle::Halted;
        }
        status::show_kind(
            &mut self.board.display,
            &mut self.decoder,
            &self.config,
            StatusImageKind::Initial,
        );
        self.state = PersistentState::initial(
            self.config.initial_schedule,
            self.config.timing.battery_check_period,
        );
        self.tracker = ElapsedTracker::new(self.board.platform.now_us());
        Cycle::Continue
    }

    /// Sleep until the next deadline, then handle what is due
    pub fn cycle(&mut self) -> Cycle {
        let timing = self.config.timing;
        let radio_on = self.board.radio.is_powered();
        let now = self.board.platform.now_us();
        self.tracker.account(&mut self.state, &timing, now);

        let delay = next_deadline(&self.state, &timing, radio_on);
        if let Some(plan) = plan_sleep(&timing, delay, radio_on) {
            if self.sleep(plan) == Cycle::PoweredDown {
                return Cycle::PoweredDown;
            }
            self.tracker.slept(plan.duration_ds);
        }
        self.dispatch()
    }

    /// Boot, then cycle until the session ends
    pub fn run(&mut self) -> Cycle {
        let mut outcome = self.boot();
        while outcome == Cycle::Continue {
            outcome = self.cycle();
        }
        outcome
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    pub fn board(&self) -> &Board<P, D, W, H> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<P, D, W, H> {
        &mut self.board
    }

    /// End the session and hand the peripherals back
    pub fn into_board(self) -> Board<P, D, W, H> {
        self.board
    }

    fn sleep(&mut self, plan: SleepPlan) -> Cycle {
        match plan.mode {
            SleepMode::BusyWait => {
                debug!("Waiting {} ds", plan.duration_ds);
                let ms = (plan.duration_ds as u32).saturating_mul(100);
                self.board.platform.delay_ms(ms);
                self.state.elapse(plan.duration_ds, plan.battery_mult);
            }
            SleepMode::LightSleep => {
                debug!("Entering light sleep for {} ds", plan.duration_ds);
                self.state.elapse(plan.duration_ds, plan.battery_mult);
                self.board.platform.light_sleep_us(plan.duration_us());
            }
            SleepMode::DeepSleep => {
                info!("Entering deep sleep for {} ds", plan.duration_ds);
                self.state.elapse(plan.duration_ds, plan.battery_mult);
                self.board.platform.store(&self.state);
                self.board.platform.deep_sleep_us(plan.duration_us());
                return Cycle::PoweredDown;
            }
        }
        Cycle::Continue
    }

    fn dispatch(&mut self) -> Cycle {
        if self.state.battery_countdown <= 0 {
            if !self.battery_ok() {
                return Cycle::Halted;
            }
            self.state.battery_countdown = self.config.timing.battery_check_period;
        }

        if self.state.request_countdown_ds <= 0 {
            info!("Requesting content");
            transport::request_content(
                &mut self.state,
                &self.config,
                &mut self.board,
                &mut self.decoder,
            );
        }

        if self.state.screensaver_countdown_ds <= 0 {
            info!("Showing screensaver");
            status::show_id(
                &mut self.board.display,
                &mut self.decoder,
                &self.config,
                &self.state.screensaver_id,
            );
            self.state.screensaver_countdown_ds = NEVER;
        }
        Cycle::Continue
    }

    /// Check the battery; on a flat cell, warn on screen and stop for good
    fn battery_ok(&mut self) -> bool {
        let millivolts = self.board.display.battery_millivolts();
        if millivolts >= self.config.timing.low_battery_mv {
            debug!("Battery at {} mV", millivolts);
            return true;
        }
        error!("Battery low ({} mV), halting", millivolts);
        status::show_kind(
            &mut self.board.display,
            &mut self.decoder,
            &self.config,
            StatusImageKind::LowBattery,
        );
        self.board.radio.power_off();
        self.board.platform.halt();
        false
    }
}
