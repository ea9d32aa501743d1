//! Persistent device state
//!
//! The only data that lives across sleeps. It is copied byte for byte into
//! retained memory before deep sleep and back out on a timer wake, so the
//! layout is fixed with `repr(C)` and every field is plain data.

use inkwake_protocol::{ImageId, IMAGE_ID_LEN, MAX_SCHEDULE_LEN, NEVER};

/// Countdowns and retry schedule that survive deep sleep
///
/// All countdowns are in tenths of a second, except `battery_countdown`
/// which is in weighted units (see [`PersistentState::elapse`]). Every
/// countdown stays within `0..=NEVER`; `NEVER` means disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct PersistentState {
    /// Delay before each successive request; only the first `schedule_len`
    /// entries are meaningful
    pub schedule_ds: [i32; MAX_SCHEDULE_LEN],
    pub schedule_len: u32,
    /// Which schedule entry the current request countdown came from
    pub schedule_index: u32,
    pub request_countdown_ds: i32,
    /// Unspecified until the first successful response
    pub screensaver_id: ImageId,
    pub screensaver_countdown_ds: i32,
    pub battery_countdown: i32,
}

/// Subtract `time_ds * mult` from a countdown, clamping at zero
///
/// A disabled countdown stays disabled. If the product overflows, the
/// countdown is simply exhausted.
pub fn elapse_countdown(countdown: i32, time_ds: i32, mult: i32) -> i32 {
    if countdown == NEVER {
        return countdown;
    }
    match time_ds.max(0).checked_mul(mult) {
        Some(spent) if countdown > spent => countdown - spent,
        _ => 0,
    }
}

impl PersistentState {
    /// Cold boot state built from the compiled-in schedule
    ///
    /// `schedule` must be non-empty; anything past [`MAX_SCHEDULE_LEN`] is
    /// dropped.
    pub fn initial(schedule: &[i32], battery_period: i32) -> Self {
        let mut state = Self {
            schedule_ds: [NEVER; MAX_SCHEDULE_LEN],
            schedule_len: 0,
            schedule_index: 0,
            request_countdown_ds: NEVER,
            screensaver_id: [0; IMAGE_ID_LEN],
            screensaver_countdown_ds: NEVER,
            battery_countdown: battery_period,
        };
        state.load_schedule(schedule);
        state
    }

    /// The active part of the retry schedule
    pub fn schedule(&self) -> &[i32] {
        &self.schedule_ds[..self.schedule_len as usize]
    }

    /// Replace the schedule and restart it from the first entry
    fn load_schedule(&mut self, schedule: &[i32]) {
        let len = schedule.len().min(MAX_SCHEDULE_LEN);
        for (slot, &entry) in self.schedule_ds.iter_mut().zip(&schedule[..len]) {
            *slot = entry.max(0);
        }
        self.schedule_len = len as u32;
        self.schedule_index = 0;
        self.request_countdown_ds = self.schedule().first().copied().unwrap_or(NEVER);
    }

    /// Account for `time_ds` tenths of a second passing
    ///
    /// The request and screensaver countdowns run at wall-clock speed. The
    /// battery countdown runs `battery_mult` times faster, reflecting how
    /// hard the current power state drains the cell.
    pub fn elapse(&mut self, time_ds: i32, battery_mult: i32) {
        self.request_countdown_ds = elapse_countdown(self.request_countdown_ds, time_ds, 1);
        self.screensaver_countdown_ds =
            elapse_countdown(self.screensaver_countdown_ds, time_ds, 1);
        self.battery_countdown = elapse_countdown(self.battery_countdown, time_ds, battery_mult);
    }

    /// Step the schedule after a failed request
    ///
    /// The cursor moves forward at most one entry and then holds at the
    /// last one; the request countdown restarts from the entry it lands on.
    pub fn back_off(&mut self) {
        if self.schedule_index + 1 < self.schedule_len {
            self.schedule_index += 1;
        }
        self.request_countdown_ds = self
            .schedule()
            .get(self.schedule_index as usize)
            .copied()
            .unwrap_or(NEVER);
    }

    /// Adopt the timing a server response asked for
    ///
    /// Negative wire values are treated as zero.
    pub fn commit_response(
        &mut self,
        schedule: &[i32],
        screensaver_id: &ImageId,
        screensaver_countdown_ds: i32,
    ) {
        self.load_schedule(schedule);
        self.screensaver_id = *screensaver_id;
        self.screensaver_countdown_ds = screensaver_countdown_ds.max(0);
    }

    /// Forget a response whose image never arrived
    ///
    /// The schedule goes back to the compiled-in one and the screensaver is
    /// disabled.
    pub fn revert_to_defaults(&mut self, schedule: &[i32]) {
        self.load_schedule(schedule);
        self.screensaver_countdown_ds = NEVER;
    }
}
