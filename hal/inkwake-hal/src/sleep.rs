//! Sleep and power control
//!
//! Three ways to spend time are available to the controller, from most to
//! least expensive: a busy wait (`DelayNs`), light sleep, and deep sleep.

/// Why the device started executing from the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// Deep sleep timer expired; retained memory holds a snapshot
    Timer,
    /// Power-on, reset button, brown-out or anything else
    ColdBoot,
}

/// Platform sleep primitives
pub trait SleepControl {
    /// Cause of the most recent boot
    fn wake_cause(&self) -> WakeCause;

    /// Suspend the CPU for `us` microseconds, keeping RAM contents
    ///
    /// Returns once the timer fires.
    fn light_sleep_us(&mut self, us: u64);

    /// Power down everything but the wake timer and retained memory
    ///
    /// On hardware this does not return: the device reboots with
    /// [`WakeCause::Timer`]. Hosted implementations may return, in which case
    /// the caller must treat the current boot as finished.
    fn deep_sleep_us(&mut self, us: u64);

    /// Stop for good (until an external reset)
    ///
    /// Same return contract as [`SleepControl::deep_sleep_us`].
    fn halt(&mut self);
}
