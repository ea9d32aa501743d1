//! Monotonic clock abstraction

/// Microsecond clock that never goes backwards while the device is powered
///
/// The value is allowed to restart from zero after a deep sleep; the
/// controller only compares readings taken within one boot.
pub trait MonotonicClock {
    /// Microseconds since an arbitrary epoch
    fn now_us(&self) -> u64;
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
