//! Sleep-surviving memory
//!
//! A single slot that keeps its contents across deep sleep but not across a
//! cold boot. The stored value is a byte-for-byte copy, so `T` must be plain
//! old data with a fixed layout.

/// One retained snapshot slot
pub trait RetainedMemory<T: Copy> {
    /// Overwrite the slot with `value`
    fn store(&mut self, value: &T);

    /// Read the slot back
    ///
    /// Returns `None` when nothing was stored since the last cold boot.
    fn load(&self) -> Option<T>;
}
