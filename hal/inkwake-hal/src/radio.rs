//! Wi-Fi station abstraction

/// Connection state reported by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Radio powered down
    Off,
    /// Powered, not associated
    Idle,
    /// Association in progress
    Connecting,
    /// Associated and holding an address
    Connected,
    /// Last association attempt failed
    Failed,
}

/// Wi-Fi station driver
///
/// All calls are synchronous. `begin` only starts an association; the caller
/// polls [`WifiRadio::status`] until it reads [`LinkStatus::Connected`] or
/// gives up.
pub trait WifiRadio {
    /// Current link state
    fn status(&self) -> LinkStatus;

    /// Whether the radio is drawing power
    fn is_powered(&self) -> bool {
        self.status() != LinkStatus::Off
    }

    /// Start associating with `ssid`, powering the radio up if needed
    fn begin(&mut self, ssid: &str, password: Option<&str>);

    /// Drop any association, leaving the radio powered
    fn disconnect(&mut self);

    /// Run a blocking scan, reporting each visible network name
    ///
    /// Names may repeat and arrive in any order.
    fn scan<F: FnMut(&str)>(&mut self, on_network: F);

    /// Power the radio down
    fn power_off(&mut self);
}
