//! Device configuration
//!
//! Everything here is fixed when the firmware is built: server URLs, Wi-Fi
//! credentials, the initial retry schedule, panel settings, status images,
//! and the power/timing tunables.

use alloc::vec::Vec;

use inkwake_display::{Palette, Rotation};
use inkwake_protocol::MAX_SCHEDULE_LEN;

use crate::catalog::StatusCatalog;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Initial schedule has no entries
    EmptySchedule,
    /// Initial schedule longer than the state can hold
    ScheduleTooLong,
    /// Schedule entry is zero or negative
    NonPositiveSchedule(usize),
    /// No server URLs to try
    NoTransports,
    /// SSID order is not a sorted permutation of the network table
    NetworkOrder,
    /// Timing value out of range
    Timing,
}

/// Power and timing tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Battery countdown reload value, in weighted units
    pub battery_check_period: i32,
    /// Below this the device shows the low battery image and halts
    pub low_battery_mv: u32,
    /// Battery countdown weight while awake with the radio on
    pub mult_radio_on: i32,
    /// Battery countdown weight while awake with the radio off
    pub mult_awake: i32,
    pub mult_light_sleep: i32,
    pub mult_deep_sleep: i32,
    /// Shorter waits are spent busy-waiting
    pub min_light_sleep_ds: i32,
    /// Shorter sleeps are light sleeps
    pub min_deep_sleep_ds: i32,
    /// How long to wait for one network to associate
    pub wifi_connect_timeout_ms: u32,
    pub wifi_poll_interval_ms: u32,
    /// Power the radio down when the next request is at least this far out
    pub radio_off_threshold_ds: i32,
    /// With fewer known networks than this, skip scanning
    pub scan_threshold: usize,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            // Ten minutes at the radio-on weight
            battery_check_period: 10 * 60 * 10 * 20,
            low_battery_mv: 3700,
            mult_radio_on: 20,
            mult_awake: 10,
            mult_light_sleep: 5,
            mult_deep_sleep: 1,
            min_light_sleep_ds: 50,
            min_deep_sleep_ds: 150,
            wifi_connect_timeout_ms: 20_000,
            wifi_poll_interval_ms: 200,
            radio_off_threshold_ds: 60 * 10,
            scan_threshold: 2,
        }
    }
}

impl Timing {
    fn validate(&self) -> Result<(), ConfigError> {
        let multipliers = [
            self.mult_radio_on,
            self.mult_awake,
            self.mult_light_sleep,
            self.mult_deep_sleep,
        ];
        if self.battery_check_period <= 0
            || multipliers.iter().any(|&m| m <= 0)
            || self.min_light_sleep_ds > self.min_deep_sleep_ds
            || self.wifi_poll_interval_ms == 0
        {
            return Err(ConfigError::Timing);
        }
        Ok(())
    }
}

/// A known Wi-Fi network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiNetwork {
    pub ssid: &'static str,
    /// `None` for open networks
    pub password: Option<&'static str>,
}

/// Known networks in priority order, plus their order by SSID
///
/// The same SSID may appear more than once with different credentials.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    networks: &'static [WifiNetwork],
    by_ssid: Vec<usize>,
}

impl NetworkTable {
    /// Build the table, sorting by SSID (stable, so equal SSIDs keep
    /// priority order)
    pub fn new(networks: &'static [WifiNetwork]) -> Self {
        let mut by_ssid: Vec<usize> = (0..networks.len()).collect();
        by_ssid.sort_by_key(|&index| networks[index].ssid);
        Self { networks, by_ssid }
    }

    /// Use an SSID order computed ahead of time
    pub fn with_order(
        networks: &'static [WifiNetwork],
        by_ssid: &[usize],
    ) -> Result<Self, ConfigError> {
        let mut seen = alloc::vec![false; networks.len()];
        if by_ssid.len() != networks.len() {
            return Err(ConfigError::NetworkOrder);
        }
        for &index in by_ssid {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(ConfigError::NetworkOrder),
            }
        }
        let sorted = by_ssid
            .windows(2)
            .all(|pair| networks[pair[0]].ssid <= networks[pair[1]].ssid);
        if !sorted {
            return Err(ConfigError::NetworkOrder);
        }
        Ok(Self {
            networks,
            by_ssid: by_ssid.to_vec(),
        })
    }

    /// Networks in priority order
    pub fn networks(&self) -> &'static [WifiNetwork] {
        self.networks
    }

    /// Priority indices in SSID order
    pub fn by_ssid(&self) -> &[usize] {
        &self.by_ssid
    }

    pub fn get(&self, index: usize) -> Option<&'static WifiNetwork> {
        self.networks.get(index)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Everything the lifecycle needs to know about this particular device
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Server URLs in priority order
    pub transports: &'static [&'static str],
    pub networks: NetworkTable,
    /// Retry schedule used at cold boot and after an interrupted download
    pub initial_schedule: &'static [i32],
    pub rotation: Rotation,
    pub palette: Palette<'static>,
    pub catalog: StatusCatalog,
    pub timing: Timing,
}

impl DeviceConfig {
    /// Check the invariants the lifecycle relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_schedule.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if self.initial_schedule.len() > MAX_SCHEDULE_LEN {
            return Err(ConfigError::ScheduleTooLong);
        }
        if let Some(pos) = self.initial_schedule.iter().position(|&ds| ds <= 0) {
            return Err(ConfigError::NonPositiveSchedule(pos));
        }
        if self.transports.is_empty() {
            return Err(ConfigError::NoTransports);
        }
        self.timing.validate()
    }
}
