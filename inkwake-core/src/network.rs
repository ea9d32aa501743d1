//! Wi-Fi network selection
//!
//! Picks at most [`MAX_SHORTLIST`] known networks to try, in priority order.
//! With only a handful of known networks it just tries the first ones; with
//! more it scans first and only tries networks that are actually in range.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use inkwake_hal::{LinkStatus, MonotonicClock, WifiRadio};

use crate::config::{NetworkTable, Timing};
use crate::logging::{debug, error, info};

/// Most networks attempted per connection attempt
pub const MAX_SHORTLIST: usize = 3;

/// Priority indices to try, ascending (most preferred first)
pub type Shortlist = Vec<usize, MAX_SHORTLIST>;

/// Insert `index` keeping the shortlist sorted and bounded
///
/// When full, the least preferred entry falls off; an index less preferred
/// than everything already held is ignored.
pub fn insert_candidate(shortlist: &mut Shortlist, index: usize) {
    let pos = shortlist.partition_point(|&held| held < index);
    if pos >= MAX_SHORTLIST {
        return;
    }
    if shortlist.is_full() {
        shortlist.pop();
    }
    // Cannot fail: there is room after the pop
    let _ = shortlist.insert(pos, index);
}

/// Chooses and connects to a Wi-Fi network
pub struct NetworkSelector<'a> {
    table: &'a NetworkTable,
    timing: &'a Timing,
}

impl<'a> NetworkSelector<'a> {
    pub fn new(table: &'a NetworkTable, timing: &'a Timing) -> Self {
        Self { table, timing }
    }

    /// Networks worth trying right now
    pub fn shortlist<R: WifiRadio>(&self, radio: &mut R) -> Shortlist {
        let mut shortlist = Shortlist::new();
        if self.table.len() < self.timing.scan_threshold {
            for index in 0..self.table.len().min(MAX_SHORTLIST) {
                let _ = shortlist.push(index);
            }
            return shortlist;
        }

        let networks = self.table.networks();
        let by_ssid = self.table.by_ssid();
        radio.scan(|ssid| {
            let start = by_ssid.partition_point(|&index| networks[index].ssid < ssid);
            for (j, &index) in by_ssid.iter().enumerate().skip(start) {
                if networks[index].ssid != ssid {
                    break;
                }
                // The same SSID can show up several times in one scan
                if j == start && shortlist.contains(&index) {
                    break;
                }
                insert_candidate(&mut shortlist, index);
            }
        });
        debug!("Wi-Fi shortlist has {} networks", shortlist.len());
        shortlist
    }

    /// Make sure the radio is associated with some known network
    ///
    /// Does nothing if already connected. Otherwise drops any stale
    /// association and tries each shortlisted network in turn, giving each
    /// one the configured timeout.
    pub fn connect<R, T>(&self, radio: &mut R, timer: &mut T) -> bool
    where
        R: WifiRadio,
        T: MonotonicClock + DelayNs,
    {
        if radio.status() == LinkStatus::Connected {
            return true;
        }
        info!("Connecting to Wi-Fi");
        radio.disconnect();

        for &index in self.shortlist(radio).iter() {
            let Some(network) = self.table.get(index) else {
                continue;
            };
            if self.try_network(radio, timer, network.ssid, network.password) {
                info!("Connected to {}", network.ssid);
                return true;
            }
        }
        error!("Failed to connect to Wi-Fi");
        false
    }

    fn try_network<R, T>(
        &self,
        radio: &mut R,
        timer: &mut T,
        ssid: &str,
        password: Option<&str>,
    ) -> bool
    where
        R: WifiRadio,
        T: MonotonicClock + DelayNs,
    {
        debug!("Trying {}", ssid);
        let timeout_us = self.timing.wifi_connect_timeout_ms as u64 * 1000;
        let start = timer.now_us();
        radio.begin(ssid, password);
        while timer.now_us().saturating_sub(start) < timeout_us {
            if radio.status() == LinkStatus::Connected {
                return true;
            }
            timer.delay_ms(self.timing.wifi_poll_interval_ms);
        }
        radio.status() == LinkStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WifiNetwork;
    use crate::testing::{FakePlatform, FakeRadio};
    use proptest::prelude::*;

    static NETWORKS: [WifiNetwork; 6] = [
        WifiNetwork { ssid: "office", password: Some("o") },
        WifiNetwork { ssid: "home", password: Some("h1") },
        WifiNetwork { ssid: "phone", password: None },
        WifiNetwork { ssid: "home", password: Some("h2") },
        WifiNetwork { ssid: "library", password: None },
        WifiNetwork { ssid: "cafe", password: Some("c") },
    ];

    fn selector_for(table: &NetworkTable, timing: &Timing, radio: &mut FakeRadio) -> Shortlist {
        NetworkSelector::new(table, timing).shortlist(radio)
    }

    #[test]
    fn test_insert_candidate_keeps_best_three() {
        let mut shortlist = Shortlist::new();
        for index in [5, 2, 7, 1, 9, 0] {
            insert_candidate(&mut shortlist, index);
        }
        assert_eq!(shortlist.as_slice(), &[0, 1, 2]);

        // Less preferred than everything held: no effect
        insert_candidate(&mut shortlist, 3);
        assert_eq!(shortlist.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_below_threshold_skips_scan() {
        static ONE: [WifiNetwork; 1] = [WifiNetwork { ssid: "solo", password: None }];
        let table = NetworkTable::new(&ONE);
        let timing = Timing::default();
        let mut radio = FakeRadio::default();
        assert_eq!(selector_for(&table, &timing, &mut radio).as_slice(), &[0]);
        assert_eq!(radio.scans, 0);
    }

    #[test]
    fn test_below_threshold_caps_at_three() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing {
            scan_threshold: 100,
            ..Timing::default()
        };
        let mut radio = FakeRadio::default();
        assert_eq!(selector_for(&table, &timing, &mut radio).as_slice(), &[0, 1, 2]);
        assert_eq!(radio.scans, 0);
    }

    #[test]
    fn test_scan_filters_to_visible() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["neighbour", "cafe", "library"]);
        assert_eq!(selector_for(&table, &timing, &mut radio).as_slice(), &[4, 5]);
        assert_eq!(radio.scans, 1);
    }

    #[test]
    fn test_duplicate_ssid_entries_all_considered() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["cafe", "home", "home"]);
        assert_eq!(selector_for(&table, &timing, &mut radio).as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn test_nothing_visible() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["elsewhere"]);
        assert!(selector_for(&table, &timing, &mut radio).is_empty());
    }

    #[test]
    fn test_connect_tries_in_priority_order() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["home", "cafe", "library"]);
        // Only the second "home" entry has the right password
        radio.accept("home", Some("h2"));
        let mut platform = FakePlatform::default();

        assert!(NetworkSelector::new(&table, &timing).connect(&mut radio, &mut platform));
        assert_eq!(radio.attempts, ["home", "home"]);
        assert_eq!(radio.disconnects, 1);
        // The first attempt burned the full timeout
        assert!(platform.now >= 20_000_000);
    }

    #[test]
    fn test_connect_already_connected() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["home"]);
        radio.accept("home", Some("h1"));
        radio.begin("home", Some("h1"));
        radio.attempts.clear();
        let mut platform = FakePlatform::default();

        assert!(NetworkSelector::new(&table, &timing).connect(&mut radio, &mut platform));
        assert!(radio.attempts.is_empty());
        assert_eq!(radio.scans, 0);
    }

    #[test]
    fn test_connect_failure() {
        let table = NetworkTable::new(&NETWORKS);
        let timing = Timing::default();
        let mut radio = FakeRadio::with_visible(&["phone", "office"]);
        let mut platform = FakePlatform::default();

        assert!(!NetworkSelector::new(&table, &timing).connect(&mut radio, &mut platform));
        assert_eq!(radio.attempts, ["office", "phone"]);
        assert_ne!(radio.status(), LinkStatus::Connected);
    }

    proptest! {
        #[test]
        fn prop_shortlist_ignores_scan_order(
            order in Just(alloc::vec![
                "library", "office", "cafe", "home", "phone", "stranger", "home"
            ]).prop_shuffle()
        ) {
            let table = NetworkTable::new(&NETWORKS);
            let timing = Timing::default();
            let mut radio = FakeRadio::with_visible(&order);
            let shortlist = selector_for(&table, &timing, &mut radio);
            prop_assert_eq!(shortlist.as_slice(), &[0, 1, 2]);
        }
    }
}
