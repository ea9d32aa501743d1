//! Simulated Wi-Fi radio
//!
//! Joins instantly when the SSID is in range and the password matches.

use inkwake_hal::{LinkStatus, WifiRadio};
use log::{debug, info};

use crate::config::AccessPoint;

pub struct SimRadio {
    access_points: Vec<AccessPoint>,
    status: LinkStatus,
}

impl SimRadio {
    pub fn new(access_points: Vec<AccessPoint>) -> Self {
        Self {
            access_points,
            status: LinkStatus::Off,
        }
    }
}

impl WifiRadio for SimRadio {
    fn status(&self) -> LinkStatus {
        self.status
    }

    fn begin(&mut self, ssid: &str, password: Option<&str>) {
        let joined = self
            .access_points
            .iter()
            .any(|ap| ap.ssid == ssid && ap.password.as_deref() == password);
        self.status = if joined {
            info!("associated with {}", ssid);
            LinkStatus::Connected
        } else {
            debug!("association with {} failed", ssid);
            LinkStatus::Failed
        };
    }

    fn disconnect(&mut self) {
        if self.status != LinkStatus::Off {
            self.status = LinkStatus::Idle;
        }
    }

    fn scan<F: FnMut(&str)>(&mut self, mut on_network: F) {
        if self.status == LinkStatus::Off {
            self.status = LinkStatus::Idle;
        }
        for ap in &self.access_points {
            on_network(&ap.ssid);
        }
    }

    fn power_off(&mut self) {
        debug!("radio off");
        self.status = LinkStatus::Off;
    }
}
