//! Simulation settings
//!
//! Device tables are compiled in from device.toml (see `device`); this file
//! covers how the simulated world behaves around the device.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use inkwake_core::{DeviceConfig, NetworkTable, StatusCatalog, Timing};
use serde::Deserialize;

use crate::device;

/// A network the simulated radio can see
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessPoint {
    pub ssid: String,
    pub password: Option<String>,
}

/// Contents of simulation.toml
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub battery_mv: u32,
    pub time_scale: f64,
    pub output_dir: PathBuf,
    pub max_power_cycles: u32,
    pub http_timeout_s: u64,
    pub panel_width: u32,
    pub panel_height: u32,
    #[serde(rename = "access_point")]
    pub access_points: Vec<AccessPoint>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            battery_mv: 4100,
            time_scale: 0.0,
            output_dir: PathBuf::from("frames"),
            max_power_cycles: 8,
            http_timeout_s: 30,
            panel_width: 800,
            panel_height: 600,
            access_points: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: SimConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.time_scale),
            "time_scale must be between 0 and 1"
        );
        ensure!(
            self.panel_width > 0 && self.panel_height > 0,
            "panel dimensions must be non-zero"
        );
        ensure!(self.http_timeout_s > 0, "http_timeout_s must be non-zero");
        Ok(())
    }
}

/// The compiled-in device configuration
pub fn device_config() -> Result<DeviceConfig> {
    let catalog = StatusCatalog::new(
        &device::STATUS_IMAGES,
        device::INITIAL_IMAGE,
        device::LOW_BATTERY_IMAGE,
    )
    .map_err(|e| anyhow::anyhow!("status image catalog: {e:?}"))?;
    let networks = NetworkTable::with_order(&device::NETWORKS, &device::NETWORK_ORDER)
        .map_err(|e| anyhow::anyhow!("network table: {e:?}"))?;

    let config = DeviceConfig {
        transports: &device::TRANSPORTS,
        networks,
        initial_schedule: &device::INITIAL_SCHEDULE_DS,
        rotation: device::ROTATION,
        palette: device::PALETTE,
        catalog,
        timing: Timing::default(),
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("device configuration: {e:?}"))?;
    Ok(config)
}
