//! Inkwake hosted device
//!
//! Runs the lifecycle controller against a simulated board: virtual clock
//! and sleep, a scripted Wi-Fi radio, real HTTP, and a panel that dumps each
//! refresh to a PPM file. Deep sleep ends a session; the runner then reboots
//! the controller with a timer wake, as the hardware would.
//!
//! Usage: `inkwake-sim [simulation.toml]`

mod config;
mod display;
mod http;
mod platform;
mod radio;
#[cfg(test)]
mod report;

/// Tables generated from device.toml
mod device {
    use inkwake_core::{StatusImage, WifiNetwork};
    use inkwake_display::{Palette, Rotation};

    include!(concat!(env!("OUT_DIR"), "/generated.rs"));
}

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use env_logger::{Builder, Env};
use inkwake_core::{Board, Cycle, Lifecycle};
use log::{error, info, warn};

use crate::config::SimConfig;
use crate::display::SimDisplay;
use crate::http::SimHttp;
use crate::platform::SimPlatform;
use crate::radio::SimRadio;

type SimBoard = Board<SimPlatform, SimDisplay, SimRadio, SimHttp>;

fn main() {
    if let Err(e) = run() {
        error!("simulation error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    initialize();

    let sim = match env::args().nth(1).map(PathBuf::from) {
        Some(path) => SimConfig::load(&path)?,
        None => {
            warn!("no simulation.toml given, using defaults");
            SimConfig::default()
        }
    };
    let device = config::device_config()?;
    for (name, id) in device::STATUS_IMAGE_NAMES.iter() {
        info!("status image {name}: {:02x}{:02x}{:02x}{:02x}..", id[0], id[1], id[2], id[3]);
    }

    let mut board: SimBoard = Board {
        platform: SimPlatform::new(sim.time_scale),
        display: SimDisplay::new(
            sim.panel_width,
            sim.panel_height,
            sim.battery_mv,
            sim.output_dir.clone(),
        ),
        radio: SimRadio::new(sim.access_points.clone()),
        http: SimHttp::new(Duration::from_secs(sim.http_timeout_s))?,
    };

    for power_cycle in 0..=sim.max_power_cycles {
        info!("session {} starting", power_cycle);
        let mut lifecycle = Lifecycle::new(device.clone(), board)
            .map_err(|e| anyhow::anyhow!("device configuration: {e:?}"))?;
        let outcome = lifecycle.run();
        board = lifecycle.into_board();

        if outcome == Cycle::Halted || board.platform.is_halted() {
            info!("device halted after {} deep sleeps", power_cycle);
            return Ok(());
        }
    }
    info!("power cycle limit ({}) reached", sim.max_power_cycles);
    Ok(())
}

fn initialize() {
    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };
    builder.format(|f, record| {
        writeln!(
            f,
            "[{:<5} {}] {}",
            record.level(),
            record.module_path().unwrap_or("-"),
            record.args()
        )
    });
    builder.init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}
