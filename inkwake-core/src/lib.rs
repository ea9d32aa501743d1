//! Board-agnostic lifecycle controller for battery-powered e-ink displays
//!
//! This crate contains all device logic that does not depend on specific
//! hardware implementations:
//!
//! - Persistent state and its countdown arithmetic
//! - Status image catalog lookup
//! - Wi-Fi network selection
//! - Response parsing with atomic commit
//! - Transport sequencing and retry backoff
//! - Time-budget scheduling and sleep selection
//! - The wake/sleep lifecycle that ties them together
//!
//! Hardware is reached only through the `inkwake-hal` and `inkwake-display`
//! traits, bundled into a [`lifecycle::Board`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub(crate) mod logging;

pub mod catalog;
pub mod config;
pub mod lifecycle;
pub mod network;
pub mod response;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{CatalogError, StatusCatalog, StatusImage, StatusImageKind};
pub use config::{ConfigError, DeviceConfig, NetworkTable, Timing, WifiNetwork};
pub use lifecycle::{Board, Cycle, Lifecycle, Platform};
pub use response::ResponseError;
pub use state::PersistentState;
