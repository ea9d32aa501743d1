//! Inkwake Platform Abstraction Layer
//!
//! This crate defines the platform traits the lifecycle controller consumes.
//! A chip port (or the host simulator) implements them; the controller never
//! touches hardware directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Lifecycle controller (inkwake-core)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inkwake-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip port    │       │  inkwake-sim  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`clock::MonotonicClock`] - Microsecond wall clock
//! - [`sleep::SleepControl`] - Light/deep sleep, halt, wake cause
//! - [`retained::RetainedMemory`] - Sleep-surviving snapshot slot
//! - [`radio::WifiRadio`] - Wi-Fi station control and scanning
//! - [`http::HttpClient`] - Request/response exchange with a streamed body
//!
//! Busy waiting uses `embedded_hal::delay::DelayNs` and is not redefined here.

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod http;
pub mod radio;
pub mod retained;
pub mod sleep;

// Re-export key traits at crate root for convenience
pub use clock::MonotonicClock;
pub use http::{HttpClient, HttpResponse};
pub use radio::{LinkStatus, WifiRadio};
pub use retained::RetainedMemory;
pub use sleep::{SleepControl, WakeCause};
