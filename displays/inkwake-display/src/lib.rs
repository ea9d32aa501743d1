//! Display abstraction and image rendering for Inkwake
//!
//! This crate provides:
//! - `EinkDisplay` trait for panel drivers, built on the `PixelSink` capability
//! - `Palette`, the closed set of colour reductions a panel can use
//! - `PngDecoder`, a push-based PNG decoder that renders rows as they inflate
//! - `draw_image` / `draw_png_from_reader` to put status images and streamed
//!   server images on the panel
//!
//! # Architecture
//!
//! ```text
//! bytes ──► PngDecoder ──(x, y, rgb)──► Quantizer ──(x, y, Color)──► EinkDisplay
//!                                         ▲
//!                                      Palette
//! ```
//!
//! The decoder never sees panel colours and the panel never sees RGB; the
//! palette is injected once, where the two meet.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod color;
pub mod image;
pub mod palette;
pub mod png;

// Re-export key types
pub use backend::{DisplayError, EinkDisplay, PixelSink, Quantizer, RgbSink};
pub use color::{Color, Rotation};
pub use image::{
    draw_image, draw_png_from_reader, sniff, ImageError, ImageFormat, PNG_SIGNATURE, READ_CHUNK,
};
pub use palette::{Palette, PaletteEntry, SEVEN_COLOR};
pub use png::{PngDecoder, PngError};
