//! Display backend traits
//!
//! Defines the interface panel drivers implement and the sink adapter that
//! joins the image decoder to a palette.

use crate::color::{Color, Rotation};
use crate::palette::Palette;

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with the panel controller
    Communication,
    /// Image data the driver cannot render
    UnsupportedImage,
    /// Panel refresh failed or timed out
    Refresh,
}

/// Anything that accepts panel-coloured pixels
///
/// Coordinates outside the drawable area are ignored.
pub trait PixelSink {
    fn put_pixel(&mut self, x: u32, y: u32, color: Color);
}

/// Anything that accepts full-colour pixels
pub trait RgbSink {
    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

/// An e-ink panel with a local frame buffer
///
/// Drawing only touches the buffer; nothing reaches the glass until
/// [`EinkDisplay::flush`].
pub trait EinkDisplay: PixelSink {
    /// Logical size (width, height) after rotation
    fn size(&self) -> (u32, u32);

    /// Set the frame buffer to the background colour
    fn clear(&mut self);

    /// Push the frame buffer to the panel
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Set the mapping from logical to panel coordinates
    fn set_rotation(&mut self, rotation: Rotation);

    /// Battery voltage in millivolts, as measured by the panel board
    fn battery_millivolts(&mut self) -> u32;

    /// Render a baseline JPEG at the origin
    fn draw_jpeg(&mut self, data: &[u8]) -> Result<(), DisplayError>;
}

/// Adapts a [`PixelSink`] into an [`RgbSink`] by quantizing every pixel
pub struct Quantizer<'a, S: ?Sized> {
    sink: &'a mut S,
    palette: Palette<'a>,
}

impl<'a, S: PixelSink + ?Sized> Quantizer<'a, S> {
    pub fn new(sink: &'a mut S, palette: Palette<'a>) -> Self {
        Self { sink, palette }
    }
}

impl<S: PixelSink + ?Sized> RgbSink for Quantizer<'_, S> {
    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let color = self.palette.quantize(rgb);
        self.sink.put_pixel(x, y, color);
    }
}
