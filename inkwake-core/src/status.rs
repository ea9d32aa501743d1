//! Showing status images
//!
//! Each call is a full screen update: clear, draw, flush. Drawing failures
//! are logged and otherwise ignored; a blank panel beats a stuck device.

use inkwake_display::{draw_image, EinkDisplay, PngDecoder};
use inkwake_protocol::ImageId;

use crate::catalog::{StatusImage, StatusImageKind};
use crate::config::DeviceConfig;
use crate::logging::warn;

/// Show the built-in image for `kind`
pub fn show_kind<D: EinkDisplay + ?Sized>(
    display: &mut D,
    decoder: &mut PngDecoder,
    config: &DeviceConfig,
    kind: StatusImageKind,
) {
    let image = config.catalog.by_kind(kind);
    show(display, decoder, config, Some(image));
}

/// Show the catalog image with identifier `id`, or a blank screen if the
/// catalog has no such image
pub fn show_id<D: EinkDisplay + ?Sized>(
    display: &mut D,
    decoder: &mut PngDecoder,
    config: &DeviceConfig,
    id: &ImageId,
) {
    let image = config.catalog.by_id(id);
    if image.is_none() {
        warn!("No status image with the requested id; clearing screen");
    }
    show(display, decoder, config, image);
}

fn show<D: EinkDisplay + ?Sized>(
    display: &mut D,
    decoder: &mut PngDecoder,
    config: &DeviceConfig,
    image: Option<&StatusImage>,
) {
    display.clear();
    if let Some(image) = image {
        if let Err(err) = draw_image(display, config.palette, decoder, image.data) {
            warn!("Status image failed to draw: {:?}", err);
        }
    }
    if let Err(err) = display.flush() {
        warn!("Display flush failed: {:?}", err);
    }
}
