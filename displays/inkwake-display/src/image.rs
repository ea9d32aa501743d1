//! Putting encoded images on the panel
//!
//! Two entry points: [`draw_image`] for images already in memory (the status
//! catalog) and [`draw_png_from_reader`] for images streamed off the wire.
//! Both draw at the origin into the frame buffer and leave flushing to the
//! caller.

use embedded_io::Read;
use inkwake_protocol::Reader;

use crate::backend::{DisplayError, EinkDisplay, Quantizer};
use crate::palette::Palette;
use crate::png::{PngDecoder, PngError};

/// First eight bytes of every PNG file
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const JPEG_START: [u8; 2] = [0xFF, 0xD8];
const JPEG_END: [u8; 2] = [0xFF, 0xD9];

/// Bytes pulled from the wire per decoder feed
pub const READ_CHUNK: usize = 4096;

/// Encoded image formats recognised by [`sniff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// Image drawing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Neither a PNG nor a complete JPEG
    Unrecognized,
    /// The source ran out before the declared length
    Truncated,
    Png(PngError),
    Display(DisplayError),
}

impl From<PngError> for ImageError {
    fn from(err: PngError) -> Self {
        ImageError::Png(err)
    }
}

impl From<DisplayError> for ImageError {
    fn from(err: DisplayError) -> Self {
        ImageError::Display(err)
    }
}

/// Identify an in-memory image by its magic bytes
///
/// A JPEG only counts when both its start and end markers are present.
pub fn sniff(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if data.len() >= JPEG_START.len() + JPEG_END.len()
        && data.starts_with(&JPEG_START)
        && data.ends_with(&JPEG_END)
    {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Draw a complete PNG or JPEG held in memory
pub fn draw_image<D: EinkDisplay + ?Sized>(
    display: &mut D,
    palette: Palette<'_>,
    decoder: &mut PngDecoder,
    data: &[u8],
) -> Result<(), ImageError> {
    match sniff(data) {
        Some(ImageFormat::Png) => {
            decoder.reset();
            let mut sink = Quantizer::new(display, palette);
            decoder.feed(data, &mut sink)?;
            Ok(())
        }
        Some(ImageFormat::Jpeg) => Ok(display.draw_jpeg(data)?),
        None => Err(ImageError::Unrecognized),
    }
}

/// Stream a PNG of exactly `len` bytes from `reader` onto the display
///
/// The bytes are pulled in [`READ_CHUNK`] pieces. A decoder error stops
/// drawing but the rest of the image is still consumed, so the reader is left
/// just past the image either way. Running out of input wins over a decoder
/// error.
pub fn draw_png_from_reader<D, R>(
    display: &mut D,
    palette: Palette<'_>,
    decoder: &mut PngDecoder,
    reader: &mut Reader<R>,
    len: usize,
) -> Result<(), ImageError>
where
    D: EinkDisplay + ?Sized,
    R: Read,
{
    decoder.reset();
    let mut sink = Quantizer::new(display, palette);
    let mut buffer = [0u8; READ_CHUNK];
    let mut outcome = Ok(());
    let mut remaining = len;

    while remaining > 0 {
        let take = remaining.min(READ_CHUNK);
        reader.read_bytes(&mut buffer[..take]);
        if reader.passed_eof() {
            return Err(ImageError::Truncated);
        }
        remaining -= take;
        if outcome.is_ok() {
            outcome = decoder.feed(&buffer[..take], &mut sink);
        }
    }
    Ok(outcome?)
}
