//! RGB to panel colour reduction
//!
//! Each variant is pure colour math with no state. No dithering: every pixel
//! is rounded on its own, so images look best when authored for the panel.

use crate::color::Color;

/// One colour of an N-colour panel with its nominal RGB value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaletteEntry {
    pub rgb: [u8; 3],
    pub color: Color,
}

/// The seven-colour ACeP panel, as measured rather than as advertised
pub const SEVEN_COLOR: [PaletteEntry; 7] = [
    PaletteEntry { rgb: [0, 0, 0], color: Color::Black },
    PaletteEntry { rgb: [255, 255, 255], color: Color::White },
    PaletteEntry { rgb: [67, 138, 28], color: Color::Green },
    PaletteEntry { rgb: [85, 94, 126], color: Color::Blue },
    PaletteEntry { rgb: [138, 76, 91], color: Color::Red },
    PaletteEntry { rgb: [255, 243, 56], color: Color::Yellow },
    PaletteEntry { rgb: [232, 126, 0], color: Color::Orange },
];

// Luma scaled by 1000 so the weights stay integral
const LUMA_WHITE: u32 = 255 * 1000;

/// Colour reduction strategy, chosen once per device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Palette<'a> {
    /// Black and white, thresholded at half luminance
    Monochrome,
    /// Eight grey levels
    Grayscale3Bit,
    /// Sixteen grey levels
    Grayscale4Bit,
    /// Nearest entry by squared RGB distance; ties go to the earlier entry
    Nearest(&'a [PaletteEntry]),
    /// Black, white and a red accent
    BlackWhiteRed,
}

impl Palette<'_> {
    /// Map an RGB pixel to the panel colour it should be drawn with
    pub fn quantize(&self, rgb: [u8; 3]) -> Color {
        match *self {
            Palette::Monochrome => {
                if luma_1000(rgb) >= LUMA_WHITE / 2 {
                    Color::White
                } else {
                    Color::Black
                }
            }
            Palette::Grayscale3Bit => gray(rgb, 7),
            Palette::Grayscale4Bit => gray(rgb, 15),
            Palette::Nearest(entries) => nearest(entries, rgb),
            Palette::BlackWhiteRed => black_white_red(rgb),
        }
    }
}

fn luma_1000([r, g, b]: [u8; 3]) -> u32 {
    299 * r as u32 + 587 * g as u32 + 114 * b as u32
}

fn gray(rgb: [u8; 3], max: u8) -> Color {
    let level = (max as u32 * luma_1000(rgb) + LUMA_WHITE / 2) / LUMA_WHITE;
    Color::Gray {
        level: level as u8,
        max,
    }
}

fn nearest(entries: &[PaletteEntry], [r, g, b]: [u8; 3]) -> Color {
    let mut best = Color::White;
    let mut best_distance = u32::MAX;
    for entry in entries {
        let dr = entry.rgb[0] as i32 - r as i32;
        let dg = entry.rgb[1] as i32 - g as i32;
        let db = entry.rgb[2] as i32 - b as i32;
        let distance = (dr * dr + dg * dg + db * db) as u32;
        if distance < best_distance {
            best = entry.color;
            best_distance = distance;
        }
    }
    best
}

fn black_white_red([r, g, b]: [u8; 3]) -> Color {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    if r >= 128 {
        if b + g < 255 {
            Color::Red
        } else {
            Color::White
        }
    } else {
        let to_black = r * r + g * g + b * b;
        let to_white = (255 - r) * (255 - r) + (255 - g) * (255 - g) + (255 - b) * (255 - b);
        if to_black < to_white {
            Color::Black
        } else {
            Color::White
        }
    }
}
