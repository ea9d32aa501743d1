//! Panel colours and orientation

/// A colour the panel can physically show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Black,
    White,
    /// Grey level in `0..=max`, where `max` is white
    Gray { level: u8, max: u8 },
    Green,
    Blue,
    Red,
    Yellow,
    Orange,
}

impl Color {
    /// Approximate sRGB rendition, used by hosted panels to dump frames
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0, 0, 0],
            Color::White => [255, 255, 255],
            Color::Gray { level, max } => {
                let max = max.max(1) as u16;
                let value = (level.min(max as u8) as u16 * 255 / max) as u8;
                [value, value, value]
            }
            Color::Green => [67, 138, 28],
            Color::Blue => [85, 94, 126],
            Color::Red => [138, 76, 91],
            Color::Yellow => [255, 243, 56],
            Color::Orange => [232, 126, 0],
        }
    }
}

/// Panel orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Landscape, bottom of the device down
    #[default]
    Landscape,
    /// Portrait, bottom of the device on the right
    PortraitRight,
    /// Landscape, upside down
    LandscapeUpsideDown,
    /// Portrait, bottom of the device on the left
    PortraitLeft,
}

impl Rotation {
    /// Clockwise quarter turns from the panel's native orientation
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Landscape => 0,
            Rotation::PortraitRight => 1,
            Rotation::LandscapeUpsideDown => 2,
            Rotation::PortraitLeft => 3,
        }
    }

    /// Whether logical width and height are swapped relative to the panel
    pub fn is_portrait(self) -> bool {
        self.quarter_turns() % 2 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_rgb_scales_to_max() {
        assert_eq!(Color::Gray { level: 0, max: 7 }.to_rgb(), [0, 0, 0]);
        assert_eq!(Color::Gray { level: 7, max: 7 }.to_rgb(), [255, 255, 255]);
        assert_eq!(Color::Gray { level: 15, max: 15 }.to_rgb(), [255, 255, 255]);
        // Out of range levels saturate instead of wrapping
        assert_eq!(Color::Gray { level: 9, max: 7 }.to_rgb(), [255, 255, 255]);
    }

    #[test]
    fn test_rotation_orientation() {
        assert!(!Rotation::Landscape.is_portrait());
        assert!(Rotation::PortraitLeft.is_portrait());
        assert!(Rotation::PortraitRight.is_portrait());
        assert_eq!(Rotation::LandscapeUpsideDown.quarter_turns(), 2);
    }
}
