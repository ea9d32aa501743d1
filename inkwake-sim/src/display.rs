//! Simulated e-ink panel
//!
//! Keeps a frame buffer of panel colours in native (landscape) orientation.
//! Every flush writes the buffer out as a numbered PPM file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use inkwake_display::{Color, DisplayError, EinkDisplay, PixelSink, Rotation};
use log::{info, warn};

pub struct SimDisplay {
    width: u32,
    height: u32,
    rotation: Rotation,
    frame: Vec<Color>,
    battery_mv: u32,
    output_dir: PathBuf,
    flushes: u32,
}

impl SimDisplay {
    pub fn new(width: u32, height: u32, battery_mv: u32, output_dir: PathBuf) -> Self {
        Self {
            width,
            height,
            rotation: Rotation::default(),
            frame: vec![Color::White; (width * height) as usize],
            battery_mv,
            output_dir,
            flushes: 0,
        }
    }

    /// Map logical coordinates to a frame buffer index
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        let (w, h) = (self.width, self.height);
        let (px, py) = match self.rotation {
            Rotation::Landscape => (x, y),
            Rotation::PortraitRight => (w.checked_sub(1 + y)?, x),
            Rotation::LandscapeUpsideDown => (w.checked_sub(1 + x)?, h.checked_sub(1 + y)?),
            Rotation::PortraitLeft => (y, h.checked_sub(1 + x)?),
        };
        (px < w && py < h).then(|| (py * w + px) as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.frame[i])
    }

    fn encode_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.reserve(self.frame.len() * 3);
        for color in &self.frame {
            out.extend_from_slice(&color.to_rgb());
        }
        out
    }

    fn write_frame(&self) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("frame-{:04}.ppm", self.flushes));
        fs::File::create(&path)?.write_all(&self.encode_ppm())?;
        Ok(path)
    }
}

impl PixelSink for SimDisplay {
    fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.frame[i] = color;
        }
    }
}

impl EinkDisplay for SimDisplay {
    fn size(&self) -> (u32, u32) {
        if self.rotation.is_portrait() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    fn clear(&mut self) {
        self.frame.fill(Color::White);
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.flushes += 1;
        match self.write_frame() {
            Ok(path) => {
                info!("panel refreshed: {}", path.display());
                Ok(())
            }
            Err(e) => {
                warn!("failed to write frame: {e}");
                Err(DisplayError::Refresh)
            }
        }
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    fn battery_millivolts(&mut self) -> u32 {
        self.battery_mv
    }

    fn draw_jpeg(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        warn!("JPEG rendering not simulated ({} bytes)", data.len());
        Err(DisplayError::UnsupportedImage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(rotation: Rotation) -> SimDisplay {
        let mut display = SimDisplay::new(4, 2, 4000, std::env::temp_dir());
        display.set_rotation(rotation);
        display
    }

    #[test]
    fn test_size_follows_rotation() {
        assert_eq!(display(Rotation::Landscape).size(), (4, 2));
        assert_eq!(display(Rotation::PortraitLeft).size(), (2, 4));
    }

    #[test]
    fn test_rotated_origin() {
        let mut d = display(Rotation::PortraitLeft);
        d.put_pixel(0, 0, Color::Black);
        // Logical origin lands in the panel's bottom-left corner
        assert_eq!(d.frame[4], Color::Black);

        let mut d = display(Rotation::LandscapeUpsideDown);
        d.put_pixel(0, 0, Color::Red);
        assert_eq!(d.frame[7], Color::Red);

        let mut d = display(Rotation::PortraitRight);
        d.put_pixel(0, 0, Color::Blue);
        assert_eq!(d.frame[3], Color::Blue);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut d = display(Rotation::PortraitLeft);
        d.put_pixel(2, 0, Color::Black);
        d.put_pixel(0, 4, Color::Black);
        assert!(d.frame.iter().all(|&c| c == Color::White));
        assert_eq!(d.pixel(1, 3), Some(Color::White));
    }

    #[test]
    fn test_ppm_layout() {
        let mut d = display(Rotation::Landscape);
        d.put_pixel(1, 0, Color::Black);
        let ppm = d.encode_ppm();
        let header = b"P6\n4 2\n255\n";
        assert!(ppm.starts_with(header));
        assert_eq!(ppm.len(), header.len() + 4 * 2 * 3);
        assert_eq!(&ppm[header.len() + 3..header.len() + 6], &[0, 0, 0]);
    }
}
