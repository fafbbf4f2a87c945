use serde::{Deserialize, Serialize};

/// One RGBW pixel as supplied by the pixel engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::rgbw(0, 0, 0, 0);

    pub const fn rgbw(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, w: 0 }
    }

    /// Unpack a `0xWWRRGGBB` color word.
    pub fn from_packed(color: u32) -> Self {
        Self {
            w: (color >> 24) as u8,
            r: (color >> 16) as u8,
            g: (color >> 8) as u8,
            b: color as u8,
        }
    }

    /// Pack into a `0xWWRRGGBB` color word.
    pub fn to_packed(&self) -> u32 {
        ((self.w as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// A complete LED frame together with the global brightness it is shown at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelFrame {
    pub pixels: Vec<Pixel>,
    pub brightness: u8,
}

impl PixelFrame {
    pub fn new(pixels: Vec<Pixel>, brightness: u8) -> Self {
        Self { pixels, brightness }
    }

    /// All pixels black at the given brightness.
    pub fn blank(len: usize, brightness: u8) -> Self {
        Self {
            pixels: vec![Pixel::BLACK; len],
            brightness,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
