pub mod frame;

pub use frame::{Pixel, PixelFrame};
