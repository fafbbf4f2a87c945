use std::f64::consts::PI;

use clap::ValueEnum;
use pixeldmx_core::{Pixel, PixelFrame};

/// Demo patterns rendered when no DMX override is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Single lit pixel travelling down the strip
    Chase,
    /// Sine wave travelling down the strip
    Wave,
    /// Whole strip flashing
    Strobe,
    /// Purple to blue color fade shifted along the strip
    ColorCycle,
    /// Constant white
    Solid,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Chase => "Chase",
            Pattern::Wave => "Wave",
            Pattern::Strobe => "Strobe",
            Pattern::ColorCycle => "ColorCycle",
            Pattern::Solid => "Solid",
        }
    }

    /// Render a frame of `led_count` pixels at `elapsed` seconds.
    pub fn render(&self, led_count: usize, elapsed: f64, speed: f64, brightness: u8) -> PixelFrame {
        let phase = (elapsed * speed).fract();
        let pixels = (0..led_count)
            .map(|i| {
                let position = if led_count > 1 {
                    i as f64 / (led_count - 1) as f64
                } else {
                    0.0
                };
                self.render_pixel(position, phase)
            })
            .collect();
        PixelFrame::new(pixels, brightness)
    }

    /// position: 0.0 to 1.0 along the strip, phase: 0.0 to 1.0 through the cycle
    fn render_pixel(&self, position: f64, phase: f64) -> Pixel {
        match self {
            Pattern::ColorCycle => color_cycle(position, phase),
            Pattern::Solid => Pixel::rgbw(0, 0, 0, 255),
            _ => {
                let level = (255.0 * self.intensity(position, phase)) as u8;
                Pixel::rgbw(level, level, level, 0)
            }
        }
    }

    fn intensity(&self, position: f64, phase: f64) -> f64 {
        match self {
            Pattern::Chase => {
                if (position - phase).abs() < 0.1 {
                    1.0
                } else {
                    0.0
                }
            }
            Pattern::Wave => ((phase + position) * 2.0 * PI).sin() * 0.5 + 0.5,
            Pattern::Strobe => {
                if (phase * 10.0) % 1.0 < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Pattern::ColorCycle | Pattern::Solid => 1.0,
        }
    }
}

fn color_cycle(position: f64, phase: f64) -> Pixel {
    // Neon purple and electric blue
    let from = (191.0, 0.0, 255.0);
    let to = (125.0, 249.0, 255.0);

    let t = (((position + phase) % 1.0) * 2.0 * PI).sin() * 0.5 + 0.5;
    Pixel::rgb(
        (from.0 * (1.0 - t) + to.0 * t) as u8,
        (from.1 * (1.0 - t) + to.1 * t) as u8,
        (from.2 * (1.0 - t) + to.2 * t) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_and_brightness() {
        let frame = Pattern::Wave.render(30, 1.25, 1.0, 77);
        assert_eq!(frame.len(), 30);
        assert_eq!(frame.brightness, 77);
    }

    #[test]
    fn test_chase_lights_only_near_phase() {
        let frame = Pattern::Chase.render(11, 0.0, 1.0, 255);
        assert_eq!(frame.pixels[0], Pixel::rgbw(255, 255, 255, 0));
        assert_eq!(frame.pixels[10], Pixel::BLACK);
    }

    #[test]
    fn test_strobe_is_uniform() {
        let frame = Pattern::Strobe.render(8, 0.37, 1.0, 255);
        assert!(frame.pixels.iter().all(|p| *p == frame.pixels[0]));
    }

    #[test]
    fn test_single_led_strip() {
        let frame = Pattern::ColorCycle.render(1, 0.0, 1.0, 255);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.pixels[0].b, 255);
    }
}
