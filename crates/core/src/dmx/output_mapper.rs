use pixeldmx_fixtures::{ChannelRole, FixtureAddressing, FixtureLayout};
use serde::{Deserialize, Serialize};

use super::universe::{DmxUniverse, UNIVERSE_SIZE};
use crate::error::DmxError;
use crate::pixel::{Pixel, PixelFrame};
use crate::transport::DmxOutput;

/// Which output driver family the transport belongs to. Chosen once at
/// startup; the two families differ only in how the bus is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputDriverKind {
    /// Bit-banged driver, initialised with `init`.
    Legacy,
    /// UART driver, initialised with `init_write`.
    #[default]
    Uart,
}

impl OutputDriverKind {
    pub fn initialize(&self, transport: &mut dyn DmxOutput) -> Result<(), DmxError> {
        match self {
            OutputDriverKind::Legacy => transport.init(UNIVERSE_SIZE),
            OutputDriverKind::Uart => transport.init_write(UNIVERSE_SIZE),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputDriverKind::Legacy => "legacy",
            OutputDriverKind::Uart => "uart",
        }
    }
}

/// Scale a color component by brightness: `value * brightness / 255`, floored.
pub fn scale(value: u8, brightness: u8) -> u8 {
    (value as u16 * brightness as u16 / 255) as u8
}

fn channel_value(role: ChannelRole, pixel: &Pixel, brightness: u8, calc_brightness: bool) -> u8 {
    let color = |raw: u8| {
        if calc_brightness {
            scale(raw, brightness)
        } else {
            raw
        }
    };

    match role {
        ChannelRole::Zero => 0,
        ChannelRole::Red => color(pixel.r),
        ChannelRole::Green => color(pixel.g),
        ChannelRole::Blue => color(pixel.b),
        ChannelRole::White => color(pixel.w),
        ChannelRole::Shutter => brightness,
        ChannelRole::Full => 255,
    }
}

/// Render one DMX universe from a pixel strip.
///
/// Pixel `first_pixel + k` drives fixture `k`, whose channels start at
/// `start_address + gap * k`. Channels that land outside 1..=512 are dropped.
pub fn render_frame(
    pixels: &[Pixel],
    layout: &FixtureLayout,
    addressing: &FixtureAddressing,
    brightness: u8,
) -> DmxUniverse {
    let mut universe = DmxUniverse::new();
    let channels = addressing.channels_per_fixture as usize;
    let calc_brightness = layout.computes_brightness(channels);

    for (fixture, pixel) in pixels.iter().skip(addressing.first_pixel).enumerate() {
        let Some(base) = addressing.fixture_base(fixture) else {
            break;
        };
        if base > UNIVERSE_SIZE {
            // Every following fixture starts even further out
            break;
        }

        for j in 0..channels {
            let value = channel_value(layout.role(j), pixel, brightness, calc_brightness);
            universe.set(base + j, value);
        }
    }

    universe
}

/// Maps LED frames onto a fixed fixture layout and pushes them to the bus.
#[derive(Debug, Clone)]
pub struct OutputMapper {
    layout: FixtureLayout,
    addressing: FixtureAddressing,
}

impl OutputMapper {
    pub fn new(layout: FixtureLayout, addressing: FixtureAddressing) -> Self {
        Self { layout, addressing }
    }

    pub fn layout(&self) -> &FixtureLayout {
        &self.layout
    }

    pub fn addressing(&self) -> &FixtureAddressing {
        &self.addressing
    }

    /// Render a frame without touching any transport.
    pub fn render(&self, frame: &PixelFrame) -> DmxUniverse {
        render_frame(&frame.pixels, &self.layout, &self.addressing, frame.brightness)
    }

    /// One output tick: render, hand every channel to the transport, transmit.
    pub fn tick(
        &self,
        frame: &PixelFrame,
        transport: &mut dyn DmxOutput,
    ) -> Result<DmxUniverse, DmxError> {
        let universe = self.render(frame);
        for (address, value) in universe.iter() {
            transport.write(address, value);
        }
        transport.update()?;
        Ok(universe)
    }
}

#[cfg(test)]
mod tests {
    use pixeldmx_fixtures::fixture_layout;

    use super::*;
    use crate::transport::MemoryTransport;

    fn addressing(start_address: u16, channels: u8, gap: u16, first_pixel: usize) -> FixtureAddressing {
        FixtureAddressing {
            start_address,
            channels_per_fixture: channels,
            gap,
            first_pixel,
        }
    }

    fn rgbw() -> FixtureLayout {
        fixture_layout![
            ChannelRole::Red,
            ChannelRole::Green,
            ChannelRole::Blue,
            ChannelRole::White,
        ]
    }

    fn rgb_shutter() -> FixtureLayout {
        fixture_layout![
            ChannelRole::Red,
            ChannelRole::Green,
            ChannelRole::Blue,
            ChannelRole::Shutter,
        ]
    }

    fn head(universe: &DmxUniverse, len: usize) -> Vec<u8> {
        universe.as_slice()[..len].to_vec()
    }

    #[test]
    fn test_shutter_layout_emits_raw_colors() {
        let pixels = [Pixel::rgbw(200, 100, 50, 0)];
        let universe = render_frame(&pixels, &rgb_shutter(), &addressing(1, 4, 4, 0), 128);
        assert_eq!(head(&universe, 4), vec![200, 100, 50, 128]);
    }

    #[test]
    fn test_colors_are_premultiplied_without_shutter() {
        let pixels = [Pixel::rgbw(200, 100, 50, 0)];
        let universe = render_frame(&pixels, &rgbw(), &addressing(1, 4, 4, 0), 128);
        assert_eq!(head(&universe, 4), vec![100, 50, 25, 0]);
    }

    #[test]
    fn test_scaling_matches_floor_formula() {
        let layout = rgbw();
        for brightness in [0u8, 1, 64, 127, 128, 200, 254, 255] {
            for raw in [0u8, 1, 2, 99, 128, 200, 255] {
                let pixels = [Pixel::rgbw(raw, raw, raw, raw)];
                let universe = render_frame(&pixels, &layout, &addressing(1, 4, 4, 0), brightness);
                let expected = (raw as u32 * brightness as u32 / 255) as u8;
                assert_eq!(head(&universe, 4), vec![expected; 4]);
            }
        }
    }

    #[test]
    fn test_zero_and_full_ignore_pixel_and_brightness() {
        let layout = fixture_layout![ChannelRole::Zero, ChannelRole::Full];
        for brightness in [0u8, 77, 255] {
            let pixels = [Pixel::rgbw(255, 255, 255, 255), Pixel::BLACK];
            let universe = render_frame(&pixels, &layout, &addressing(1, 2, 2, 0), brightness);
            assert_eq!(head(&universe, 4), vec![0, 255, 0, 255]);
        }
    }

    #[test]
    fn test_shutter_anywhere_disables_scaling_for_all_fixtures() {
        let layout = fixture_layout![
            ChannelRole::Shutter,
            ChannelRole::Red,
            ChannelRole::Green,
            ChannelRole::Blue,
        ];
        let pixels = [Pixel::rgb(10, 20, 30), Pixel::rgb(40, 50, 60)];
        let universe = render_frame(&pixels, &layout, &addressing(1, 4, 4, 0), 50);
        assert_eq!(head(&universe, 8), vec![50, 10, 20, 30, 50, 40, 50, 60]);
    }

    #[test]
    fn test_fixture_spacing_and_start_address() {
        let layout = fixture_layout![ChannelRole::Red, ChannelRole::Green, ChannelRole::Blue];
        let pixels = [Pixel::rgb(1, 2, 3), Pixel::rgb(4, 5, 6)];
        let universe = render_frame(&pixels, &layout, &addressing(10, 3, 5, 0), 255);

        assert_eq!(universe.get(9), Some(0));
        assert_eq!(universe.get(10), Some(1));
        assert_eq!(universe.get(12), Some(3));
        // gap channels stay untouched
        assert_eq!(universe.get(13), Some(0));
        assert_eq!(universe.get(14), Some(0));
        assert_eq!(universe.get(15), Some(4));
        assert_eq!(universe.get(17), Some(6));
    }

    #[test]
    fn test_first_pixel_offset() {
        let layout = fixture_layout![ChannelRole::Red];
        let pixels = [Pixel::rgb(1, 0, 0), Pixel::rgb(2, 0, 0), Pixel::rgb(3, 0, 0)];
        let universe = render_frame(&pixels, &layout, &addressing(1, 1, 1, 1), 255);
        assert_eq!(head(&universe, 3), vec![2, 3, 0]);
    }

    #[test]
    fn test_first_pixel_beyond_strip_renders_nothing() {
        let pixels = [Pixel::rgb(255, 255, 255); 4];
        let universe = render_frame(&pixels, &rgbw(), &addressing(1, 4, 4, 4), 255);
        assert_eq!(universe, DmxUniverse::new());
    }

    #[test]
    fn test_zero_channel_count_renders_nothing() {
        let pixels = [Pixel::rgb(255, 255, 255); 4];
        let universe = render_frame(&pixels, &rgbw(), &addressing(1, 0, 4, 0), 255);
        assert_eq!(universe, DmxUniverse::new());
    }

    #[test]
    fn test_fixtures_past_universe_are_truncated() {
        // 130 fixtures of 4 channels need 520 addresses; the last two fall off
        let pixels = vec![Pixel::rgbw(255, 255, 255, 255); 130];
        let universe = render_frame(&pixels, &rgbw(), &addressing(1, 4, 4, 0), 255);
        assert!(universe.as_slice().iter().all(|v| *v == 255));
    }

    #[test]
    fn test_fixture_straddling_the_end_keeps_in_range_channels() {
        let layout = rgbw();
        let pixels = [Pixel::rgbw(9, 8, 7, 6)];
        let universe = render_frame(&pixels, &layout, &addressing(510, 4, 4, 0), 255);
        assert_eq!(universe.get(510), Some(9));
        assert_eq!(universe.get(511), Some(8));
        assert_eq!(universe.get(512), Some(7));
        assert_eq!(universe.as_slice()[..509].iter().filter(|v| **v != 0).count(), 0);
    }

    #[test]
    fn test_start_address_zero_drops_first_channel() {
        let layout = rgbw();
        let pixels = [Pixel::rgbw(9, 8, 7, 6)];
        let universe = render_frame(&pixels, &layout, &addressing(0, 4, 4, 0), 255);
        assert_eq!(head(&universe, 4), vec![8, 7, 6, 0]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let pixels: Vec<Pixel> = (0..50u8)
            .map(|i| Pixel::rgbw(i, i.wrapping_mul(3), i.wrapping_mul(7), 255 - i))
            .collect();
        let layout = rgb_shutter();
        let first = render_frame(&pixels, &layout, &addressing(3, 4, 6, 2), 99);
        let second = render_frame(&pixels, &layout, &addressing(3, 4, 6, 2), 99);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tick_writes_universe_and_updates_once() {
        let transport = MemoryTransport::new();
        let mut output = transport.output();
        let mapper = OutputMapper::new(rgb_shutter(), addressing(1, 4, 4, 0));
        let frame = PixelFrame::new(vec![Pixel::rgb(200, 100, 50)], 128);

        let universe = mapper.tick(&frame, &mut output).unwrap();

        assert_eq!(transport.update_count(), 1);
        assert_eq!(transport.last_sent(), Some(universe));
        assert_eq!(head(&transport.last_sent().unwrap(), 4), vec![200, 100, 50, 128]);
    }

    #[test]
    fn test_driver_kind_selects_init_call() {
        let transport = MemoryTransport::new();
        let mut output = transport.output();

        OutputDriverKind::Legacy.initialize(&mut output).unwrap();
        assert_eq!(transport.init_calls(), vec![("init", UNIVERSE_SIZE)]);

        OutputDriverKind::Uart.initialize(&mut output).unwrap();
        assert_eq!(
            transport.init_calls(),
            vec![("init", UNIVERSE_SIZE), ("init_write", UNIVERSE_SIZE)]
        );
    }
}
