use serde::{Deserialize, Serialize};

use super::universe::{DmxUniverse, UNIVERSE_SIZE};
use crate::pixel::Pixel;

/// Source tag for a realtime override. While an override is active the
/// rendering pipeline shows the external data instead of its own effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RealtimeMode {
    Generic,
    E131,
    ArtNet,
    Dmx,
}

impl RealtimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeMode::Generic => "Generic",
            RealtimeMode::E131 => "E1.31",
            RealtimeMode::ArtNet => "Art-Net",
            RealtimeMode::Dmx => "DMX",
        }
    }
}

/// How an inbound universe is turned into pixel colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeDecodeMode {
    /// Three channels: one RGB color for the whole strip.
    SingleRgb,
    /// Brightness channel followed by one RGB color for the whole strip.
    SingleDrgb,
    /// Three channels per LED.
    #[default]
    MultipleRgb,
    /// Brightness channel followed by three channels per LED.
    MultipleDrgb,
    /// Four channels per LED.
    MultipleRgbw,
}

impl RealtimeDecodeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeDecodeMode::SingleRgb => "Single RGB",
            RealtimeDecodeMode::SingleDrgb => "Single DRGB",
            RealtimeDecodeMode::MultipleRgb => "Multiple RGB",
            RealtimeDecodeMode::MultipleDrgb => "Multiple DRGB",
            RealtimeDecodeMode::MultipleRgbw => "Multiple RGBW",
        }
    }

    pub fn all() -> Vec<RealtimeDecodeMode> {
        vec![
            RealtimeDecodeMode::SingleRgb,
            RealtimeDecodeMode::SingleDrgb,
            RealtimeDecodeMode::MultipleRgb,
            RealtimeDecodeMode::MultipleDrgb,
            RealtimeDecodeMode::MultipleRgbw,
        ]
    }
}

/// Decoded override, ready to replace the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeFrame {
    /// Brightness carried by the data, if the mode has a dimmer channel.
    pub brightness: Option<u8>,
    pub pixels: Vec<Pixel>,
}

/// A received universe addressed to the rendering pipeline's realtime entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxOverride {
    pub start_channel: u16,
    pub end_channel: u16,
    pub data: DmxUniverse,
    pub mode: RealtimeMode,
    pub priority: u8,
}

impl DmxOverride {
    /// Override covering the full universe from the DMX input.
    pub fn full_universe(data: DmxUniverse) -> Self {
        Self {
            start_channel: 1,
            end_channel: UNIVERSE_SIZE as u16,
            data,
            mode: RealtimeMode::Dmx,
            priority: 0,
        }
    }

    /// Channel value at a 1-based address, 0 outside the override range.
    fn channel(&self, address: usize) -> u8 {
        if address < self.start_channel as usize || address > self.end_channel as usize {
            return 0;
        }
        self.data.get(address).unwrap_or(0)
    }

    fn color_at(&self, address: usize) -> Pixel {
        Pixel::rgb(
            self.channel(address),
            self.channel(address + 1),
            self.channel(address + 2),
        )
    }

    /// Decode `pixel_count` pixels starting at DMX address `start_address`.
    pub fn decode(
        &self,
        mode: RealtimeDecodeMode,
        pixel_count: usize,
        start_address: usize,
    ) -> RealtimeFrame {
        match mode {
            RealtimeDecodeMode::SingleRgb => RealtimeFrame {
                brightness: None,
                pixels: vec![self.color_at(start_address); pixel_count],
            },
            RealtimeDecodeMode::SingleDrgb => RealtimeFrame {
                brightness: Some(self.channel(start_address)),
                pixels: vec![self.color_at(start_address + 1); pixel_count],
            },
            RealtimeDecodeMode::MultipleRgb => RealtimeFrame {
                brightness: None,
                pixels: (0..pixel_count)
                    .map(|i| self.color_at(start_address + i * 3))
                    .collect(),
            },
            RealtimeDecodeMode::MultipleDrgb => RealtimeFrame {
                brightness: Some(self.channel(start_address)),
                pixels: (0..pixel_count)
                    .map(|i| self.color_at(start_address + 1 + i * 3))
                    .collect(),
            },
            RealtimeDecodeMode::MultipleRgbw => RealtimeFrame {
                brightness: None,
                pixels: (0..pixel_count)
                    .map(|i| {
                        let base = start_address + i * 4;
                        Pixel::rgbw(
                            self.channel(base),
                            self.channel(base + 1),
                            self.channel(base + 2),
                            self.channel(base + 3),
                        )
                    })
                    .collect(),
            },
        }
    }
}
