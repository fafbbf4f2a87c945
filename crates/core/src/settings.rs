use std::net::{IpAddr, SocketAddr};

use pixeldmx_fixtures::{fixture_layout, ChannelRole, FixtureAddressing, FixtureLayout};
use serde::{Deserialize, Serialize};

use crate::dmx::connection::DEFAULT_INPUT_TIMEOUT_MS;
use crate::dmx::{InputConfig, OutputDriverKind, RealtimeDecodeMode};
use crate::transport::artnet::{ArtNetMode, ARTNET_PORT};

/// Persisted settings for both DMX directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Output settings
    pub output_enabled: bool,
    pub output_fps: f64,
    pub output_driver: OutputDriverKind,
    /// Non-zero while another component proxies this universe; output stays idle.
    pub proxy_universe: u16,
    pub start_address: u16,
    pub channels_per_fixture: u8,
    pub fixture_gap: u16,
    pub first_pixel: usize,
    pub fixture_map: FixtureLayout,

    // Input settings
    pub input_enabled: bool,
    pub input_rx_pin: Option<u8>,
    pub input_tx_pin: Option<u8>,
    pub input_enable_pin: Option<u8>,
    pub input_timeout_ms: u64,
    pub input_poll_hz: f64,
    pub realtime_decode_mode: RealtimeDecodeMode,
    pub realtime_start_address: u16,

    // Art-Net transport
    pub artnet_broadcast: bool,
    pub artnet_source_ip: String,
    pub artnet_dest_ip: String,
    pub artnet_listen_ip: String,
    pub artnet_port: u16,
    pub artnet_universe: u16,
    /// Universe accepted by the Art-Net input. Kept apart from the output
    /// universe so broadcast output is not read back as input.
    pub artnet_input_universe: u16,

    // Pixel source
    pub led_count: usize,
    pub brightness: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Output defaults
            output_enabled: true,
            output_fps: 44.0, // DMX standard 44Hz
            output_driver: OutputDriverKind::Uart,
            proxy_universe: 0,
            start_address: 1,
            channels_per_fixture: 4,
            fixture_gap: 4,
            first_pixel: 0,
            fixture_map: fixture_layout![
                ChannelRole::Red,
                ChannelRole::Green,
                ChannelRole::Blue,
                ChannelRole::White,
            ],

            // Input defaults
            input_enabled: false,
            input_rx_pin: None,
            input_tx_pin: None,
            input_enable_pin: None,
            input_timeout_ms: DEFAULT_INPUT_TIMEOUT_MS,
            input_poll_hz: 100.0,
            realtime_decode_mode: RealtimeDecodeMode::MultipleRgb,
            realtime_start_address: 1,

            // Art-Net defaults
            artnet_broadcast: true,
            artnet_source_ip: "0.0.0.0".to_string(),
            artnet_dest_ip: "192.168.1.200".to_string(),
            artnet_listen_ip: "0.0.0.0".to_string(),
            artnet_port: ARTNET_PORT,
            artnet_universe: 0,
            artnet_input_universe: 1,

            // Pixel defaults
            led_count: 30,
            brightness: 128,
        }
    }
}

impl Settings {
    pub fn addressing(&self) -> FixtureAddressing {
        FixtureAddressing {
            start_address: self.start_address,
            channels_per_fixture: self.channels_per_fixture,
            gap: self.fixture_gap,
            first_pixel: self.first_pixel,
        }
    }

    pub fn input_config(&self) -> InputConfig {
        InputConfig {
            rx_pin: self.input_rx_pin,
            tx_pin: self.input_tx_pin,
            enable_pin: self.input_enable_pin,
            timeout_ms: self.input_timeout_ms,
        }
    }

    /// Art-Net output mode. Falls back to broadcast when the addresses do not parse.
    pub fn artnet_mode(&self) -> ArtNetMode {
        if self.artnet_broadcast {
            return ArtNetMode::Broadcast;
        }
        match (
            self.artnet_source_ip.parse::<IpAddr>(),
            self.artnet_dest_ip.parse::<IpAddr>(),
        ) {
            (Ok(src), Ok(dest)) => ArtNetMode::Unicast(
                SocketAddr::new(src, 0),
                SocketAddr::new(dest, self.artnet_port),
            ),
            _ => {
                log::warn!(
                    "Invalid Art-Net addresses '{}' -> '{}', using broadcast",
                    self.artnet_source_ip,
                    self.artnet_dest_ip
                );
                ArtNetMode::Broadcast
            }
        }
    }

    pub fn artnet_listen_addr(&self) -> Option<SocketAddr> {
        self.artnet_listen_ip
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.artnet_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressing_from_settings() {
        let mut settings = Settings::default();
        settings.start_address = 10;
        settings.fixture_gap = 7;
        settings.first_pixel = 2;

        let addressing = settings.addressing();
        assert_eq!(addressing.start_address, 10);
        assert_eq!(addressing.gap, 7);
        assert_eq!(addressing.first_pixel, 2);
        assert_eq!(addressing.channels_per_fixture, 4);
    }

    #[test]
    fn test_artnet_mode() {
        let mut settings = Settings::default();
        assert_eq!(settings.artnet_mode(), ArtNetMode::Broadcast);

        settings.artnet_broadcast = false;
        settings.artnet_source_ip = "127.0.0.1".to_string();
        settings.artnet_dest_ip = "127.0.0.2".to_string();
        assert_eq!(
            settings.artnet_mode(),
            ArtNetMode::Unicast(
                "127.0.0.1:0".parse().unwrap(),
                "127.0.0.2:6454".parse().unwrap()
            )
        );

        settings.artnet_dest_ip = "not an ip".to_string();
        assert_eq!(settings.artnet_mode(), ArtNetMode::Broadcast);
    }

    #[test]
    fn test_default_input_universe_differs_from_output() {
        let settings = Settings::default();
        assert_ne!(settings.artnet_input_universe, settings.artnet_universe);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"start_address": 33}"#).unwrap();
        assert_eq!(settings.start_address, 33);
        assert_eq!(settings.output_fps, 44.0);
        assert_eq!(settings.fixture_map.len(), 4);
    }
}
