use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pixeldmx_fixtures::MAX_FIXTURE_CHANNELS;
use serde::{Deserialize, Serialize};

use crate::dmx::{OutputDriverKind, RealtimeDecodeMode};
use crate::Settings;

/// Configuration manager for pixeldmx settings
/// Keeps the schema of available options apart from the persisted values.
/// Configuration is stored in config.json in the working directory by default
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub output: OutputConfigSchema,
    pub input: InputConfigSchema,
    pub artnet: ArtNetConfigSchema,
    pub pixels: PixelConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfigSchema {
    pub output_enabled: ConfigOption<bool>,
    pub output_fps: ConfigOption<f64>,
    pub output_driver: ConfigOption<OutputDriverKind>,
    pub start_address: ConfigOption<u16>,
    pub channels_per_fixture: ConfigOption<u8>,
    pub fixture_gap: ConfigOption<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfigSchema {
    pub input_enabled: ConfigOption<bool>,
    pub input_timeout_ms: ConfigOption<u64>,
    pub input_poll_hz: ConfigOption<f64>,
    pub realtime_decode_mode: ConfigOption<RealtimeDecodeMode>,
    pub realtime_start_address: ConfigOption<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtNetConfigSchema {
    pub artnet_broadcast: ConfigOption<bool>,
    pub artnet_port: ConfigOption<u16>,
    pub artnet_universe: ConfigOption<u16>,
    pub artnet_input_universe: ConfigOption<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelConfigSchema {
    pub led_count: ConfigOption<usize>,
    pub brightness: ConfigOption<u8>,
}

/// Configuration option with validation and available choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub valid_choices: Option<Vec<T>>,
    pub description: String,
    pub requires_restart: bool,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from configuration file
    /// Writes and returns the defaults if the file doesn't exist yet
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            modified_at: chrono::Utc::now().to_rfc3339(),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Validate, update settings and save to file
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        ConfigSchema {
            output: OutputConfigSchema {
                output_enabled: ConfigOption {
                    default: true,
                    valid_range: None,
                    valid_choices: None,
                    description: "Render the LED frame to the DMX output".to_string(),
                    requires_restart: true,
                },
                output_fps: ConfigOption {
                    default: 44.0,
                    valid_range: Some((1.0, 44.0)),
                    valid_choices: None,
                    description: "DMX output refresh rate in frames per second".to_string(),
                    requires_restart: true,
                },
                output_driver: ConfigOption {
                    default: OutputDriverKind::Uart,
                    valid_range: None,
                    valid_choices: Some(vec![OutputDriverKind::Legacy, OutputDriverKind::Uart]),
                    description: "Output driver family of the DMX transceiver".to_string(),
                    requires_restart: true,
                },
                start_address: ConfigOption {
                    default: 1,
                    valid_range: Some((1, 512)),
                    valid_choices: None,
                    description: "DMX address of the first fixture".to_string(),
                    requires_restart: false,
                },
                channels_per_fixture: ConfigOption {
                    default: 4,
                    valid_range: Some((1, MAX_FIXTURE_CHANNELS as u8)),
                    valid_choices: None,
                    description: "Number of DMX channels rendered per fixture".to_string(),
                    requires_restart: false,
                },
                fixture_gap: ConfigOption {
                    default: 4,
                    valid_range: Some((0, 512)),
                    valid_choices: None,
                    description: "Address distance between consecutive fixtures".to_string(),
                    requires_restart: false,
                },
            },
            input: InputConfigSchema {
                input_enabled: ConfigOption {
                    default: false,
                    valid_range: None,
                    valid_choices: None,
                    description: "Accept DMX input as a realtime override".to_string(),
                    requires_restart: true,
                },
                input_timeout_ms: ConfigOption {
                    default: 5000,
                    valid_range: Some((100, 60000)),
                    valid_choices: None,
                    description: "Time without frames before the DMX source counts as gone"
                        .to_string(),
                    requires_restart: false,
                },
                input_poll_hz: ConfigOption {
                    default: 100.0,
                    valid_range: Some((1.0, 1000.0)),
                    valid_choices: None,
                    description: "How often the DMX receiver is polled".to_string(),
                    requires_restart: true,
                },
                realtime_decode_mode: ConfigOption {
                    default: RealtimeDecodeMode::MultipleRgb,
                    valid_range: None,
                    valid_choices: Some(RealtimeDecodeMode::all()),
                    description: "How received channels map onto LEDs".to_string(),
                    requires_restart: false,
                },
                realtime_start_address: ConfigOption {
                    default: 1,
                    valid_range: Some((1, 512)),
                    valid_choices: None,
                    description: "First DMX address read for the realtime override".to_string(),
                    requires_restart: false,
                },
            },
            artnet: ArtNetConfigSchema {
                artnet_broadcast: ConfigOption {
                    default: true,
                    valid_range: None,
                    valid_choices: None,
                    description: "Use broadcast mode for Art-Net (vs unicast)".to_string(),
                    requires_restart: true,
                },
                artnet_port: ConfigOption {
                    default: 6454,
                    valid_range: Some((1024, 65535)),
                    valid_choices: None,
                    description: "UDP port for Art-Net".to_string(),
                    requires_restart: true,
                },
                artnet_universe: ConfigOption {
                    default: 0,
                    valid_range: Some((0, 32767)),
                    valid_choices: None,
                    description: "Art-Net port address of the universe".to_string(),
                    requires_restart: true,
                },
                artnet_input_universe: ConfigOption {
                    default: 1,
                    valid_range: Some((0, 32767)),
                    valid_choices: None,
                    description: "Art-Net port address accepted as DMX input".to_string(),
                    requires_restart: true,
                },
            },
            pixels: PixelConfigSchema {
                led_count: ConfigOption {
                    default: 30,
                    valid_range: Some((1, 4096)),
                    valid_choices: None,
                    description: "Number of LEDs in the strip".to_string(),
                    requires_restart: true,
                },
                brightness: ConfigOption {
                    default: 128,
                    valid_range: None,
                    valid_choices: None,
                    description: "Global brightness".to_string(),
                    requires_restart: false,
                },
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        fn check_range<T: PartialOrd + std::fmt::Display + Copy>(
            errors: &mut Vec<String>,
            name: &str,
            value: T,
            option: &ConfigOption<T>,
        ) {
            if let Some((min, max)) = option.valid_range {
                if value < min || value > max {
                    errors.push(format!("{} must be between {} and {}", name, min, max));
                }
            }
        }

        // Validate output settings
        let output = &schema.output;
        check_range(&mut errors, "output_fps", settings.output_fps, &output.output_fps);
        check_range(
            &mut errors,
            "start_address",
            settings.start_address,
            &output.start_address,
        );
        check_range(
            &mut errors,
            "channels_per_fixture",
            settings.channels_per_fixture,
            &output.channels_per_fixture,
        );
        check_range(&mut errors, "fixture_gap", settings.fixture_gap, &output.fixture_gap);

        // Validate input settings
        let input = &schema.input;
        check_range(
            &mut errors,
            "input_timeout_ms",
            settings.input_timeout_ms,
            &input.input_timeout_ms,
        );
        check_range(&mut errors, "input_poll_hz", settings.input_poll_hz, &input.input_poll_hz);
        check_range(
            &mut errors,
            "realtime_start_address",
            settings.realtime_start_address,
            &input.realtime_start_address,
        );

        if settings.input_enabled {
            let pins = [
                settings.input_rx_pin,
                settings.input_tx_pin,
                settings.input_enable_pin,
            ];
            if pins.iter().any(|p| p.map_or(true, |pin| pin == 0)) {
                errors.push("input pins rx, tx and enable must all be set".to_string());
            } else {
                let unique: HashSet<u8> = pins.iter().flatten().copied().collect();
                if unique.len() != pins.len() {
                    errors.push("input pins rx, tx and enable must be distinct".to_string());
                }
            }
        }

        // Validate Art-Net settings
        let artnet = &schema.artnet;
        check_range(&mut errors, "artnet_port", settings.artnet_port, &artnet.artnet_port);
        check_range(
            &mut errors,
            "artnet_universe",
            settings.artnet_universe,
            &artnet.artnet_universe,
        );
        check_range(
            &mut errors,
            "artnet_input_universe",
            settings.artnet_input_universe,
            &artnet.artnet_input_universe,
        );
        if settings.input_enabled
            && settings.output_enabled
            && settings.artnet_input_universe == settings.artnet_universe
        {
            errors.push(
                "artnet_input_universe must differ from artnet_universe while output is enabled"
                    .to_string(),
            );
        }

        check_range(&mut errors, "led_count", settings.led_count, &schema.pixels.led_count);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Reset settings to defaults
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.settings = Settings::default();
        self.save()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    ReadError(String),
    WriteError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "Failed to read config file: {}", msg),
            ConfigError::WriteError(msg) => write!(f, "Failed to write config file: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config file: {}", msg),
            ConfigError::SerializeError(msg) => write!(f, "Failed to serialize config: {}", msg),
            ConfigError::ValidationError(errors) => {
                write!(f, "Config validation errors: {}", errors.join(", "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use pixeldmx_fixtures::{fixture_layout, ChannelRole};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_manager_new() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let manager = ConfigManager::new(Some(config_path.clone()));
        assert_eq!(manager.config_path(), config_path);
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        let settings = manager.load().unwrap();

        assert!(config_path.exists());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));

        let mut settings = Settings::default();
        settings.start_address = 100;
        settings.fixture_map = fixture_layout![ChannelRole::Shutter, ChannelRole::Red];
        settings.channels_per_fixture = 2;
        settings.input_rx_pin = Some(16);

        manager.update_settings(settings.clone()).unwrap();

        let mut manager2 = ConfigManager::new(Some(config_path));
        let loaded_settings = manager2.load().unwrap();

        assert_eq!(loaded_settings.start_address, 100);
        assert_eq!(loaded_settings.fixture_map, settings.fixture_map);
        assert_eq!(loaded_settings.input_rx_pin, Some(16));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.json");
        fs::write(&config_path, "{ not json").unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        assert!(matches!(manager.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(ConfigManager::validate_settings(&settings).is_ok());

        settings.start_address = 0;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.start_address = 1;
        settings.channels_per_fixture = 16;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.channels_per_fixture = 4;
        settings.output_fps = 100.0;
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("output_fps"));
    }

    #[test]
    fn test_input_pin_validation() {
        let mut settings = Settings::default();
        settings.input_enabled = true;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.input_rx_pin = Some(16);
        settings.input_tx_pin = Some(17);
        settings.input_enable_pin = Some(16);
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("distinct"));

        settings.input_enable_pin = Some(0);
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("must all be set"));

        settings.input_enable_pin = Some(4);
        assert!(ConfigManager::validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_input_and_output_universes_must_differ() {
        let mut settings = Settings::default();
        settings.input_enabled = true;
        settings.input_rx_pin = Some(16);
        settings.input_tx_pin = Some(17);
        settings.input_enable_pin = Some(4);
        assert!(ConfigManager::validate_settings(&settings).is_ok());

        settings.artnet_input_universe = settings.artnet_universe;
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert!(errors[0].starts_with("artnet_input_universe"));

        settings.output_enabled = false;
        assert!(ConfigManager::validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_update_rejects_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(Some(temp_dir.path().join("config.json")));

        let mut settings = Settings::default();
        settings.artnet_port = 80;
        assert!(matches!(
            manager.update_settings(settings),
            Err(ConfigError::ValidationError(_))
        ));
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_schema_matches_defaults() {
        let schema = ConfigManager::schema();
        let defaults = Settings::default();

        assert_eq!(schema.output.start_address.default, defaults.start_address);
        assert_eq!(schema.output.output_fps.default, defaults.output_fps);
        assert_eq!(schema.input.input_timeout_ms.default, defaults.input_timeout_ms);
        assert_eq!(schema.artnet.artnet_port.default, defaults.artnet_port);
        assert!(!schema.pixels.led_count.description.is_empty());
    }
}
