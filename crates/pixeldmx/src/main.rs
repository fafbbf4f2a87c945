use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use pixeldmx_core::{
    ArtNetInput, ArtNetOutput, ConfigManager, DmxInputModule, DmxOutputModule, DriverConfig,
    InputDecoder, ModuleEvent, ModuleId, ModuleManager, ModuleMessage, OutputMapper, PinManager,
    PixelFrame, Settings, SystemClock,
};
use pixeldmx_fixtures::LayoutLibrary;
use tokio::time::{interval, Duration};

mod pattern;

use pattern::Pattern;

/// Pins assumed for the network receiver when the config leaves them unset
const DEFAULT_INPUT_PINS: (u8, u8, u8) = (16, 17, 4);

/// Pixel strip to DMX512 bridge with DMX input as a realtime override.
#[derive(Parser, Debug)]
#[command(name = "pixeldmx")]
#[command(about = "Render an RGBW pixel strip to DMX fixtures over Art-Net")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Number of LEDs in the strip (overrides the config file)
    #[arg(long)]
    led_count: Option<usize>,

    /// Art-Net destination IP address (if not provided, broadcast mode will be used)
    #[arg(long, value_parser = parse_ip)]
    dest_ip: Option<IpAddr>,

    /// Listen for Art-Net DMX and show it instead of the pattern
    #[arg(short, long)]
    listen: bool,

    /// Pattern shown while no DMX input is connected
    #[arg(long, value_enum, default_value = "wave")]
    pattern: Pattern,

    /// Pattern cycles per second
    #[arg(long, default_value = "0.5")]
    speed: f64,

    /// Fixture layout preset to use instead of the configured fixture map
    #[arg(long)]
    layout: Option<String>,
}

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    s.parse().map_err(|e| format!("Invalid IP address: {}", e))
}

fn apply_args(settings: &mut Settings, args: &Args) -> anyhow::Result<()> {
    if let Some(led_count) = args.led_count {
        settings.led_count = led_count;
    }
    if let Some(dest_ip) = args.dest_ip {
        settings.artnet_broadcast = false;
        settings.artnet_dest_ip = dest_ip.to_string();
    }
    if let Some(name) = &args.layout {
        let library = LayoutLibrary::new();
        let layout = library.get(name).with_context(|| {
            format!(
                "unknown layout '{}', expected one of: {}",
                name,
                library.names().join(", ")
            )
        })?;
        settings.channels_per_fixture = layout.len() as u8;
        settings.fixture_map = layout.clone();
    }
    if args.listen {
        settings.input_enabled = true;
        let (rx, tx, enable) = DEFAULT_INPUT_PINS;
        settings.input_rx_pin.get_or_insert(rx);
        settings.input_tx_pin.get_or_insert(tx);
        settings.input_enable_pin.get_or_insert(enable);
    }
    Ok(())
}

fn build_modules(settings: &Settings, manager: &mut ModuleManager) -> anyhow::Result<()> {
    if settings.output_enabled {
        let transport = ArtNetOutput::new(settings.artnet_mode(), settings.artnet_universe)?;
        log::info!(
            "Art-Net output to {} on universe {}",
            transport.destination(),
            settings.artnet_universe
        );

        let mapper = OutputMapper::new(settings.fixture_map.clone(), settings.addressing());
        let mut module = DmxOutputModule::new(mapper, Box::new(transport), settings.output_driver);
        module.set_target_fps(settings.output_fps);
        module.set_proxy_universe(settings.proxy_universe);
        manager.register_module(Box::new(module));
    }

    if settings.input_enabled {
        let listen: SocketAddr = settings
            .artnet_listen_addr()
            .ok_or_else(|| anyhow!("invalid listen address '{}'", settings.artnet_listen_ip))?;
        let transport = ArtNetInput::bind(listen, settings.artnet_input_universe)?;
        log::info!(
            "Art-Net input on {} for universe {}",
            listen,
            settings.artnet_input_universe
        );

        let mut pins = PinManager::new();
        let decoder = InputDecoder::new(
            transport,
            &mut pins,
            &settings.input_config(),
            &DriverConfig::from_build(),
            SystemClock::new(),
        );
        let mut module = DmxInputModule::new(decoder);
        module.set_poll_hz(settings.input_poll_hz);
        manager.register_module(Box::new(module));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ConfigManager::new(Some(args.config.clone()));
    let mut settings = config.load()?;
    apply_args(&mut settings, &args)?;
    if let Err(errors) = ConfigManager::validate_settings(&settings) {
        bail!("invalid configuration: {}", errors.join(", "));
    }

    log::info!("Configuration loaded from {}", config.config_path().display());
    log::info!(
        "{} LEDs, fixtures from address {} every {} channels, {} channels each",
        settings.led_count,
        settings.start_address,
        settings.fixture_gap,
        settings.channels_per_fixture
    );

    let mut manager = ModuleManager::new();
    build_modules(&settings, &mut manager)?;
    let mut messages = manager
        .take_message_receiver()
        .context("module message receiver already taken")?;

    manager.initialize().await.map_err(|e| anyhow!(e))?;
    manager.start().await.map_err(|e| anyhow!(e))?;

    let mut frame_interval = interval(Duration::from_secs_f64(1.0 / settings.output_fps));
    let started = Instant::now();
    let mut realtime: Option<PixelFrame> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    log::info!("Showing pattern {}, press Ctrl-C to stop", args.pattern.as_str());

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Received Ctrl-C");
                break;
            }

            Some(message) = messages.recv() => match message {
                ModuleMessage::Event(ModuleEvent::RealtimeOverride(ov)) => {
                    let decoded = ov.decode(
                        settings.realtime_decode_mode,
                        settings.led_count,
                        settings.realtime_start_address as usize,
                    );
                    let brightness = decoded.brightness.unwrap_or(settings.brightness);
                    realtime = Some(PixelFrame::new(decoded.pixels, brightness));
                }
                ModuleMessage::Event(ModuleEvent::ConnectionChanged(connected)) => {
                    if connected {
                        log::info!("DMX input active, pattern paused");
                    } else {
                        log::info!("DMX input lost, resuming pattern");
                        realtime = None;
                    }
                }
                ModuleMessage::Event(_) => {}
                ModuleMessage::Status(status) => log::debug!("{}", status),
                ModuleMessage::Error(e) => log::error!("{}", e),
            },

            _ = frame_interval.tick(), if settings.output_enabled => {
                let frame = realtime.clone().unwrap_or_else(|| {
                    args.pattern.render(
                        settings.led_count,
                        started.elapsed().as_secs_f64(),
                        args.speed,
                        settings.brightness,
                    )
                });
                if let Err(e) = manager
                    .send_to_module(ModuleId::DmxOutput, ModuleEvent::PixelFrame(frame))
                    .await
                {
                    log::warn!("{}", e);
                }
            }
        }
    }

    manager.shutdown().await.map_err(|e| anyhow!(e))?;
    Ok(())
}
