pub use config::{ConfigError, ConfigManager, ConfigOption, ConfigSchema};
pub use dmx::{
    render_frame, Clock, ConnectionEvent, ConnectionState, DmxOverride, DmxUniverse,
    DriverConfig, InputConfig, InputDecoder, ManualClock, OutputDriverKind, OutputMapper,
    RealtimeDecodeMode, RealtimeFrame, RealtimeMode, SystemClock, UNIVERSE_SIZE,
};
pub use error::DmxError;
// Async module system exports
pub use modules::{
    AsyncModule, DmxInputModule, DmxOutputModule, ModuleEvent, ModuleId, ModuleManager,
    ModuleMessage, ModuleResult,
};
pub use pins::{ManagedPin, PinAllocator, PinManager, PinOwner};
pub use pixel::{Pixel, PixelFrame};
pub use settings::Settings;
pub use transport::{
    ArtNetInput, ArtNetMode, ArtNetOutput, DmxInput, DmxOutput, InputPacket, MemoryInput,
    MemoryOutput, MemoryTransport,
};

pub use pixeldmx_fixtures as fixtures;

mod config;
pub mod dmx;
mod error;
mod modules;
mod pins;
pub mod pixel;
mod settings;
pub mod transport;
