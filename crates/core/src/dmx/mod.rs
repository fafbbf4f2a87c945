pub mod connection;
pub mod driver_config;
pub mod input_decoder;
pub mod output_mapper;
pub mod realtime;
pub mod universe;

pub use connection::{Clock, ConnectionEvent, ConnectionState, ManualClock, SystemClock};
pub use driver_config::DriverConfig;
pub use input_decoder::{InputConfig, InputDecoder};
pub use output_mapper::{render_frame, OutputDriverKind, OutputMapper};
pub use realtime::{DmxOverride, RealtimeDecodeMode, RealtimeFrame, RealtimeMode};
pub use universe::{DmxUniverse, UNIVERSE_SIZE};
