pub mod artnet;
pub mod memory;

pub use artnet::{ArtNetInput, ArtNetMode, ArtNetOutput};
pub use memory::{MemoryInput, MemoryOutput, MemoryTransport};

use crate::dmx::driver_config::DriverConfig;
use crate::error::DmxError;

/// Header of a received DMX packet. The payload is fetched with `read_into`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPacket {
    /// Number of payload bytes available.
    pub size: usize,
    /// Set when the transport saw a framing or parse error.
    pub error: bool,
}

/// Sending side of a DMX bus.
///
/// All calls must return promptly; `update` hands the buffered universe to the
/// line and does not wait for the frame to finish.
pub trait DmxOutput: Send {
    /// One-time setup for the legacy output driver.
    fn init(&mut self, universe_len: usize) -> Result<(), DmxError>;

    /// One-time setup for write-only UART drivers.
    fn init_write(&mut self, universe_len: usize) -> Result<(), DmxError> {
        self.init(universe_len)
    }

    /// Buffer `value` for the 1-based `address`.
    fn write(&mut self, address: usize, value: u8);

    /// Transmit the buffered universe.
    fn update(&mut self) -> Result<(), DmxError>;
}

/// Receiving side of a DMX bus.
pub trait DmxInput: Send {
    /// Install the receive driver with the RDM device descriptor.
    fn install(&mut self, config: &DriverConfig) -> Result<(), DmxError>;

    /// Bind the driver to its transmit, receive and enable pins.
    fn set_pins(&mut self, tx: u8, rx: u8, enable: u8);

    /// Non-blocking poll. `None` when nothing arrived since the last call.
    fn receive(&mut self) -> Option<InputPacket>;

    /// Copy up to `size` bytes of the last received packet into `buf`,
    /// returning the number of bytes copied.
    fn read_into(&mut self, buf: &mut [u8], size: usize) -> usize;
}
