use serde::{Deserialize, Serialize};

use super::connection::{Clock, ConnectionEvent, ConnectionState, DEFAULT_INPUT_TIMEOUT_MS};
use super::driver_config::DriverConfig;
use super::realtime::DmxOverride;
use super::universe::DmxUniverse;
use crate::error::DmxError;
use crate::pins::{ManagedPin, PinAllocator, PinOwner};
use crate::transport::DmxInput;

/// Pins and timing for the DMX receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub rx_pin: Option<u8>,
    pub tx_pin: Option<u8>,
    pub enable_pin: Option<u8>,
    pub timeout_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rx_pin: None,
            tx_pin: None,
            enable_pin: None,
            timeout_ms: DEFAULT_INPUT_TIMEOUT_MS,
        }
    }
}

/// Polls a DMX receiver, forwards good frames as realtime overrides and
/// tracks whether a source is present.
///
/// A decoder whose initialization failed stays disarmed for its whole life and
/// every poll is a no-op.
pub struct InputDecoder<T, C> {
    transport: Option<T>,
    clock: C,
    timeout_ms: u64,
    connection: ConnectionState,
    pending_event: Option<ConnectionEvent>,
    frames_received: u64,
    frames_dropped: u64,
}

impl<T: DmxInput, C: Clock> InputDecoder<T, C> {
    /// Reserve the pins, install the driver and arm the decoder. Failures are
    /// logged once and leave the decoder disarmed.
    pub fn new(
        mut transport: T,
        pins: &mut dyn PinAllocator,
        config: &InputConfig,
        driver: &DriverConfig,
        clock: C,
    ) -> Self {
        let transport = match arm(&mut transport, pins, config, driver) {
            Ok(()) => Some(transport),
            Err(e @ DmxError::PinUnset(_)) => {
                log::warn!("DMX input disabled: {}", e);
                None
            }
            Err(e) => {
                log::error!("DMX input disabled: {}", e);
                None
            }
        };

        Self {
            transport,
            clock,
            timeout_ms: config.timeout_ms,
            connection: ConnectionState::default(),
            pending_event: None,
            frames_received: 0,
            frames_dropped: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Connection change produced by the most recent polls, if any.
    pub fn take_connection_event(&mut self) -> Option<ConnectionEvent> {
        self.pending_event.take()
    }

    /// Poll the receiver once. Returns the override for an error-free frame.
    pub fn poll_once(&mut self) -> Option<DmxOverride> {
        let transport = self.transport.as_mut()?;
        let now = self.clock.now_ms();

        match transport.receive() {
            Some(packet) if !packet.error => {
                if let Some(event) = self.connection.frame_received(now) {
                    log::info!("DMX is connected!");
                    self.pending_event = Some(event);
                }

                let mut data = DmxUniverse::new();
                transport.read_into(data.as_mut_slice(), packet.size);
                self.frames_received += 1;
                Some(DmxOverride::full_universe(data))
            }
            Some(_) => {
                // Common while a cable is being plugged in or out
                log::debug!("A DMX error occurred, frame dropped");
                self.frames_dropped += 1;
                None
            }
            None => {
                if let Some(event) = self.connection.check_timeout(now, self.timeout_ms) {
                    log::info!("DMX was disconnected.");
                    self.pending_event = Some(event);
                }
                None
            }
        }
    }
}

/// Pin 0 counts as unset.
fn configured_pin(pin: Option<u8>, role: &'static str) -> Result<u8, DmxError> {
    pin.filter(|p| *p > 0).ok_or(DmxError::PinUnset(role))
}

fn arm<T: DmxInput>(
    transport: &mut T,
    pins: &mut dyn PinAllocator,
    config: &InputConfig,
    driver: &DriverConfig,
) -> Result<(), DmxError> {
    let rx = configured_pin(config.rx_pin, "rx")?;
    let tx = configured_pin(config.tx_pin, "tx")?;
    let enable = configured_pin(config.enable_pin, "enable")?;

    if rx == tx || rx == enable {
        return Err(DmxError::DuplicatePin(rx));
    }
    if tx == enable {
        return Err(DmxError::DuplicatePin(tx));
    }

    // The UART peripheral drives these, so none of them is a GPIO output
    let managed = [
        ManagedPin::new(tx, false),
        ManagedPin::new(rx, false),
        ManagedPin::new(enable, false),
    ];
    pins.allocate_multiple(&managed, PinOwner::DmxInput)
        .map_err(DmxError::PinsInUse)?;

    transport.install(driver)?;

    log::info!("Listening for DMX on pin {}", rx);
    log::info!("Sending DMX on pin {}", tx);
    log::info!("DMX enable pin is: {}", enable);
    transport.set_pins(tx, rx, enable);

    Ok(())
}
