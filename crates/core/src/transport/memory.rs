use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DmxInput, DmxOutput, InputPacket};
use crate::dmx::driver_config::DriverConfig;
use crate::dmx::universe::{DmxUniverse, UNIVERSE_SIZE};
use crate::error::DmxError;

#[derive(Default)]
struct MemoryState {
    loopback: bool,
    buffer: DmxUniverse,
    last_sent: Option<DmxUniverse>,
    update_count: usize,
    init_calls: Vec<(&'static str, usize)>,
    inbound: VecDeque<(Vec<u8>, bool)>,
    current: Vec<u8>,
    installed: Option<DriverConfig>,
    fail_install: bool,
    pins: Option<(u8, u8, u8)>,
}

/// In-process DMX bus. Handles returned by `output()` and `input()` share the
/// same state, so tests and demos can inspect what was sent and inject what is
/// received.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus where every transmitted universe is also received.
    pub fn loopback() -> Self {
        let transport = Self::new();
        transport.state.lock().loopback = true;
        transport
    }

    pub fn output(&self) -> MemoryOutput {
        MemoryOutput {
            state: self.state.clone(),
        }
    }

    pub fn input(&self) -> MemoryInput {
        MemoryInput {
            state: self.state.clone(),
        }
    }

    /// Queue an error-free inbound frame.
    pub fn push_frame(&self, data: &[u8]) {
        self.state.lock().inbound.push_back((data.to_vec(), false));
    }

    /// Queue an inbound frame flagged with a receive error.
    pub fn push_error(&self) {
        self.state.lock().inbound.push_back((Vec::new(), true));
    }

    /// Make the next driver install fail.
    pub fn fail_install(&self, fail: bool) {
        self.state.lock().fail_install = fail;
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().update_count
    }

    pub fn last_sent(&self) -> Option<DmxUniverse> {
        self.state.lock().last_sent.clone()
    }

    pub fn init_calls(&self) -> Vec<(&'static str, usize)> {
        self.state.lock().init_calls.clone()
    }

    pub fn installed_config(&self) -> Option<DriverConfig> {
        self.state.lock().installed.clone()
    }

    /// Pins bound by the input side as `(tx, rx, enable)`.
    pub fn bound_pins(&self) -> Option<(u8, u8, u8)> {
        self.state.lock().pins
    }
}

pub struct MemoryOutput {
    state: Arc<Mutex<MemoryState>>,
}

impl DmxOutput for MemoryOutput {
    fn init(&mut self, universe_len: usize) -> Result<(), DmxError> {
        self.state.lock().init_calls.push(("init", universe_len));
        Ok(())
    }

    fn init_write(&mut self, universe_len: usize) -> Result<(), DmxError> {
        self.state.lock().init_calls.push(("init_write", universe_len));
        Ok(())
    }

    fn write(&mut self, address: usize, value: u8) {
        self.state.lock().buffer.set(address, value);
    }

    fn update(&mut self) -> Result<(), DmxError> {
        let mut state = self.state.lock();
        let universe = state.buffer.clone();
        if state.loopback {
            state.inbound.push_back((universe.as_slice().to_vec(), false));
        }
        state.last_sent = Some(universe);
        state.update_count += 1;
        Ok(())
    }
}

pub struct MemoryInput {
    state: Arc<Mutex<MemoryState>>,
}

impl DmxInput for MemoryInput {
    fn install(&mut self, config: &DriverConfig) -> Result<(), DmxError> {
        let mut state = self.state.lock();
        if state.fail_install {
            return Err(DmxError::DriverInstall("memory driver refused install".to_string()));
        }
        state.installed = Some(config.clone());
        Ok(())
    }

    fn set_pins(&mut self, tx: u8, rx: u8, enable: u8) {
        self.state.lock().pins = Some((tx, rx, enable));
    }

    fn receive(&mut self) -> Option<InputPacket> {
        let mut state = self.state.lock();
        let (data, error) = state.inbound.pop_front()?;
        let size = data.len().min(UNIVERSE_SIZE);
        state.current = data;
        Some(InputPacket { size, error })
    }

    fn read_into(&mut self, buf: &mut [u8], size: usize) -> usize {
        let state = self.state.lock();
        let len = size.min(buf.len()).min(state.current.len());
        buf[..len].copy_from_slice(&state.current[..len]);
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_delivers_sent_universe() {
        let transport = MemoryTransport::loopback();
        let mut output = transport.output();
        let mut input = transport.input();

        output.write(1, 42);
        output.write(512, 7);
        output.update().unwrap();

        let packet = input.receive().unwrap();
        assert_eq!(packet, InputPacket { size: 512, error: false });

        let mut buf = [0u8; 512];
        assert_eq!(input.read_into(&mut buf, packet.size), 512);
        assert_eq!(buf[0], 42);
        assert_eq!(buf[511], 7);
        assert!(input.receive().is_none());
    }

    #[test]
    fn test_plain_bus_does_not_echo() {
        let transport = MemoryTransport::new();
        transport.output().update().unwrap();
        assert!(transport.input().receive().is_none());
        assert_eq!(transport.update_count(), 1);
    }

    #[test]
    fn test_only_last_universe_is_kept() {
        let transport = MemoryTransport::new();
        let mut output = transport.output();
        for value in 1..=100u8 {
            output.write(1, value);
            output.update().unwrap();
        }

        assert_eq!(transport.update_count(), 100);
        assert_eq!(transport.last_sent().unwrap().get(1), Some(100));
    }

    #[test]
    fn test_injected_error_frame() {
        let transport = MemoryTransport::new();
        transport.push_error();
        let packet = transport.input().receive().unwrap();
        assert!(packet.error);
    }
}
