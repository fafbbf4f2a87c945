use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use artnet_protocol::{ArtCommand, Output, PortAddress};
use serde::{Deserialize, Serialize};

use super::{DmxInput, DmxOutput, InputPacket};
use crate::dmx::driver_config::DriverConfig;
use crate::dmx::universe::{DmxUniverse, UNIVERSE_SIZE};
use crate::error::DmxError;

pub const ARTNET_PORT: u16 = 6454;

const BROADCAST_IP: &str = "255.255.255.255";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtNetMode {
    Broadcast,
    /// Specify from (interface) + to (destination) addresses
    Unicast(SocketAddr, SocketAddr),
}

/// Sends the output universe as ArtDmx packets.
pub struct ArtNetOutput {
    socket: UdpSocket,
    destination: SocketAddr,
    universe: u16,
    buffer: DmxUniverse,
    sequence: u8,
}

impl ArtNetOutput {
    pub fn new(mode: ArtNetMode, universe: u16) -> Result<Self, DmxError> {
        let (socket, destination) = match mode {
            ArtNetMode::Broadcast => {
                let socket = UdpSocket::bind(("0.0.0.0", 0))?;
                socket.set_broadcast(true)?;
                let destination = (BROADCAST_IP, ARTNET_PORT)
                    .to_socket_addrs()?
                    .next()
                    .ok_or_else(|| DmxError::Transport("no broadcast address".to_string()))?;
                log::debug!("Art-Net broadcast mode set up OK");
                (socket, destination)
            }
            ArtNetMode::Unicast(src, destination) => {
                log::debug!(
                    "Will connect from interface {} to destination {}",
                    src,
                    destination
                );
                let socket = UdpSocket::bind(src)?;
                socket.set_broadcast(false)?;
                (socket, destination)
            }
        };

        Ok(Self {
            socket,
            destination,
            universe,
            buffer: DmxUniverse::new(),
            sequence: 0,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl DmxOutput for ArtNetOutput {
    fn init(&mut self, universe_len: usize) -> Result<(), DmxError> {
        if universe_len != UNIVERSE_SIZE {
            return Err(DmxError::Transport(format!(
                "Art-Net carries {} channels, got {}",
                UNIVERSE_SIZE, universe_len
            )));
        }
        self.buffer.clear();
        Ok(())
    }

    fn write(&mut self, address: usize, value: u8) {
        self.buffer.set(address, value);
    }

    fn update(&mut self) -> Result<(), DmxError> {
        let port_address = PortAddress::try_from(self.universe)
            .map_err(|e| DmxError::Transport(format!("invalid universe: {:?}", e)))?;

        // Sequence 0 disables reordering on the receiver, so skip it
        self.sequence = self.sequence.wrapping_add(1).max(1);

        let command = ArtCommand::Output(Output {
            sequence: self.sequence,
            port_address,
            data: self.buffer.as_slice().to_vec().into(),
            ..Output::default()
        });

        let bytes = command
            .write_to_buffer()
            .map_err(|e| DmxError::Transport(format!("failed to encode ArtDmx: {:?}", e)))?;
        self.socket.send_to(&bytes, self.destination)?;
        Ok(())
    }
}

/// Receives ArtDmx packets for one universe on a non-blocking UDP socket.
///
/// Datagrams that fail to parse are reported as errored packets. Other
/// Art-Net opcodes and ArtDmx for other universes are ignored.
pub struct ArtNetInput {
    socket: UdpSocket,
    universe: u16,
    data: Vec<u8>,
    recv_buf: Vec<u8>,
}

impl ArtNetInput {
    pub fn bind(addr: SocketAddr, universe: u16) -> Result<Self, DmxError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            universe,
            data: Vec::new(),
            recv_buf: vec![0; 1024],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DmxError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn universe(&self) -> u16 {
        self.universe
    }
}

impl DmxInput for ArtNetInput {
    fn install(&mut self, config: &DriverConfig) -> Result<(), DmxError> {
        log::info!(
            "Art-Net input ready as '{}' on {}, universe {}",
            config.software_version_label,
            self.local_addr()?,
            self.universe
        );
        Ok(())
    }

    fn set_pins(&mut self, _tx: u8, _rx: u8, _enable: u8) {
        // Network input has no transceiver pins
    }

    fn receive(&mut self) -> Option<InputPacket> {
        loop {
            let len = match self.socket.recv_from(&mut self.recv_buf) {
                Ok((len, _)) => len,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return None,
                Err(e) => {
                    log::debug!("Art-Net receive failed: {}", e);
                    return Some(InputPacket {
                        size: 0,
                        error: true,
                    });
                }
            };

            match ArtCommand::from_buffer(&self.recv_buf[..len]) {
                Ok(ArtCommand::Output(output)) => {
                    if u16::from(output.port_address) != self.universe {
                        continue;
                    }
                    let payload: &[u8] = output.data.as_ref();
                    let size = payload.len().min(UNIVERSE_SIZE);
                    self.data = payload[..size].to_vec();
                    return Some(InputPacket { size, error: false });
                }
                // Polls and replies from other nodes share the port
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("Art-Net parse error: {:?}", e);
                    return Some(InputPacket {
                        size: 0,
                        error: true,
                    });
                }
            }
        }
    }

    fn read_into(&mut self, buf: &mut [u8], size: usize) -> usize {
        let len = size.min(buf.len()).min(self.data.len());
        buf[..len].copy_from_slice(&self.data[..len]);
        len
    }
}
