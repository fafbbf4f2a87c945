use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage, ModuleResult};
use crate::dmx::{Clock, ConnectionEvent, InputDecoder};
use crate::transport::DmxInput;

/// Polls an `InputDecoder` and publishes overrides and connection changes.
pub struct DmxInputModule<T, C> {
    decoder: Mutex<InputDecoder<T, C>>,
    poll_hz: f64,
    status: HashMap<String, String>,
}

impl<T: DmxInput, C: Clock> DmxInputModule<T, C> {
    pub fn new(decoder: InputDecoder<T, C>) -> Self {
        Self {
            decoder: Mutex::new(decoder),
            poll_hz: 100.0,
            status: HashMap::new(),
        }
    }

    /// Rates that are not finite and positive are ignored.
    pub fn set_poll_hz(&mut self, hz: f64) {
        if hz.is_finite() && hz > 0.0 {
            self.poll_hz = hz;
        } else {
            log::warn!("Ignoring DMX input poll rate {}, keeping {}Hz", hz, self.poll_hz);
        }
    }

    pub fn poll_hz(&self) -> f64 {
        self.poll_hz
    }

    fn update_status(&mut self) {
        let decoder = self.decoder.get_mut();
        let connection = decoder.connection();
        let frames_received = decoder.frames_received();
        let frames_dropped = decoder.frames_dropped();

        self.status
            .insert("connected".to_string(), connection.is_connected.to_string());
        self.status
            .insert("frames_received".to_string(), frames_received.to_string());
        self.status
            .insert("frames_dropped".to_string(), frames_dropped.to_string());
    }
}

#[async_trait]
impl<T, C> AsyncModule for DmxInputModule<T, C>
where
    T: DmxInput + 'static,
    C: Clock + 'static,
{
    fn id(&self) -> ModuleId {
        ModuleId::DmxInput
    }

    async fn initialize(&mut self) -> ModuleResult {
        let armed = self.decoder.get_mut().is_initialized();
        let state = if armed { "listening" } else { "disabled" };
        log::info!("DMX input module {}", state);
        self.status.insert("status".to_string(), state.to_string());
        self.update_status();
        Ok(())
    }

    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ModuleEvent>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> ModuleResult {
        let armed = self.decoder.get_mut().is_initialized();
        let mut poll_interval = interval(Duration::from_secs_f64(1.0 / self.poll_hz));
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if armed {
            log::info!("DMX input polling at {}Hz", self.poll_hz);
        }

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    if let ModuleEvent::Shutdown = event {
                        log::info!("DMX input received shutdown signal");
                        break;
                    }
                }

                _ = poll_interval.tick(), if armed => {
                    let (frame, change) = {
                        let decoder = self.decoder.get_mut();
                        let frame = decoder.poll_once();
                        (frame, decoder.take_connection_event())
                    };

                    if let Some(change) = change {
                        let connected = change == ConnectionEvent::Connected;
                        self.update_status();
                        let _ = tx
                            .send(ModuleMessage::Event(ModuleEvent::ConnectionChanged(connected)))
                            .await;
                    }
                    if let Some(frame) = frame {
                        let _ = tx
                            .send(ModuleMessage::Event(ModuleEvent::RealtimeOverride(frame)))
                            .await;
                    }
                }

                else => break,
            }
        }

        Ok(())
    }

    async fn shutdown(&mut self) -> ModuleResult {
        self.update_status();
        self.status
            .insert("status".to_string(), "shutdown".to_string());
        log::info!("DMX input shutdown complete");
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}
