use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

use super::traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage, ModuleResult};
use crate::dmx::{OutputDriverKind, OutputMapper, UNIVERSE_SIZE};
use crate::pixel::PixelFrame;
use crate::transport::DmxOutput;

/// Renders the most recent pixel frame to the DMX output at a fixed rate.
pub struct DmxOutputModule {
    mapper: OutputMapper,
    transport: Mutex<Box<dyn DmxOutput>>,
    driver: OutputDriverKind,
    proxy_universe: u16,
    target_fps: f64,
    initialized: bool,
    frames_sent: u64,
    send_errors: u64,
    status: HashMap<String, String>,
}

impl DmxOutputModule {
    pub fn new(mapper: OutputMapper, transport: Box<dyn DmxOutput>, driver: OutputDriverKind) -> Self {
        Self {
            mapper,
            transport: Mutex::new(transport),
            driver,
            proxy_universe: 0,
            target_fps: 44.0, // DMX standard 44Hz
            initialized: false,
            frames_sent: 0,
            send_errors: 0,
            status: HashMap::new(),
        }
    }

    /// Rates that are not finite and positive are ignored.
    pub fn set_target_fps(&mut self, fps: f64) {
        if fps.is_finite() && fps > 0.0 {
            self.target_fps = fps;
        } else {
            log::warn!("Ignoring DMX output rate {}, keeping {}Hz", fps, self.target_fps);
        }
    }

    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    /// A non-zero universe means another component owns the bus.
    pub fn set_proxy_universe(&mut self, universe: u16) {
        self.proxy_universe = universe;
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    fn send_frame(&mut self, frame: &PixelFrame) -> Result<(), String> {
        if self.proxy_universe != 0 {
            log::debug!(
                "DMX output skipped, universe {} is proxied",
                self.proxy_universe
            );
            return Ok(());
        }

        let transport = self.transport.get_mut();
        match self.mapper.tick(frame, transport.as_mut()) {
            Ok(_) => {
                self.frames_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.send_errors += 1;
                log::error!("DMX output failed: {}", e);
                Err(e.to_string())
            }
        }
    }
}

#[async_trait]
impl AsyncModule for DmxOutputModule {
    fn id(&self) -> ModuleId {
        ModuleId::DmxOutput
    }

    async fn initialize(&mut self) -> ModuleResult {
        log::info!(
            "Initializing DMX output with {} driver",
            self.driver.as_str()
        );

        self.driver
            .initialize(self.transport.get_mut().as_mut())?;
        self.initialized = true;

        let addressing = self.mapper.addressing();
        self.status
            .insert("driver".to_string(), self.driver.as_str().to_string());
        self.status.insert(
            "start_address".to_string(),
            addressing.start_address.to_string(),
        );
        self.status.insert(
            "channels_per_fixture".to_string(),
            addressing.channels_per_fixture.to_string(),
        );
        self.status
            .insert("status".to_string(), "initialized".to_string());

        Ok(())
    }

    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ModuleEvent>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> ModuleResult {
        if !self.initialized {
            return Err("DMX output module not initialized".into());
        }

        let frame_duration = Duration::from_secs_f64(1.0 / self.target_fps);
        let mut frame_interval = interval(frame_duration);
        let mut current_frame: Option<PixelFrame> = None;

        log::info!(
            "DMX output started, {} channels at {}Hz",
            UNIVERSE_SIZE,
            self.target_fps
        );
        let _ = tx
            .send(ModuleMessage::Status(format!(
                "DMX output running at {}Hz",
                self.target_fps
            )))
            .await;

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    match event {
                        ModuleEvent::PixelFrame(frame) => {
                            current_frame = Some(frame);
                        }
                        ModuleEvent::Shutdown => {
                            log::info!("DMX output received shutdown signal");
                            break;
                        }
                        _ => {}
                    }
                }

                _ = frame_interval.tick() => {
                    let Some(frame) = current_frame.as_ref() else {
                        continue;
                    };
                    if let Err(e) = self.send_frame(frame) {
                        let _ = tx.send(ModuleMessage::Error(format!("DMX output: {}", e))).await;
                    }

                    // Every 5 seconds
                    let report_every = (self.target_fps as u64 * 5).max(1);
                    if self.frames_sent > 0 && self.frames_sent % report_every == 0 {
                        self.status.insert("frames_sent".to_string(), self.frames_sent.to_string());
                        self.status.insert("send_errors".to_string(), self.send_errors.to_string());
                        let _ = tx.send(ModuleMessage::Status(format!(
                            "DMX output: {} frames sent",
                            self.frames_sent
                        ))).await;
                    }
                }
            }
        }

        log::info!(
            "DMX output shutting down after sending {} frames",
            self.frames_sent
        );
        Ok(())
    }

    async fn shutdown(&mut self) -> ModuleResult {
        self.status
            .insert("frames_sent".to_string(), self.frames_sent.to_string());
        self.status
            .insert("status".to_string(), "shutdown".to_string());
        log::info!("DMX output shutdown complete");
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}
