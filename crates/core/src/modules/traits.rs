use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::dmx::DmxOverride;
use crate::pixel::PixelFrame;

pub type ModuleResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Unique identifier for each module type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleId {
    DmxOutput,
    DmxInput,
}

/// Events that can be sent between modules
#[derive(Debug, Clone)]
pub enum ModuleEvent {
    /// Latest LED frame to render on the next output tick
    PixelFrame(PixelFrame),
    /// Universe received on the DMX input
    RealtimeOverride(DmxOverride),
    /// DMX input source appeared (true) or timed out (false)
    ConnectionChanged(bool),
    /// System events
    Shutdown,
}

/// Messages passed between modules and the module manager
#[derive(Debug)]
pub enum ModuleMessage {
    Event(ModuleEvent),
    Status(String),
    Error(String),
}

/// Trait that all async modules must implement
#[async_trait]
pub trait AsyncModule: Send + Sync {
    /// Get the unique identifier for this module
    fn id(&self) -> ModuleId;

    /// Initialize the module (called once at startup)
    async fn initialize(&mut self) -> ModuleResult;

    /// Start the module's main loop. Returns once a `Shutdown` event arrives.
    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ModuleEvent>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> ModuleResult;

    /// Shutdown the module gracefully
    async fn shutdown(&mut self) -> ModuleResult;

    /// Get the module's status
    fn status(&self) -> HashMap<String, String>;
}
