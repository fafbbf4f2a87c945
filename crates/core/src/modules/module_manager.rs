use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage, ModuleResult};

const CHANNEL_CAPACITY: usize = 1000;

/// Owns the modules, runs each in its own task and fans events out to them.
pub struct ModuleManager {
    modules: HashMap<ModuleId, Box<dyn AsyncModule>>,
    module_handles: HashMap<ModuleId, JoinHandle<Box<dyn AsyncModule>>>,
    module_senders: HashMap<ModuleId, mpsc::Sender<ModuleEvent>>,
    message_receiver: Option<mpsc::Receiver<ModuleMessage>>,
    message_sender: mpsc::Sender<ModuleMessage>,
    running: bool,
}

impl ModuleManager {
    pub fn new() -> Self {
        let (message_sender, message_receiver) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            modules: HashMap::new(),
            module_handles: HashMap::new(),
            module_senders: HashMap::new(),
            message_receiver: Some(message_receiver),
            message_sender,
            running: false,
        }
    }

    /// Register a new module with the manager
    pub fn register_module(&mut self, module: Box<dyn AsyncModule>) {
        let id = module.id();
        if self.modules.insert(id, module).is_some() {
            log::warn!("Module {:?} registered twice, keeping the latest", id);
        }
    }

    /// Initialize all registered modules
    pub async fn initialize(&mut self) -> ModuleResult {
        for (id, module) in &mut self.modules {
            match module.initialize().await {
                Ok(_) => log::info!("Module {:?} initialized successfully", id),
                Err(e) => {
                    log::error!("Failed to initialize module {:?}: {}", id, e);
                    return Err(format!("{:?} module error: {}", id, e).into());
                }
            }
        }
        Ok(())
    }

    /// Start all modules in their own tasks
    pub async fn start(&mut self) -> ModuleResult {
        if self.running {
            return Err("Module manager is already running".into());
        }

        for (id, mut module) in std::mem::take(&mut self.modules) {
            let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
            let message_tx = self.message_sender.clone();

            // The task hands the module back so it can be shut down afterwards
            let handle = tokio::spawn(async move {
                if let Err(e) = module.run(event_rx, message_tx.clone()).await {
                    let _ = message_tx
                        .send(ModuleMessage::Error(format!("Module {:?} error: {}", id, e)))
                        .await;
                }
                module
            });

            self.module_handles.insert(id, handle);
            self.module_senders.insert(id, event_tx);
        }

        self.running = true;
        Ok(())
    }

    /// Send an event to a specific module
    pub async fn send_to_module(&self, module_id: ModuleId, event: ModuleEvent) -> Result<(), String> {
        let sender = self
            .module_senders
            .get(&module_id)
            .ok_or_else(|| format!("Module {:?} not found", module_id))?;
        sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event to module {:?}: {}", module_id, e))
    }

    /// Broadcast an event to all modules
    pub async fn broadcast_event(&self, event: ModuleEvent) {
        for (id, sender) in &self.module_senders {
            if let Err(e) = sender.send(event.clone()).await {
                log::warn!("Failed to broadcast event to module {:?}: {}", id, e);
            }
        }
    }

    /// Get the message receiver (should only be called once)
    pub fn take_message_receiver(&mut self) -> Option<mpsc::Receiver<ModuleMessage>> {
        self.message_receiver.take()
    }

    /// Stop every module loop, then run each module's shutdown hook
    pub async fn shutdown(&mut self) -> ModuleResult {
        if !self.running {
            return Ok(());
        }

        log::info!("Shutting down module manager...");
        self.broadcast_event(ModuleEvent::Shutdown).await;

        for (id, handle) in std::mem::take(&mut self.module_handles) {
            log::info!("Waiting for module {:?} to shutdown...", id);
            match handle.await {
                Ok(mut module) => {
                    if let Err(e) = module.shutdown().await {
                        log::error!("Module {:?} shutdown error: {}", id, e);
                    }
                    self.modules.insert(id, module);
                }
                Err(e) => log::error!("Module {:?} task failed: {}", id, e),
            }
        }

        self.module_senders.clear();
        self.running = false;
        log::info!("Module manager shutdown complete");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Status of the modules not currently running in a task
    pub fn get_status(&self) -> HashMap<ModuleId, HashMap<String, String>> {
        self.modules
            .iter()
            .map(|(id, module)| (*id, module.status()))
            .collect()
    }
}

impl Default for ModuleManager {
    fn default() -> Self {
        Self::new()
    }
}
