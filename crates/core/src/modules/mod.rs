pub mod dmx_input_module;
pub mod dmx_output_module;
pub mod module_manager;
pub mod traits;

// Re-export for convenience
pub use dmx_input_module::DmxInputModule;
pub use dmx_output_module::DmxOutputModule;
pub use module_manager::ModuleManager;
pub use traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage, ModuleResult};
