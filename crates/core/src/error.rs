use thiserror::Error;

use crate::pins::PinOwner;

/// Errors raised while bringing up or driving a DMX transport.
#[derive(Debug, Error)]
pub enum DmxError {
    #[error("DMX input pin '{0}' is not configured")]
    PinUnset(&'static str),

    #[error("DMX input pin {0} is assigned to more than one role")]
    DuplicatePin(u8),

    #[error("DMX pins already in use: {}", format_conflicts(.0))]
    PinsInUse(Vec<(u8, PinOwner)>),

    #[error("failed to install DMX driver: {0}")]
    DriverInstall(String),

    #[error("DMX transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_conflicts(conflicts: &[(u8, PinOwner)]) -> String {
    conflicts
        .iter()
        .map(|(pin, owner)| format!("{} (owned by {})", pin, owner))
        .collect::<Vec<_>>()
        .join(", ")
}
