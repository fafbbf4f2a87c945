use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Subsystem that owns a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinOwner {
    DmxInput,
    DmxOutput,
    LedBus,
    Button,
    Relay,
    Other,
}

impl std::fmt::Display for PinOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinOwner::DmxInput => write!(f, "DMX input"),
            PinOwner::DmxOutput => write!(f, "DMX output"),
            PinOwner::LedBus => write!(f, "LED bus"),
            PinOwner::Button => write!(f, "Button"),
            PinOwner::Relay => write!(f, "Relay"),
            PinOwner::Other => write!(f, "Other"),
        }
    }
}

/// A pin to reserve and whether it is driven as a GPIO output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedPin {
    pub pin: u8,
    pub is_output: bool,
}

impl ManagedPin {
    pub fn new(pin: u8, is_output: bool) -> Self {
        Self { pin, is_output }
    }
}

/// Reserves hardware pins for subsystems.
pub trait PinAllocator {
    /// Reserve all `pins` for `owner`, or none of them. On failure returns
    /// every requested pin that is already taken together with its owner.
    fn allocate_multiple(
        &mut self,
        pins: &[ManagedPin],
        owner: PinOwner,
    ) -> Result<(), Vec<(u8, PinOwner)>>;

    fn owner_of(&self, pin: u8) -> Option<PinOwner>;
}

/// In-memory pin ownership table.
#[derive(Debug, Default)]
pub struct PinManager {
    owners: HashMap<u8, (PinOwner, bool)>,
}

impl PinManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release `pin` if it is held by `owner`.
    pub fn deallocate(&mut self, pin: u8, owner: PinOwner) -> bool {
        match self.owners.get(&pin) {
            Some((current, _)) if *current == owner => {
                self.owners.remove(&pin);
                true
            }
            _ => false,
        }
    }

    pub fn is_output(&self, pin: u8) -> Option<bool> {
        self.owners.get(&pin).map(|(_, output)| *output)
    }
}

impl PinAllocator for PinManager {
    fn allocate_multiple(
        &mut self,
        pins: &[ManagedPin],
        owner: PinOwner,
    ) -> Result<(), Vec<(u8, PinOwner)>> {
        let conflicts: Vec<(u8, PinOwner)> = pins
            .iter()
            .filter_map(|p| self.owners.get(&p.pin).map(|(o, _)| (p.pin, *o)))
            .collect();
        if !conflicts.is_empty() {
            return Err(conflicts);
        }

        for p in pins {
            self.owners.insert(p.pin, (owner, p.is_output));
        }
        Ok(())
    }

    fn owner_of(&self, pin: u8) -> Option<PinOwner> {
        self.owners.get(&pin).map(|(owner, _)| *owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_all() {
        let mut manager = PinManager::new();
        let pins = [ManagedPin::new(16, false), ManagedPin::new(17, true)];
        assert!(manager.allocate_multiple(&pins, PinOwner::DmxInput).is_ok());
        assert_eq!(manager.owner_of(16), Some(PinOwner::DmxInput));
        assert_eq!(manager.is_output(17), Some(true));
    }

    #[test]
    fn test_allocation_is_all_or_nothing() {
        let mut manager = PinManager::new();
        manager
            .allocate_multiple(&[ManagedPin::new(4, true)], PinOwner::Relay)
            .unwrap();

        let pins = [
            ManagedPin::new(16, false),
            ManagedPin::new(4, false),
            ManagedPin::new(17, false),
        ];
        let conflicts = manager
            .allocate_multiple(&pins, PinOwner::DmxInput)
            .unwrap_err();

        assert_eq!(conflicts, vec![(4, PinOwner::Relay)]);
        assert_eq!(manager.owner_of(16), None);
        assert_eq!(manager.owner_of(17), None);
        assert_eq!(manager.owner_of(4), Some(PinOwner::Relay));
    }

    #[test]
    fn test_deallocate_checks_owner() {
        let mut manager = PinManager::new();
        manager
            .allocate_multiple(&[ManagedPin::new(2, false)], PinOwner::Button)
            .unwrap();
        assert!(!manager.deallocate(2, PinOwner::DmxInput));
        assert!(manager.deallocate(2, PinOwner::Button));
        assert_eq!(manager.owner_of(2), None);
    }
}
