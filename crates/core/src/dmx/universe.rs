/// Number of channels in one DMX512 universe.
pub const UNIVERSE_SIZE: usize = 512;

/// A DMX512 universe, addressed 1..=512.
#[derive(Clone, PartialEq, Eq)]
pub struct DmxUniverse {
    channels: [u8; UNIVERSE_SIZE],
}

impl DmxUniverse {
    pub fn new() -> Self {
        Self {
            channels: [0; UNIVERSE_SIZE],
        }
    }

    /// Copy up to 512 bytes from `data` into channels 1.. Missing channels stay 0.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut universe = Self::new();
        let len = data.len().min(UNIVERSE_SIZE);
        universe.channels[..len].copy_from_slice(&data[..len]);
        universe
    }

    /// Value at a 1-based address, `None` outside 1..=512.
    pub fn get(&self, address: usize) -> Option<u8> {
        if Self::in_range(address) {
            Some(self.channels[address - 1])
        } else {
            None
        }
    }

    /// Write a 1-based address. Out of range writes are dropped and return false.
    pub fn set(&mut self, address: usize, value: u8) -> bool {
        if Self::in_range(address) {
            self.channels[address - 1] = value;
            true
        } else {
            false
        }
    }

    pub fn in_range(address: usize) -> bool {
        (1..=UNIVERSE_SIZE).contains(&address)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.channels
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.channels
    }

    /// Iterate `(address, value)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.channels
            .iter()
            .enumerate()
            .map(|(idx, value)| (idx + 1, *value))
    }

    pub fn clear(&mut self) {
        self.channels = [0; UNIVERSE_SIZE];
    }
}

impl Default for DmxUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DmxUniverse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only the first few channels; a full dump drowns the logs
        f.debug_struct("DmxUniverse")
            .field("head", &&self.channels[..16])
            .field("non_zero", &self.channels.iter().filter(|v| **v != 0).count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_based_addressing() {
        let mut universe = DmxUniverse::new();
        assert!(universe.set(1, 10));
        assert!(universe.set(512, 20));
        assert_eq!(universe.as_slice()[0], 10);
        assert_eq!(universe.as_slice()[511], 20);
        assert_eq!(universe.get(1), Some(10));
        assert_eq!(universe.get(512), Some(20));
    }

    #[test]
    fn test_out_of_range_is_dropped() {
        let mut universe = DmxUniverse::new();
        assert!(!universe.set(0, 99));
        assert!(!universe.set(513, 99));
        assert_eq!(universe, DmxUniverse::new());
        assert_eq!(universe.get(0), None);
        assert_eq!(universe.get(513), None);
    }

    #[test]
    fn test_from_short_slice() {
        let universe = DmxUniverse::from_slice(&[1, 2, 3]);
        assert_eq!(universe.get(3), Some(3));
        assert_eq!(universe.get(4), Some(0));
    }
}
