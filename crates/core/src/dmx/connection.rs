use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Default time without a good frame before the input is considered gone.
pub const DEFAULT_INPUT_TIMEOUT_MS: u64 = 5000;

/// Millisecond time source for liveness tracking.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

/// Monotonic clock counting from its creation.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Presence of an upstream DMX source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub is_connected: bool,
    /// Time of the last error-free frame.
    pub last_update_ms: u64,
}

/// Change produced by feeding the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// Record an error-free frame received at `now_ms`.
    pub fn frame_received(&mut self, now_ms: u64) -> Option<ConnectionEvent> {
        self.last_update_ms = now_ms;
        if self.is_connected {
            None
        } else {
            self.is_connected = true;
            Some(ConnectionEvent::Connected)
        }
    }

    /// Check for a lost source. Disconnects once strictly more than
    /// `timeout_ms` passed since the last good frame.
    pub fn check_timeout(&mut self, now_ms: u64, timeout_ms: u64) -> Option<ConnectionEvent> {
        if self.is_connected && now_ms.wrapping_sub(self.last_update_ms) > timeout_ms {
            self.is_connected = false;
            Some(ConnectionEvent::Disconnected)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_once() {
        let mut state = ConnectionState::default();
        assert_eq!(state.frame_received(10), Some(ConnectionEvent::Connected));
        assert_eq!(state.frame_received(20), None);
        assert_eq!(state.last_update_ms, 20);
    }

    #[test]
    fn test_timeout_is_strict() {
        let mut state = ConnectionState::default();
        state.frame_received(1000);
        assert_eq!(state.check_timeout(6000, DEFAULT_INPUT_TIMEOUT_MS), None);
        assert_eq!(
            state.check_timeout(6001, DEFAULT_INPUT_TIMEOUT_MS),
            Some(ConnectionEvent::Disconnected)
        );
        assert_eq!(state.check_timeout(9000, DEFAULT_INPUT_TIMEOUT_MS), None);
    }

    #[test]
    fn test_timeout_survives_clock_wrap() {
        let mut state = ConnectionState::default();
        state.frame_received(u64::MAX - 10);
        assert_eq!(state.check_timeout(5, DEFAULT_INPUT_TIMEOUT_MS), None);
        assert_eq!(
            state.check_timeout(5000, DEFAULT_INPUT_TIMEOUT_MS),
            Some(ConnectionEvent::Disconnected)
        );
    }

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), 150);
        other.set(7);
        assert_eq!(clock.now_ms(), 7);
    }
}
