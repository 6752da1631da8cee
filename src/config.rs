//! Lock manager configuration

use std::time::Duration;

/// Configuration for a [`LockManager`](crate::LockManager).
#[derive(Debug, Clone)]
pub struct LockManagerConfig {
    /// How long a blocked `lock` call sleeps before re-running the deadlock
    /// probe. Bounds the time between a cycle forming and its victim being
    /// denied.
    pub scan_interval: Duration,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(300),
        }
    }
}

impl LockManagerConfig {
    /// Set the deadlock scan interval
    pub fn with_scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scan_interval() {
        assert_eq!(
            LockManagerConfig::default().scan_interval,
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_builder() {
        let config = LockManagerConfig::default().with_scan_interval(Duration::from_millis(10));
        assert_eq!(config.scan_interval, Duration::from_millis(10));
    }
}
