use std::time::Duration;

/// Configuration for a [`Group`](crate::Group).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use bcast::GroupConfig;
///
/// let config = GroupConfig::new()
///     .inbox_capacity(16)
///     .idle_timeout(Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Capacity of each member's inbound channel.
    pub(crate) inbox_capacity: usize,
    /// Idle timeout used by [`Group::run`](crate::Group::run).
    ///
    /// Zero means the dispatch loop only stops on an explicit close.
    pub(crate) idle_timeout: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self {
            inbox_capacity: 1,
            idle_timeout: Duration::ZERO,
        }
    }

    /// Set the per-member inbound channel capacity (default: 1).
    ///
    /// Clamped to `1..=Semaphore::MAX_PERMITS`: tokio channels cannot be
    /// unbuffered, and larger capacities make channel creation panic.
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity.clamp(1, tokio::sync::Semaphore::MAX_PERMITS);
        self
    }

    /// Set the idle timeout for [`Group::run`](crate::Group::run) (default: zero, run until closed).
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GroupConfig::default();
        assert_eq!(config.inbox_capacity, 1);
        assert_eq!(config.idle_timeout, Duration::ZERO);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = GroupConfig::new().inbox_capacity(0);
        assert_eq!(config.inbox_capacity, 1);
    }

    #[test]
    fn test_huge_capacity_clamped() {
        let config = GroupConfig::new().inbox_capacity(usize::MAX);
        assert_eq!(config.inbox_capacity, tokio::sync::Semaphore::MAX_PERMITS);
    }

    #[test]
    fn test_builder_chain() {
        let config = GroupConfig::new()
            .inbox_capacity(32)
            .idle_timeout(Duration::from_secs(2));
        assert_eq!(config.inbox_capacity, 32);
        assert_eq!(config.idle_timeout, Duration::from_secs(2));
    }
}
