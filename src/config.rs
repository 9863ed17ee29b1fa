//! Node configuration

use std::time::Duration;

use crate::registry::DEFAULT_QUEUE_CAPACITY;

/// Configuration options for a relay node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Capacity of each stream delivery queue, in chunks
    pub queue_capacity: usize,

    /// Capacity of each peer's send queue; a full queue drops that peer's
    /// chunk copies rather than blocking the fan-out
    pub fanout_capacity: usize,

    /// Greeting string sent in the relay handshake
    pub greeting: String,

    /// Reporting sink endpoint; `None` disables event reporting
    pub report_endpoint: Option<String>,

    /// Interval between peer-set snapshots sent to the reporting sink
    pub report_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            fanout_capacity: 16,
            greeting: "live relay node".to_string(),
            report_endpoint: None,
            report_interval: Duration::from_secs(10),
        }
    }
}

impl NodeConfig {
    /// Set the per-queue chunk capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-peer send queue capacity
    pub fn fanout_capacity(mut self, capacity: usize) -> Self {
        self.fanout_capacity = capacity.max(1);
        self
    }

    /// Set the handshake greeting
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Enable event reporting to the given endpoint
    pub fn report_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.report_endpoint = Some(endpoint.into());
        self
    }

    /// Set the peer snapshot interval
    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();

        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.fanout_capacity, 16);
        assert!(config.report_endpoint.is_none());
        assert_eq!(config.report_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_queue_capacity() {
        let config = NodeConfig::default().queue_capacity(32);
        assert_eq!(config.queue_capacity, 32);
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        // Zero-capacity queues cannot carry a header chunk.
        let config = NodeConfig::default().queue_capacity(0);
        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = NodeConfig::default()
            .queue_capacity(4)
            .fanout_capacity(8)
            .greeting("hi there")
            .report_endpoint("http://localhost:8585/event")
            .report_interval(Duration::from_secs(1));

        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.fanout_capacity, 8);
        assert_eq!(config.greeting, "hi there");
        assert_eq!(
            config.report_endpoint.as_deref(),
            Some("http://localhost:8585/event")
        );
        assert_eq!(config.report_interval, Duration::from_secs(1));
    }
}
