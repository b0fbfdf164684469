/// Configuration for a [`Channel`](crate::Channel).
///
/// Both queues are unbounded; the capacities are only pre-allocation hints.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Initial capacity of the value buffer (default: 16)
    pub buffer_capacity: usize,
    /// Initial capacity of the waiting-consumer queue (default: 4)
    pub consumer_capacity: usize,
    /// Name reported in log events for this channel
    pub label: Option<&'static str>,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(
        buffer_capacity: usize,
        consumer_capacity: usize,
        label: Option<&'static str>,
    ) -> Self {
        Self {
            buffer_capacity,
            consumer_capacity,
            label,
        }
    }

    /// Sets the initial buffer capacity.
    pub const fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets the initial consumer-queue capacity.
    pub const fn with_consumer_capacity(mut self, capacity: usize) -> Self {
        self.consumer_capacity = capacity;
        self
    }

    /// Sets the label used in log events.
    pub const fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

/// Default configuration (16 buffered values, 4 waiting consumers)
pub const DEFAULT_CONFIG: Config = Config::new(16, 4, None);

/// Configuration for short-lived signalling channels (no pre-allocation)
pub const SMALL_CONFIG: Config = Config::new(0, 0, None);

/// Configuration for channels expected to queue large bursts (4K values)
pub const BULK_CONFIG: Config = Config::new(4096, 16, None);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_buffer_capacity(2)
            .with_consumer_capacity(1)
            .with_label("ticks");
        assert_eq!(config.buffer_capacity, 2);
        assert_eq!(config.consumer_capacity, 1);
        assert_eq!(config.label, Some("ticks"));
        assert_eq!(Config::default().label, None);
    }
}
