/// Point-in-time counters for a single channel.
///
/// Returned by [`Channel::metrics`](crate::Channel::metrics); counters only
/// ever grow over a channel's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Payload values accepted into the buffer.
    pub values_put: u64,
    /// Messages discarded because the channel was already closed (END included).
    pub values_dropped: u64,
    /// Consumers registered through `take`.
    pub consumers_registered: u64,
    /// `take` calls ignored because the channel was closed and drained.
    pub takes_ignored: u64,
    /// Value/consumer pairs handed to the scheduler.
    pub deliveries: u64,
}

impl Metrics {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages still owed to consumers: accepted payloads plus END, minus deliveries.
    pub fn undelivered(&self, closed: bool) -> u64 {
        (self.values_put + u64::from(closed)).saturating_sub(self.deliveries)
    }
}
