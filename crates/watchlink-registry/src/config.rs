//! Liveness configuration.

use std::time::Duration;

/// Heartbeat tuning for connection liveness.
///
/// The handler pings every `ping_interval_secs` and treats a connection
/// that has produced nothing (frames or pongs) for `timeout_secs` as
/// closed, entering the same cleanup path as an explicit close. Neither
/// value is correctness-critical; they trade detection latency against
/// tolerance for slow networks.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Seconds between liveness probes.
    pub ping_interval_secs: u64,

    /// Seconds of silence after which a connection is considered dead.
    pub timeout_secs: u64,
}

impl HeartbeatConfig {
    /// The probe interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// The dead-connection timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 15,
            timeout_secs: 45,
        }
    }
}
