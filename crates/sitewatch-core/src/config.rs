use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP client configuration for a single monitored site.
///
/// Every site gets its own client built from one of these, so a slow or
/// misbehaving endpoint exhausts only its own timeout budget and connection
/// pool, never a neighbour's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request deadline for a probe (default: 10 s).
    pub request_timeout: Duration,
    /// Idle connections kept pooled per host (default: 100).
    pub max_idle_conns: usize,
    /// Age after which an idle connection is evicted (default: 90 s).
    pub idle_conn_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_idle_conns: 100,
            idle_conn_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_idle_conns(mut self, max: usize) -> Self {
        self.max_idle_conns = max;
        self
    }

    pub fn with_idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.idle_conn_timeout = timeout;
        self
    }
}
