use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection error for {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("HTTP error {status} from {url}")]
    Unhealthy { url: String, status: u16 },
}

impl ProbeError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unhealthy { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// A liveness prober with its own pooled HTTP client.
///
/// One probe per site: timeout budget and connection pool are never shared
/// across endpoints.
#[derive(Debug, Clone)]
pub struct Probe {
    client: Client,
}

impl Probe {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Self::build_client(config),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn build_client(config: &ClientConfig) -> Client {
        Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(config.max_idle_conns)
            .pool_idle_timeout(config.idle_conn_timeout)
            .build()
            .expect("Failed to build HTTP client")
    }

    /// Issue a single GET against `url` and classify the outcome.
    ///
    /// Transport-level failures (DNS, connect, timeout) come back as
    /// [`ProbeError::Transport`]; a reachable endpoint answering with a
    /// status of 400 or above as [`ProbeError::Unhealthy`]. Anything below
    /// 400 counts as alive.
    pub async fn check(&self, url: &str) -> Result<(), ProbeError> {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status >= 400 {
                    return Err(ProbeError::Unhealthy {
                        url: url.to_string(),
                        status,
                    });
                }
                debug!(url, status, "probe succeeded");
                Ok(())
            }
            Err(e) => Err(ProbeError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}
