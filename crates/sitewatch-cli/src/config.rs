//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! log_format = "json"
//!
//! [defaults]
//! interval_ms = 60000
//! timeout_ms = 10000
//!
//! [[site]]
//! id = 1
//! url = "https://example.com"
//! interval_ms = 30000
//!
//! [[site]]
//! id = 2
//! url = "https://api.example.com/health"
//! enabled = false
//!
//! [[notifier]]
//! id = 1
//! site_id = 1
//! config = { type = "slack", webhook_url = "https://hooks.slack.com/services/T0/B0/XXXX" }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use sitewatch_core::{ClientConfig, Notifier, Site};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub site: Vec<SiteDef>,

    #[serde(default)]
    pub notifier: Vec<Notifier>,
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,

    #[serde(default = "default_idle_conn_timeout_ms")]
    pub idle_conn_timeout_ms: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            max_idle_conns: default_max_idle_conns(),
            idle_conn_timeout_ms: default_idle_conn_timeout_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_idle_conns() -> usize {
    100
}

fn default_idle_conn_timeout_ms() -> u64 {
    90_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteDef {
    pub id: u32,
    pub url: String,

    pub interval_ms: Option<u64>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub timeout_ms: Option<u64>,
    pub max_idle_conns: Option<usize>,
    pub idle_conn_timeout_ms: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl SiteDef {
    pub fn to_client_config(&self, defaults: &DefaultsConfig) -> ClientConfig {
        ClientConfig::default()
            .with_request_timeout(Duration::from_millis(
                self.timeout_ms.unwrap_or(defaults.timeout_ms),
            ))
            .with_max_idle_conns(self.max_idle_conns.unwrap_or(defaults.max_idle_conns))
            .with_idle_conn_timeout(Duration::from_millis(
                self.idle_conn_timeout_ms
                    .unwrap_or(defaults.idle_conn_timeout_ms),
            ))
    }

    pub fn interval(&self, defaults: &DefaultsConfig) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(defaults.interval_ms))
    }

    pub fn to_site(&self, defaults: &DefaultsConfig) -> Site {
        let site = Site::new(
            self.id,
            self.url.clone(),
            self.interval(defaults),
            &self.to_client_config(defaults),
        );
        site.set_enabled(self.enabled);
        site
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        match self.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        if self.defaults.interval_ms == 0 {
            return Err("defaults.interval_ms must be greater than zero".into());
        }

        let mut site_ids = std::collections::HashSet::new();
        for s in &self.site {
            if !site_ids.insert(s.id) {
                return Err(format!("Duplicate site ID: {}", s.id));
            }
            let parsed = url::Url::parse(&s.url)
                .map_err(|e| format!("Invalid URL for site {}: {} ({})", s.id, s.url, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "Site URL must use http or https for site {}: {}",
                    s.id, s.url
                ));
            }
            if s.interval_ms == Some(0) {
                return Err(format!("Site {} has a zero interval", s.id));
            }
        }

        let mut notifier_ids = std::collections::HashSet::new();
        for n in &self.notifier {
            if !notifier_ids.insert(n.id) {
                return Err(format!("Duplicate notifier ID: {}", n.id));
            }
            if !site_ids.contains(&n.site_id) {
                return Err(format!(
                    "Notifier {} references unknown site {}",
                    n.id, n.site_id
                ));
            }
            match &n.config {
                sitewatch_core::NotifierConfig::Slack { webhook_url } => {
                    url::Url::parse(webhook_url).map_err(|e| {
                        format!(
                            "Invalid webhook URL for notifier {}: {} ({})",
                            n.id, webhook_url, e
                        )
                    })?;
                }
            }
        }

        Ok(())
    }
}
