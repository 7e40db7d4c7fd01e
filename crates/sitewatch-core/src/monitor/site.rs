use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::monitor::probe::{Probe, ProbeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    Up,
    Down,
    Error,
    Paused,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Error => write!(f, "error"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// Last observed status of a site. `changed_at` moves iff `status` moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: SiteStatus,
    pub changed_at: DateTime<Utc>,
}

/// Outcome of a single [`Site::check`].
///
/// The status write already happened by the time this is returned; `error`
/// carries the probe failure (if any) for the caller to log, and `changed`
/// tells the polling task whether to notify.
#[derive(Debug)]
pub struct CheckReport {
    pub record: StatusRecord,
    pub changed: bool,
    pub error: Option<ProbeError>,
}

/// One monitored endpoint: immutable identity and polling policy, plus the
/// mutable status record guarded by the site's own lock.
///
/// Sites are constructed by the caller and handed to the
/// [`Scheduler`](crate::monitor::Scheduler) at registration; the scheduler
/// never builds them itself.
#[derive(Debug)]
pub struct Site {
    id: u32,
    url: String,
    interval: Duration,
    enabled: AtomicBool,
    probe: Probe,
    record: RwLock<StatusRecord>,
}

impl Site {
    pub fn new(id: u32, url: impl Into<String>, interval: Duration, config: &ClientConfig) -> Self {
        Self {
            id,
            url: url.into(),
            // A zero interval would panic the tokio timer.
            interval: interval.max(Duration::from_millis(1)),
            enabled: AtomicBool::new(true),
            probe: Probe::new(config),
            record: RwLock::new(StatusRecord {
                status: SiteStatus::Paused,
                changed_at: Utc::now(),
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Copy of the current status record, taken under the read lock.
    pub async fn status(&self) -> StatusRecord {
        *self.record.read().await
    }

    /// Run one probe against the site and fold the outcome into the status
    /// record.
    ///
    /// Transport failure maps to [`SiteStatus::Error`], an HTTP error status
    /// to [`SiteStatus::Down`], success to [`SiteStatus::Up`]. Status and
    /// timestamp are updated together under the write lock; the probe error
    /// is returned as data, never raised.
    pub async fn check(&self) -> CheckReport {
        let outcome = self.probe.check(&self.url).await;
        let status = match &outcome {
            Ok(()) => SiteStatus::Up,
            Err(ProbeError::Unhealthy { .. }) => SiteStatus::Down,
            Err(ProbeError::Transport { .. }) => SiteStatus::Error,
        };

        let (record, changed) = self.update_status(status).await;
        CheckReport {
            record,
            changed,
            error: outcome.err(),
        }
    }

    async fn update_status(&self, status: SiteStatus) -> (StatusRecord, bool) {
        let mut record = self.record.write().await;
        if record.status != status {
            *record = StatusRecord {
                status,
                changed_at: Utc::now(),
            };
            (*record, true)
        } else {
            (*record, false)
        }
    }
}
