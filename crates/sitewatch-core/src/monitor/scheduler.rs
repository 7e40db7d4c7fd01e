use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::monitor::site::{CheckReport, Site, SiteStatus};
use crate::notify::{Hub, State};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("site {id} is already being monitored")]
    AlreadyRegistered { id: u32 },
}

/// A live registry entry: the site, its notification hub, and the handle
/// used to cancel its polling task.
pub struct Registration {
    site: Arc<Site>,
    hub: Arc<Hub>,
    cancel: watch::Sender<bool>,
}

impl Registration {
    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }
}

/// Owns the registry of monitored sites and their background polling tasks.
///
/// Each registered site gets one independent task ticking at the site's own
/// interval; there is no central clock multiplexing targets. Structural
/// mutation goes through the concurrent registry map, per-site status lives
/// behind each site's own lock, so independent sites never block each other.
#[derive(Clone, Default)]
pub struct Scheduler {
    sites: Arc<DashMap<u32, Registration>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            sites: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.sites.contains_key(&id)
    }

    pub fn site(&self, id: u32) -> Option<Arc<Site>> {
        self.sites.get(&id).map(|entry| Arc::clone(&entry.site))
    }

    pub fn hub(&self, id: u32) -> Option<Arc<Hub>> {
        self.sites.get(&id).map(|entry| Arc::clone(&entry.hub))
    }

    /// Register a site and start its polling task.
    ///
    /// Fails with [`SchedulerError::AlreadyRegistered`] and no side effect if
    /// the ID is already in the registry. Returns without waiting for the
    /// first check; the task's first wake is one interval after registration.
    pub fn register(&self, site: Arc<Site>, hub: Arc<Hub>) -> Result<(), SchedulerError> {
        let id = site.id();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        match self.sites.entry(id) {
            Entry::Occupied(_) => {
                return Err(SchedulerError::AlreadyRegistered { id });
            }
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    site: Arc::clone(&site),
                    hub: Arc::clone(&hub),
                    cancel: cancel_tx,
                });
            }
        }

        info!(site_id = id, site = %site.url(), "Monitoring started");
        self.spawn_polling_task(site, hub, cancel_rx);
        Ok(())
    }

    /// Stop monitoring a site. Idempotent; unknown IDs are a logged no-op.
    ///
    /// Cancellation is fire-and-forget: the task removes its own registry
    /// entry when it observes the signal, so the ID may linger for up to one
    /// wake before it can be reused.
    pub fn revoke(&self, id: u32) {
        match self.sites.get(&id) {
            Some(entry) => {
                let _ = entry.cancel.send(true);
                info!(site_id = id, site = %entry.site.url(), "Monitoring stopping");
            }
            None => {
                info!(site_id = id, "Revoke requested but no monitoring was active");
            }
        }
    }

    /// Resume checks for a site. Idempotent; unknown IDs are a logged no-op.
    pub fn enable(&self, id: u32) {
        self.set_enabled(id, true);
    }

    /// Suppress checks for a site without stopping its task, so re-enabling
    /// takes effect on the next tick. Idempotent; unknown IDs are a logged
    /// no-op.
    pub fn disable(&self, id: u32) {
        self.set_enabled(id, false);
    }

    fn set_enabled(&self, id: u32, enabled: bool) {
        match self.sites.get(&id) {
            Some(entry) => {
                entry.site.set_enabled(enabled);
                info!(site_id = id, site = %entry.site.url(), enabled, "Monitoring toggled");
            }
            None => {
                info!(site_id = id, enabled, "Toggle requested but no monitoring was active");
            }
        }
    }

    fn spawn_polling_task(
        &self,
        site: Arc<Site>,
        hub: Arc<Hub>,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let sites = Arc::clone(&self.sites);

        tokio::spawn(async move {
            let interval = site.interval();
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            // A check that overruns its interval swallows the missed wakes
            // instead of replaying them.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => {
                        sites.remove(&site.id());
                        info!(site_id = site.id(), site = %site.url(), "Monitoring stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !site.is_enabled() {
                            continue;
                        }

                        let report = site.check().await;
                        if let Some(error) = &report.error {
                            warn!(site = %site.url(), error = %error, "Site check failed");
                        }

                        if report.changed {
                            let state = State {
                                name: site.url().to_string(),
                                status: report.record.status.to_string(),
                                message: transition_message(&report),
                                updated_at: report.record.changed_at,
                            };
                            for error in hub.notify(&state).await {
                                warn!(site = %site.url(), error = %error, "Notification delivery failed");
                            }
                        }
                    }
                }
            }
        });
    }
}

fn transition_message(report: &CheckReport) -> String {
    match (&report.error, report.record.status) {
        (Some(error), _) => error.to_string(),
        (None, SiteStatus::Up) => "Site is responding normally".to_string(),
        (None, status) => format!("Site is {}", status),
    }
}
