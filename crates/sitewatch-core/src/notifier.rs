//! Notifier configuration records and the seam to the persistence layer.
//!
//! A [`Notifier`] row describes one alert channel for one site. The
//! [`NotifierService`] turns those rows into live [`Observer`]s on a site's
//! [`Hub`]; where the rows come from (SQL, OAuth callbacks, a config file)
//! is behind the [`NotifierRepository`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::notify::{Hub, Observer, SlackNotifier};

/// Type-tagged configuration payload of a notifier record.
///
/// Closed set of kinds; adding a channel means adding a variant and its arm
/// in [`build_observer`](Self::build_observer), not touching the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    Slack { webhook_url: String },
}

impl NotifierConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Slack { .. } => "slack",
        }
    }

    /// Construct the concrete observer for this configuration.
    pub fn build_observer(&self) -> Arc<dyn Observer> {
        match self {
            Self::Slack { webhook_url } => Arc::new(SlackNotifier::new(webhook_url.clone())),
        }
    }
}

/// A persisted notifier record. Storage is owned by the repository layer;
/// the core only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifier {
    pub id: i64,
    pub site_id: u32,
    pub config: NotifierConfig,
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Lookup of notifier records by owning site.
#[async_trait]
pub trait NotifierRepository: Send + Sync {
    async fn list_by_site(&self, site_id: u32) -> Result<Vec<Notifier>, NotifierError>;
}

/// In-memory repository backed by a fixed record set, used when notifier
/// configuration comes from a file rather than a database.
#[derive(Debug, Clone, Default)]
pub struct StaticNotifierRepository {
    notifiers: Vec<Notifier>,
}

impl StaticNotifierRepository {
    pub fn new(notifiers: Vec<Notifier>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl NotifierRepository for StaticNotifierRepository {
    async fn list_by_site(&self, site_id: u32) -> Result<Vec<Notifier>, NotifierError> {
        Ok(self
            .notifiers
            .iter()
            .filter(|n| n.site_id == site_id)
            .cloned()
            .collect())
    }
}

/// Translates persisted notifier records into live observers on a hub.
pub struct NotifierService {
    repository: Arc<dyn NotifierRepository>,
}

impl NotifierService {
    pub fn new(repository: Arc<dyn NotifierRepository>) -> Self {
        Self { repository }
    }

    /// Replace `hub`'s observer set with one observer per stored record for
    /// `site_id`. Returns the number of observers attached.
    ///
    /// On a repository failure the hub is left untouched.
    pub async fn sync_observers(&self, site_id: u32, hub: &Hub) -> Result<usize, NotifierError> {
        let notifiers = self.repository.list_by_site(site_id).await?;

        hub.clear().await;
        for notifier in &notifiers {
            hub.attach(notifier.config.build_observer()).await;
        }

        debug!(site_id, count = notifiers.len(), "Observer set synchronized");
        Ok(notifiers.len())
    }
}
