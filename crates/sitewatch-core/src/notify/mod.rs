//! Status-change notification fan-out.
//!
//! The [`Hub`] is the subject in a subject/observer pair: polling tasks push
//! a [`State`] into it on every status transition and it broadcasts to all
//! attached [`Observer`]s, collecting per-observer failures instead of
//! short-circuiting. One broken alert channel never suppresses the others.

mod slack;

pub use slack::SlackNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// The payload broadcast on a status transition. Immutable value; every
/// observer sees the same one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub status: String,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP {status} from {channel}")]
    Rejected { channel: String, status: u16 },
    #[error("request to {channel} failed: {reason}")]
    Network { channel: String, reason: String },
}

/// An alert channel that can receive a notification state and report
/// delivery success or failure.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn notify(&self, state: &State) -> Result<(), DeliveryError>;
}

/// Fan-out broadcaster holding the observer set behind its own lock.
#[derive(Default)]
pub struct Hub {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Append an observer. No de-duplication.
    pub async fn attach(&self, observer: Arc<dyn Observer>) {
        self.observers.write().await.push(observer);
    }

    /// Drop every attached observer, for re-synchronization from storage.
    pub async fn clear(&self) {
        self.observers.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.observers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.observers.read().await.is_empty()
    }

    /// Deliver `state` to every attached observer.
    ///
    /// The observer set is snapshotted under the lock before delivery, so a
    /// concurrent [`attach`](Self::attach) cannot produce an inconsistent
    /// fan-out. Deliveries run concurrently; each failure lands in the
    /// returned vector and never stops the rest. An empty vector means full
    /// delivery.
    pub async fn notify(&self, state: &State) -> Vec<DeliveryError> {
        let snapshot: Vec<Arc<dyn Observer>> = self.observers.read().await.clone();

        let results = future::join_all(snapshot.iter().map(|observer| observer.notify(state))).await;
        results.into_iter().filter_map(Result::err).collect()
    }
}
