// MOLGENIS Lifecycle - bootstrapping events and process-wide bootstrap state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Progress of platform bootstrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootstrappingStatus {
    Started,
    Finished,
}

impl fmt::Display for BootstrappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrappingStatus::Started => f.write_str("STARTED"),
            BootstrappingStatus::Finished => f.write_str("FINISHED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrappingEvent {
    pub status: BootstrappingStatus,
    pub timestamp: DateTime<Utc>,
}

impl BootstrappingEvent {
    pub fn new(status: BootstrappingStatus) -> Self {
        Self { status, timestamp: Utc::now() }
    }

    pub fn started() -> Self {
        Self::new(BootstrappingStatus::Started)
    }

    pub fn finished() -> Self {
        Self::new(BootstrappingStatus::Finished)
    }
}

/// Receives bootstrapping events
pub trait BootstrappingListener: Send + Sync {
    fn on_bootstrapping_event(&self, event: &BootstrappingEvent);
}

/// Delivers bootstrapping events to subscribed listeners in subscription order
#[derive(Default)]
pub struct BootstrappingEventPublisher {
    listeners: RwLock<Vec<Arc<dyn BootstrappingListener>>>,
}

impl BootstrappingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, listener: Arc<dyn BootstrappingListener>) {
        self.listeners.write().await.push(listener);
    }

    pub async fn publish(&self, event: BootstrappingEvent) {
        log::info!("Bootstrapping {}", event.status);
        for listener in self.listeners.read().await.iter() {
            listener.on_bootstrapping_event(&event);
        }
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

/// Set-once flag recording that bootstrapping has finished
///
/// Starts out false and flips to true on the first FINISHED event. It is
/// never reset for the lifetime of the process.
#[derive(Debug, Default)]
pub struct BootstrapState {
    bootstrapped: AtomicBool,
}

impl BootstrapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped.load(Ordering::Acquire)
    }

    /// Marks bootstrapping as finished; returns false when it already was
    pub fn mark_bootstrapped(&self) -> bool {
        !self.bootstrapped.swap(true, Ordering::AcqRel)
    }
}

impl BootstrappingListener for BootstrapState {
    fn on_bootstrapping_event(&self, event: &BootstrappingEvent) {
        if event.status == BootstrappingStatus::Finished && self.mark_bootstrapped() {
            log::debug!("Bootstrap state set to finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_only_flips_on_finished() {
        let state = BootstrapState::new();
        assert!(!state.is_bootstrapped());

        state.on_bootstrapping_event(&BootstrappingEvent::started());
        assert!(!state.is_bootstrapped());

        state.on_bootstrapping_event(&BootstrappingEvent::finished());
        assert!(state.is_bootstrapped());

        // Never reset
        state.on_bootstrapping_event(&BootstrappingEvent::started());
        assert!(state.is_bootstrapped());
        assert!(!state.mark_bootstrapped());
    }

    #[tokio::test]
    async fn test_publisher_delivers_to_subscribers() {
        let publisher = BootstrappingEventPublisher::new();
        let first = Arc::new(BootstrapState::new());
        let second = Arc::new(BootstrapState::new());
        publisher.subscribe(first.clone()).await;
        publisher.subscribe(second.clone()).await;
        assert_eq!(publisher.listener_count().await, 2);

        publisher.publish(BootstrappingEvent::finished()).await;
        assert!(first.is_bootstrapped());
        assert!(second.is_bootstrapped());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&BootstrappingStatus::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");
    }
}
