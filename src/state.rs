use crate::config::Config;
use crate::models::Dataset;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::RwLock;
use tracing::info;

/// Monotonic counter of requested loads. A load may only be applied while its
/// ticket is still the newest one handed out.
#[derive(Debug, Default)]
pub struct LoadGeneration {
    latest: AtomicU64,
}

impl LoadGeneration {
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.current() == ticket
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dataset: Arc<RwLock<Option<Arc<Dataset>>>>,
    pub loads: Arc<LoadGeneration>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            dataset: Arc::new(RwLock::new(None)),
            loads: Arc::new(LoadGeneration::default()),
        }
    }

    /// Replace the current dataset unless a newer load was requested after
    /// `ticket` was taken. Returns whether the dataset was applied.
    pub async fn apply_load(&self, ticket: u64, dataset: Dataset) -> bool {
        let mut current = self.dataset.write().await;
        if !self.loads.is_current(ticket) {
            info!(
                "discarding stale load {ticket} (latest is {})",
                self.loads.current()
            );
            return false;
        }
        info!(
            "applied load {ticket}: {} entities, {} branches",
            dataset.entity_count(),
            dataset.branch_names().len()
        );
        *current = Some(Arc::new(dataset));
        true
    }

    pub async fn snapshot(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().await.clone()
    }
}
