use crate::services::storage::ObjectStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Builds a connected [`ObjectStore`].
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>>;
}

/// Process-wide, lazily connected object store shared by all requests.
///
/// The first `acquire` connects; later calls reuse the client. A failed
/// connect is not remembered, so the next request tries again.
pub struct StoreHandle {
    connector: Arc<dyn StoreConnector>,
    store: RwLock<Option<Arc<dyn ObjectStore>>>,
    // Mirrors `store.is_some()` without waiting on a connect in flight.
    ready: AtomicBool,
}

impl StoreHandle {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            connector,
            store: RwLock::new(None),
            ready: AtomicBool::new(false),
        }
    }

    pub async fn acquire(&self) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.store.read().await.as_ref() {
            return Ok(store.clone());
        }

        let mut slot = self.store.write().await;
        // Another request may have connected while we waited for the lock.
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }

        let store = self.connector.connect().await?;
        tracing::info!("Object store client initialized");
        *slot = Some(store.clone());
        self.ready.store(true, Ordering::Release);
        Ok(store)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Drops the shared client. A later `acquire` reconnects.
    pub async fn teardown(&self) {
        let mut slot = self.store.write().await;
        self.ready.store(false, Ordering::Release);
        if slot.take().is_some() {
            tracing::info!("Object store client released");
        }
    }
}
