//! Time series store access.
//!
//! This module provides the store interface consumed by the schema
//! initializer and the loops, plus an in-process implementation.

use std::sync::Arc;

pub mod aggregator;
pub mod backend;
pub mod memory;

// Re-export commonly used types
pub use backend::TimeSeriesStore;
pub use memory::MemoryStore;

/// Shared handle to a store.
///
/// Acquired once at startup and handed to the schema initializer and every
/// loop. The underlying connection is released when the last clone is dropped.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<dyn TimeSeriesStore>,
}

impl StoreHandle {
    /// Wrap any store implementation.
    pub fn new<S: TimeSeriesStore + 'static>(store: S) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Handle backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Get the store for use by a component.
    pub fn as_backend(&self) -> Arc<dyn TimeSeriesStore> {
        Arc::clone(&self.inner)
    }
}

impl From<Arc<dyn TimeSeriesStore>> for StoreHandle {
    fn from(inner: Arc<dyn TimeSeriesStore>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("references", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod store_handle_tests {
    use super::*;

    #[test]
    fn test_handle_clones_share_store() {
        let handle = StoreHandle::in_memory();
        let other = handle.clone();
        assert_eq!(Arc::strong_count(&handle.inner), 2);

        drop(other);
        assert_eq!(Arc::strong_count(&handle.inner), 1);
    }
}
