use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::PartId;
use tokio::sync::RwLock;

use crate::{Part, PartStore, Result};

/// In-memory part store implementation for testing.
///
/// Holds the write lock across each stock mutation, giving it the same
/// atomicity the PostgreSQL implementation gets from a conditional UPDATE.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPartStore {
    parts: Arc<RwLock<HashMap<PartId, Part>>>,
}

impl InMemoryPartStore {
    /// Creates a new empty in-memory part store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given parts.
    pub async fn with_parts(parts: impl IntoIterator<Item = Part>) -> Self {
        let store = Self::new();
        {
            let mut map = store.parts.write().await;
            for part in parts {
                map.insert(part.id.clone(), part);
            }
        }
        store
    }

    /// Returns the number of parts stored.
    pub async fn part_count(&self) -> usize {
        self.parts.read().await.len()
    }

    /// Removes a part, simulating catalog deletion.
    pub async fn delete(&self, id: &PartId) {
        self.parts.write().await.remove(id);
    }

    /// Returns the current stock of a part, if it exists.
    pub async fn stock_of(&self, id: &PartId) -> Option<u32> {
        self.parts.read().await.get(id).map(|p| p.stock)
    }
}

#[async_trait]
impl PartStore for InMemoryPartStore {
    async fn get(&self, id: &PartId) -> Result<Option<Part>> {
        Ok(self.parts.read().await.get(id).cloned())
    }

    async fn get_many(&self, ids: &[PartId]) -> Result<HashMap<PartId, Part>> {
        let map = self.parts.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| map.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }

    async fn put(&self, part: Part) -> Result<()> {
        self.parts.write().await.insert(part.id.clone(), part);
        Ok(())
    }

    async fn deduct_stock_clamped(&self, id: &PartId, quantity: u32) -> Result<()> {
        let mut map = self.parts.write().await;
        if let Some(part) = map.get_mut(id) {
            part.stock = part.stock.saturating_sub(quantity);
        }
        Ok(())
    }

    async fn restock(&self, id: &PartId, quantity: u32) -> Result<()> {
        let mut map = self.parts.write().await;
        if let Some(part) = map.get_mut(id) {
            part.stock += quantity;
        }
        Ok(())
    }
}
