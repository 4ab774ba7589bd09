use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Store, StoreResult, Table};

/// In-memory store, used for tests and for runs without a data directory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables currently held.
    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, table: Table) -> StoreResult<Option<String>> {
        Ok(self.tables.read().await.get(&table).cloned())
    }

    async fn write(&self, table: Table, blob: &str) -> StoreResult<()> {
        self.tables.write().await.insert(table, blob.to_string());
        Ok(())
    }

    async fn remove(&self, table: Table) -> StoreResult<()> {
        self.tables.write().await.remove(&table);
        Ok(())
    }
}
