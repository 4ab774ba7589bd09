//! Durable key/value blob storage keyed by logical table name.
//!
//! The [`Store`] trait is the only component that touches the storage medium.
//! Tables are stored as JSON blobs; [`load_or`] and [`save`] add the typed,
//! failure-tolerant layer the repository uses.

mod error;
mod file;
mod memory;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::PersistenceWriteFailure;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Delay unit between write attempts; attempt `n` waits `n` units.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Logical tables held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Users,
    Requests,
    History,
    Dismissals,
    Session,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Requests,
        Table::History,
        Table::Dismissals,
        Table::Session,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Requests => "requests",
            Table::History => "history",
            Table::Dismissals => "dismissals",
            Table::Session => "session",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw blob storage.
///
/// Implementations must tolerate concurrent calls. A missing table is
/// `Ok(None)`, never an error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn read(&self, table: Table) -> StoreResult<Option<String>>;

    async fn write(&self, table: Table, blob: &str) -> StoreResult<()>;

    /// Removing a missing table is a no-op.
    async fn remove(&self, table: Table) -> StoreResult<()>;
}

/// Loads and decodes a table, substituting `default` when the table is
/// absent, unreadable or malformed. Failures are logged, never returned.
pub async fn load_or<T: DeserializeOwned>(store: &dyn Store, table: Table, default: T) -> T {
    match store.read(table).await {
        Ok(Some(blob)) => match serde_json::from_str(&blob) {
            Ok(value) => {
                debug!(%table, "Table loaded");
                value
            }
            Err(e) => {
                let reason = StoreError::Corrupt(e.to_string());
                warn!(%table, error = %reason, "Stored table unreadable, using default");
                default
            }
        },
        Ok(None) => {
            debug!(%table, "Table absent, using default");
            default
        }
        Err(e) => {
            warn!(%table, error = %e, "Failed to read table, using default");
            default
        }
    }
}

/// Encodes and writes a table, retrying up to `attempts` times.
pub async fn save<T: Serialize + ?Sized>(
    store: &dyn Store,
    table: Table,
    value: &T,
    attempts: u32,
) -> Result<(), PersistenceWriteFailure> {
    let blob = serde_json::to_string(value).map_err(|e| PersistenceWriteFailure {
        table,
        source: StoreError::Serialization(e.to_string()),
    })?;
    write_with_retry(store, table, WriteOp::Write(&blob), attempts).await
}

/// Removes a table, retrying up to `attempts` times.
pub async fn remove(store: &dyn Store, table: Table, attempts: u32) -> Result<(), PersistenceWriteFailure> {
    write_with_retry(store, table, WriteOp::Remove, attempts).await
}

#[derive(Debug, Clone, Copy)]
enum WriteOp<'a> {
    Write(&'a str),
    Remove,
}

async fn write_with_retry(
    store: &dyn Store,
    table: Table,
    op: WriteOp<'_>,
    attempts: u32,
) -> Result<(), PersistenceWriteFailure> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = match op {
            WriteOp::Write(blob) => store.write(table, blob).await,
            WriteOp::Remove => store.remove(table).await,
        };
        match result {
            Ok(()) => {
                debug!(%table, attempt, "Table written");
                return Ok(());
            }
            Err(source) if attempt < attempts => {
                warn!(%table, attempt, error = %source, "Write failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(source) => {
                error!(%table, attempts, error = %source, "Write failed, giving up");
                return Err(PersistenceWriteFailure { table, source });
            }
        }
    }
}
