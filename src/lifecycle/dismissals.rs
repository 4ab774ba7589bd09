use std::collections::{BTreeMap, BTreeSet};

use crate::error::PersistenceWriteFailure;
use crate::store::{self, Store, Table};

/// Requests each donor chose to ignore. Hiding a request from one donor never
/// touches the shared request record.
#[derive(Debug, Default)]
pub struct Dismissals {
    by_user: BTreeMap<String, BTreeSet<String>>,
}

impl Dismissals {
    pub async fn load(store: &dyn Store) -> Self {
        Self {
            by_user: store::load_or(store, Table::Dismissals, BTreeMap::new()).await,
        }
    }

    pub async fn persist(&self, store: &dyn Store, attempts: u32) -> Result<(), PersistenceWriteFailure> {
        store::save(store, Table::Dismissals, &self.by_user, attempts).await
    }

    /// Records the dismissal. Returns `false` if it was already recorded.
    pub fn insert(&mut self, user_id: &str, request_id: &str) -> bool {
        self.by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(request_id.to_string())
    }

    pub fn contains(&self, user_id: &str, request_id: &str) -> bool {
        self.by_user
            .get(user_id)
            .map(|ids| ids.contains(request_id))
            .unwrap_or(false)
    }
}
