use std::fmt::{Debug, Display};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PersistenceWriteFailure, RepositoryError};
use crate::store::{self, Store, Table};

// =============================================================================
// 1. THE ABSTRACTION (Entity trait with update and action hooks)
// =============================================================================

/// Trait that any persisted entity implements to live in a [`Collection`].
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Id: PartialEq + Clone + Send + Sync + Display + Debug;
    type Patch: Send + Debug;
    type Action: Send + Debug;
    type ActionResult: Send + Debug;

    /// Table the collection is persisted under.
    const TABLE: Table;

    fn id(&self) -> &Self::Id;

    /// Error reported when `id` does not resolve.
    fn not_found(id: &Self::Id) -> RepositoryError;

    /// Apply a partial update. Runs on a copy; an error discards the copy.
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), RepositoryError>;

    /// Handle a domain-specific state transition. Runs on a copy; an error
    /// discards the copy.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, RepositoryError>;
}

// =============================================================================
// 2. THE ORDERED COLLECTION
// =============================================================================

/// Ordered, id-addressed sequence of entities with its own id generator.
///
/// Insertion order is preserved as stored; callers choose `push_front` for
/// newest-first tables.
pub struct Collection<T: Entity> {
    items: Vec<T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> Collection<T> {
    pub fn new(items: Vec<T>, next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static) -> Self {
        Self {
            items,
            next_id_fn: Box::new(next_id_fn),
        }
    }

    /// Loads the stored items, or `default` if the table is absent or corrupt.
    pub async fn load(store: &dyn Store, default: Vec<T>) -> Vec<T> {
        store::load_or(store, T::TABLE, default).await
    }

    pub async fn persist(&self, store: &dyn Store, attempts: u32) -> Result<(), PersistenceWriteFailure> {
        store::save(store, T::TABLE, &self.items, attempts).await
    }

    pub fn next_id(&self) -> T::Id {
        (self.next_id_fn)()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Defensive copy of the whole collection in stored order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn push_front(&mut self, item: T) {
        self.items.insert(0, item);
    }

    pub fn push_back(&mut self, item: T) {
        self.items.push(item);
    }

    /// Applies `patch` to a copy of the entity and swaps the copy in only if
    /// the hook succeeds. Returns the updated entity.
    pub fn update(&mut self, id: &T::Id, patch: T::Patch) -> Result<T, RepositoryError> {
        let slot = self.slot_mut(id)?;
        let mut candidate = slot.clone();
        candidate.on_update(patch)?;
        *slot = candidate.clone();
        Ok(candidate)
    }

    /// Runs `action` against a copy of the entity and swaps the copy in only
    /// if the handler succeeds.
    pub fn perform(&mut self, id: &T::Id, action: T::Action) -> Result<T::ActionResult, RepositoryError> {
        let slot = self.slot_mut(id)?;
        let mut candidate = slot.clone();
        let result = candidate.handle_action(action)?;
        *slot = candidate;
        Ok(result)
    }

    fn slot_mut(&mut self, id: &T::Id) -> Result<&mut T, RepositoryError> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| T::not_found(id))
    }
}

// =============================================================================
// 3. TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: String,
        label: String,
        value: u32,
        locked: bool,
    }

    #[derive(Debug)]
    struct CounterPatch {
        label: Option<String>,
        value: Option<u32>,
    }

    #[derive(Debug)]
    enum CounterAction {
        Lock,
    }

    impl Entity for Counter {
        type Id = String;
        type Patch = CounterPatch;
        type Action = CounterAction;
        type ActionResult = bool;

        const TABLE: Table = Table::Requests;

        fn id(&self) -> &String {
            &self.id
        }

        fn not_found(id: &String) -> RepositoryError {
            RepositoryError::RequestNotFound(id.clone())
        }

        fn on_update(&mut self, patch: CounterPatch) -> Result<(), RepositoryError> {
            // Label is written first so a later failure proves the copy is discarded.
            if let Some(label) = patch.label {
                self.label = label;
            }
            if let Some(value) = patch.value {
                if value > 100 {
                    return Err(RepositoryError::ValidationError("too large".to_string()));
                }
                self.value = value;
            }
            Ok(())
        }

        fn handle_action(&mut self, action: CounterAction) -> Result<bool, RepositoryError> {
            match action {
                CounterAction::Lock => {
                    if self.locked {
                        Ok(false)
                    } else {
                        self.locked = true;
                        Ok(true)
                    }
                }
            }
        }
    }

    fn counter(id: &str) -> Counter {
        Counter {
            id: id.to_string(),
            label: "initial".to_string(),
            value: 0,
            locked: false,
        }
    }

    fn collection() -> Collection<Counter> {
        let next = Arc::new(AtomicU64::new(1));
        Collection::new(vec![counter("c_a")], move || {
            format!("c_{}", next.fetch_add(1, Ordering::SeqCst))
        })
    }

    #[test]
    fn test_next_id_uses_generator() {
        let items = collection();
        assert_eq!(items.next_id(), "c_1");
        assert_eq!(items.next_id(), "c_2");
    }

    #[test]
    fn test_push_front_orders_newest_first() {
        let mut items = collection();
        items.push_front(counter("c_b"));
        items.push_back(counter("c_z"));

        let ids: Vec<String> = items.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["c_b", "c_a", "c_z"]);
    }

    #[test]
    fn test_failed_update_leaves_entity_untouched() {
        let mut items = collection();
        let patch = CounterPatch {
            label: Some("changed".to_string()),
            value: Some(500),
        };

        let err = items.update(&"c_a".to_string(), patch).unwrap_err();

        assert!(matches!(err, RepositoryError::ValidationError(_)));
        assert_eq!(items.get(&"c_a".to_string()), Some(&counter("c_a")));
    }

    #[test]
    fn test_update_unknown_id_reports_not_found() {
        let mut items = collection();
        let patch = CounterPatch { label: None, value: None };
        assert_eq!(
            items.update(&"missing".to_string(), patch),
            Err(RepositoryError::RequestNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_action_is_applied_once() {
        let mut items = collection();
        let id = "c_a".to_string();

        assert_eq!(items.perform(&id, CounterAction::Lock), Ok(true));
        assert_eq!(items.perform(&id, CounterAction::Lock), Ok(false));
        assert!(items.get(&id).map(|c| c.locked).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let store = MemoryStore::new();
        let mut items = collection();
        items.push_front(counter("c_b"));
        items.persist(&store, 1).await.unwrap();

        let loaded = Collection::<Counter>::load(&store, Vec::new()).await;
        assert_eq!(loaded, items.snapshot());
    }
}
