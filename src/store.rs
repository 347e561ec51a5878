use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory record store with sequentially assigned ids.
///
/// Ids start at 1 and are never reused within a process lifetime, deletes
/// included. Reads return clones of the stored records; iteration order is
/// ascending id order.
pub struct MemoryStore<T> {
    inner: RwLock<StoreInner<T>>,
}

struct StoreInner<T> {
    records: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Insert a new record built from the id assigned to it.
    pub async fn create(&self, build: impl FnOnce(u64) -> T) -> T {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let record = build(id);
        inner.records.insert(id, record.clone());
        record
    }

    pub async fn get(&self, id: u64) -> Option<T> {
        self.inner.read().await.records.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<T> {
        self.inner.read().await.records.values().cloned().collect()
    }

    /// First record matching the predicate, in id order.
    pub async fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let inner = self.inner.read().await;
        for record in inner.records.values() {
            if pred(record) {
                return Some(record.clone());
            }
        }
        None
    }

    /// Apply an in-place update and return the new value. The id itself is
    /// not part of the record the closure can reach, so it cannot change.
    pub async fn update(&self, id: u64, apply: impl FnOnce(&mut T)) -> Option<T> {
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(&id)?;
        apply(record);
        Some(record.clone())
    }

    /// Remove a record, returning the value it held.
    pub async fn delete(&self, id: u64) -> Option<T> {
        self.inner.write().await.records.remove(&id)
    }
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
