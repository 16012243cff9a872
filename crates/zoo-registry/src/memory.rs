//! In-memory entity registry. State lives for the process lifetime only.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use zoo_types::{Animal, EntityRegistry, NewAnimal, RegistryError};

struct RegistryState {
    /// Next id handed out by `create`; always greater than every stored id.
    next_id: i64,
    animals: BTreeMap<i64, Animal>,
}

/// In-memory implementation of EntityRegistry.
/// The map and the id counter share one lock so allocation and insert happen atomically.
pub struct InMemoryEntityRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryEntityRegistry {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                next_id: 1,
                animals: BTreeMap::new(),
            })),
        }
    }

    /// Number of stored animals.
    pub async fn len(&self) -> usize {
        self.state.read().await.animals.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryEntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntityRegistry for InMemoryEntityRegistry {
    async fn create(&self, animal: NewAnimal) -> Result<Animal, RegistryError> {
        let mut guard = self.state.write().await;
        let id = guard.next_id;
        guard.next_id = id
            .checked_add(1)
            .ok_or_else(|| RegistryError::Other("animal id space exhausted".to_string()))?;
        let animal = animal.with_id(id);
        guard.animals.insert(id, animal.clone());
        tracing::debug!(id, "animal created");
        Ok(animal)
    }

    async fn get(&self, id: i64) -> Result<Option<Animal>, RegistryError> {
        let guard = self.state.read().await;
        Ok(guard.animals.get(&id).cloned())
    }

    async fn update(&self, animal: Animal) -> Result<Animal, RegistryError> {
        let mut guard = self.state.write().await;
        if animal.id >= guard.next_id {
            // Upsert past the counter: keep future creates from reusing this id.
            guard.next_id = animal.id.saturating_add(1);
        }
        let previous = guard.animals.insert(animal.id, animal.clone());
        if previous.is_none() {
            tracing::debug!(id = animal.id, "update inserted absent animal");
        }
        Ok(animal)
    }

    async fn delete(&self, id: i64) -> Result<Option<Animal>, RegistryError> {
        let mut guard = self.state.write().await;
        Ok(guard.animals.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lion() -> NewAnimal {
        NewAnimal {
            kind: "lion".to_string(),
            name: "Leo".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let reg = InMemoryEntityRegistry::new();
        let a = reg.create(lion()).await.unwrap();
        let b = reg.create(lion()).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(reg.len().await, 2);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let reg = InMemoryEntityRegistry::new();
        assert!(reg.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_then_get_is_none_and_id_not_reused() {
        let reg = InMemoryEntityRegistry::new();
        assert!(reg.is_empty().await);
        let a = reg.create(lion()).await.unwrap();
        assert!(!reg.is_empty().await);
        let removed = reg.delete(a.id).await.unwrap();
        assert_eq!(removed, Some(a.clone()));
        assert!(reg.is_empty().await);
        assert!(reg.get(a.id).await.unwrap().is_none());
        assert!(reg.delete(a.id).await.unwrap().is_none());
        let b = reg.create(lion()).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let reg = InMemoryEntityRegistry::new();
        let a = reg.create(lion()).await.unwrap();
        let updated = reg
            .update(Animal {
                id: a.id,
                kind: "tiger".to_string(),
                name: "Tess".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reg.get(a.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_absent_id_inserts_and_advances_counter() {
        let reg = InMemoryEntityRegistry::new();
        let inserted = Animal {
            id: 10,
            kind: "zebra".to_string(),
            name: "Zed".to_string(),
        };
        reg.update(inserted.clone()).await.unwrap();
        assert_eq!(reg.get(10).await.unwrap(), Some(inserted));
        let next = reg.create(lion()).await.unwrap();
        assert_eq!(next.id, 11);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let reg = Arc::new(InMemoryEntityRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move { reg.create(lion()).await.unwrap().id }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(reg.len().await, 32);
    }
}
