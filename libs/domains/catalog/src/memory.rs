//! Map-backed storage shared by the in-memory repositories.

use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Anything stored under an `_id`.
pub trait Identified {
    fn id(&self) -> ObjectId;
}

#[derive(Debug)]
pub struct MemoryCollection<T> {
    records: Arc<RwLock<HashMap<ObjectId, T>>>,
}

impl<T> Clone for MemoryCollection<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Identified + Clone> MemoryCollection<T> {
    pub async fn insert(&self, record: T) -> T {
        self.records.write().await.insert(record.id(), record.clone());
        record
    }

    pub async fn get(&self, id: ObjectId) -> Option<T> {
        self.records.read().await.get(&id).cloned()
    }

    /// Replaces an existing record; `None` when the id is unknown.
    pub async fn replace(&self, record: T) -> Option<T> {
        let mut records = self.records.write().await;
        let slot = records.get_mut(&record.id())?;
        *slot = record.clone();
        Some(record)
    }

    pub async fn remove(&self, id: ObjectId) -> Option<T> {
        self.records.write().await.remove(&id)
    }

    pub async fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .read()
            .await
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}
