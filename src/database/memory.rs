use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{NodeStore, StoreError, merge_shallow};

/// Node store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: DashMap<String, Value>,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make every delete fail as if the database went away
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.nodes.get(path).map(|node| node.value().clone()))
    }

    async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let prefix = format!("{}/", parent);
        let mut children: Vec<(String, Value)> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let key = node.key().strip_prefix(&prefix)?;
                (!key.contains('/')).then(|| (key.to_string(), node.value().clone()))
            })
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.nodes.insert(path.to_string(), value);
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> Result<(), StoreError> {
        self.nodes
            .entry(path.to_string())
            .and_modify(|node| merge_shallow(node, partial.clone()))
            .or_insert(partial);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.nodes.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("config").await.unwrap(), None);

        store.set("config", json!({ "enabled": true })).await.unwrap();
        assert_eq!(store.get("config").await.unwrap(), Some(json!({ "enabled": true })));

        store.delete("config").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_or_creates() {
        let store = MemoryStore::new();
        store.update("config", json!({ "enabled": false })).await.unwrap();
        store.update("config", json!({ "lastRoleIndexUsed": 1 })).await.unwrap();

        assert_eq!(
            store.get("config").await.unwrap(),
            Some(json!({ "enabled": false, "lastRoleIndexUsed": 1 }))
        );
    }

    #[tokio::test]
    async fn test_children_lists_direct_descendants_only() {
        let store = MemoryStore::new();
        store.set("data/2", json!(2)).await.unwrap();
        store.set("data/1", json!(1)).await.unwrap();
        store.set("data/1/nested", json!(3)).await.unwrap();
        store.set("database", json!(4)).await.unwrap();

        let children = store.children("data").await.unwrap();
        assert_eq!(
            children,
            vec![("1".to_string(), json!(1)), ("2".to_string(), json!(2))]
        );
    }
}
