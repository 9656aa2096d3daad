/// Database modules organized by feature
#[cfg(test)]
mod memory;
mod migrations;
mod nodes;

#[cfg(test)]
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tracing::info;

/// Path of the community configuration node
pub const CONFIG_PATH: &str = "config";
/// Parent of every birthday record node
pub const DATA_PATH: &str = "data";
/// Parent of every reminder node
pub const REMINDERS_PATH: &str = "reminders";

/// Node path of one child under `parent`
pub fn child_path(parent: &str, key: &str) -> String {
    format!("{}/{}", parent, key)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Path-keyed JSON tree that every record is persisted into
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Direct children of `parent` as `(key, value)` pairs
    async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow-merge `partial` into the node, creating it if absent
    async fn update(&self, path: &str, partial: Value) -> Result<(), StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Database connection pool wrapper
///
/// Handles all database operations for the bot
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("Database connected and migrations completed");
        Ok(db)
    }

    /// Get a reference to the connection pool (for internal use)
    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Shallow JSON merge: top-level keys of `partial` replace those of `base`
#[cfg(test)]
pub(crate) fn merge_shallow(base: &mut Value, partial: Value) {
    match (base, partial) {
        (Value::Object(base), Value::Object(partial)) => {
            for (key, value) in partial {
                base.insert(key, value);
            }
        }
        (base, partial) => *base = partial,
    }
}
