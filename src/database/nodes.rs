use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;

use super::{Database, NodeStore, StoreError};

#[async_trait]
impl NodeStore for Database {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT value FROM store_nodes WHERE path = $1")
                .bind(path)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.map(|(Json(value),)| value))
    }

    async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let prefix = format!("{}/", parent);
        let rows: Vec<(String, Json<Value>)> = sqlx::query_as(
            r#"
            SELECT path, value FROM store_nodes
            WHERE starts_with(path, $1) AND strpos(substr(path, length($1) + 1), '/') = 0
            ORDER BY path
            "#,
        )
        .bind(&prefix)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(path, Json(value))| {
                path.strip_prefix(&prefix).map(|key| (key.to_string(), value))
            })
            .collect())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO store_nodes (path, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (path)
            DO UPDATE SET value = $2, updated_at = NOW()
            "#,
        )
        .bind(path)
        .bind(Json(value))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO store_nodes (path, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (path)
            DO UPDATE SET value = store_nodes.value || $2, updated_at = NOW()
            "#,
        )
        .bind(path)
        .bind(Json(partial))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM store_nodes WHERE path = $1")
            .bind(path)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
