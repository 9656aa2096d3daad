use super::Database;
use sqlx::Error as SqlxError;

impl Database {
    /// Run database migrations to create tables
    pub(super) async fn run_migrations(&self) -> Result<(), SqlxError> {
        self.create_node_tables().await?;
        Ok(())
    }

    async fn create_node_tables(&self) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_nodes (
                path TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool())
        .await?;

        // Children are listed by path prefix
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS store_nodes_path_prefix
                ON store_nodes (path text_pattern_ops)
            "#,
        )
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
