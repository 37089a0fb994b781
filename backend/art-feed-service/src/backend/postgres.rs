//! Postgres-backed document store.
//!
//! Documents live as JSONB rows in a single `documents` table keyed by
//! `(collection, id)`; `seq` preserves insertion order for listings.

use super::{apply_updates, DocumentStore, FieldUpdate, Snapshot};
use crate::config::DatabaseConfig;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Create a PostgreSQL connection pool and verify it answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        "Creating database pool: max={}, min={}, acquire_timeout={}s, verify_timeout={}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
        config.connect_timeout_secs
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!("Database pool created and verified successfully");
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

/// Apply the bundled schema migrations
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn snapshots(rows: Vec<(String, Json<Value>)>) -> Vec<Snapshot> {
        rows.into_iter()
            .map(|(id, Json(data))| Snapshot {
                id,
                data: Some(data),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn add(&self, collection: &str, data: Value) -> ServiceResult<String> {
        if !data.is_object() {
            return Err(ServiceError::InvalidInput("document body is not an object".to_string()));
        }

        let id = Uuid::new_v4().simple().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> ServiceResult<Snapshot> {
        let data: Option<Json<Value>> = sqlx::query_scalar(
            r#"
            SELECT data FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Snapshot {
            id: id.to_string(),
            data: data.map(|Json(value)| value),
        })
    }

    async fn list(&self, collection: &str) -> ServiceResult<Vec<Snapshot>> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1
            ORDER BY seq
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(Self::snapshots(rows))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> ServiceResult<Vec<Snapshot>> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data -> $2 = $3
            ORDER BY seq
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(Json(value))
        .fetch_all(&self.pool)
        .await?;

        Ok(Self::snapshots(rows))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Json<Value>> = sqlx::query_scalar(
            r#"
            SELECT data FROM documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Json(mut data) =
            current.ok_or_else(|| ServiceError::NotFound(format!("{}/{}", collection, id)))?;
        apply_updates(&mut data, &updates)?;

        sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> ServiceResult<()> {
        sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
