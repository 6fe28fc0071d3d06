use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::model::{IdGenerator, Resource, ResourceId, ResourceKind, Status};
use crate::store::traits::{ResourceFilter, ResourceStore, StatusStore, Store};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS resources (
        id BIGINT PRIMARY KEY,
        kind TEXT NOT NULL,
        account TEXT NOT NULL DEFAULT '',
        parent_ids TEXT[] NOT NULL DEFAULT '{}',
        document JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS resources_kind_account_idx ON resources (kind, account)",
    "CREATE INDEX IF NOT EXISTS resources_parent_ids_idx ON resources USING GIN (parent_ids)",
];

/// Every kind shares one `resources` table; the typed document lives in a
/// JSONB column next to the columns listings filter on.
#[derive(Debug)]
pub struct PostgresStore {
    pool: PgPool,
    ids: IdGenerator,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self {
            pool,
            ids: IdGenerator::new(),
        })
    }

    /// Create the schema if it is not there yet. Safe to run on every boot.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to apply resources schema")?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Ids live in a BIGINT column; anything past `i64::MAX` is refused.
fn db_id(id: ResourceId) -> Result<i64> {
    i64::try_from(id.value()).with_context(|| format!("id {} does not fit in BIGINT", id))
}

fn parent_columns(resource: &Resource) -> Vec<String> {
    resource
        .parent_ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

fn decode(kind: ResourceKind, document: Value) -> Result<Resource> {
    Resource::from_value(kind, document)
        .with_context(|| format!("Failed to deserialize stored {}", kind))
}

fn decode_row(kind: ResourceKind, row: Option<sqlx::postgres::PgRow>) -> Result<Option<Resource>> {
    let Some(row) = row else {
        return Ok(None);
    };
    let document: Value = row.try_get("document").context("Missing document column")?;
    decode(kind, document).map(Some)
}

#[async_trait::async_trait]
impl ResourceStore for PostgresStore {
    async fn next_id(&self) -> Result<ResourceId> {
        Ok(self.ids.next_id())
    }

    async fn insert_resources(&self, resources: Vec<Resource>) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for resource in &resources {
            let document = resource
                .to_value()
                .context("Failed to serialize resource")?;
            sqlx::query(
                "INSERT INTO resources (id, kind, account, parent_ids, document) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(db_id(resource.id())?)
            .bind(resource.kind().name())
            .bind(resource.account())
            .bind(parent_columns(resource))
            .bind(document)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert {} {}", resource.kind(), resource.id()))?;
        }

        tx.commit().await.context("Failed to commit resources")?;
        Ok(())
    }

    async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<Resource>> {
        let row = sqlx::query("SELECT document FROM resources WHERE kind = $1 AND id = $2")
            .bind(kind.name())
            .bind(db_id(id)?)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch resource")?;

        decode_row(kind, row)
    }

    async fn list_resources(&self, kind: ResourceKind, filter: &ResourceFilter) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM resources
            WHERE kind = $1
              AND ($2::TEXT IS NULL OR account = $2)
              AND ($3::TEXT IS NULL OR $3 = ANY(parent_ids))
            ORDER BY id
            "#,
        )
        .bind(kind.name())
        .bind(filter.account.clone())
        .bind(filter.parent.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list resources")?;

        rows.into_iter()
            .map(|row| {
                let document: Value = row.try_get("document").context("Missing document column")?;
                decode(kind, document)
            })
            .collect()
    }

    async fn replace_spec(&self, resource: Resource) -> Result<Option<Resource>> {
        let document = resource
            .to_value()
            .context("Failed to serialize resource")?;

        let row = sqlx::query(
            r#"
            UPDATE resources
            SET document = jsonb_set($3::jsonb, '{status}', COALESCE(document->'status', '{}'::jsonb)),
                account = $4,
                parent_ids = $5
            WHERE kind = $1 AND id = $2
            RETURNING document
            "#,
        )
        .bind(resource.kind().name())
        .bind(db_id(resource.id())?)
        .bind(document)
        .bind(resource.account())
        .bind(parent_columns(&resource))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to replace resource")?;

        decode_row(resource.kind(), row)
    }
}

#[async_trait::async_trait]
impl StatusStore for PostgresStore {
    async fn replace_status(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        status: Status,
    ) -> Result<Option<Resource>> {
        let status = serde_json::to_value(&status).context("Failed to serialize status")?;

        let row = sqlx::query(
            r#"
            UPDATE resources
            SET document = jsonb_set(document, '{status}', $3::jsonb)
            WHERE kind = $1 AND id = $2
            RETURNING document
            "#,
        )
        .bind(kind.name())
        .bind(db_id(id)?)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to replace status")?;

        decode_row(kind, row)
    }
}

impl Store for PostgresStore {}
