use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{Item, ItemCreate};
use crate::auth::gate::OwnerScope;

/// Persistence for items. Owner scoping is applied inside the query, never after it.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Item>>;
    async fn list(&self, scope: OwnerScope, skip: i64, limit: i64) -> anyhow::Result<Vec<Item>>;
    async fn count(&self, scope: OwnerScope) -> anyhow::Result<i64>;
    async fn insert(&self, owner_id: Uuid, item: ItemCreate) -> anyhow::Result<Item>;
    async fn update(&self, item: &Item) -> anyhow::Result<Item>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgItemStore {
    db: PgPool,
}

impl PgItemStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, owner_id, title, description, created_at
              FROM items
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get item")?;
        Ok(item)
    }

    async fn list(&self, scope: OwnerScope, skip: i64, limit: i64) -> anyhow::Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, owner_id, title, description, created_at
              FROM items
             WHERE ($1::uuid IS NULL OR owner_id = $1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(scope.owner())
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.db)
        .await
        .context("list items")?;
        Ok(rows)
    }

    async fn count(&self, scope: OwnerScope) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
              FROM items
             WHERE ($1::uuid IS NULL OR owner_id = $1)
            "#,
        )
        .bind(scope.owner())
        .fetch_one(&self.db)
        .await
        .context("count items")?;
        Ok(count)
    }

    async fn insert(&self, owner_id: Uuid, item: ItemCreate) -> anyhow::Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, owner_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, title, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&item.title)
        .bind(&item.description)
        .fetch_one(&self.db)
        .await
        .context("insert item")?;
        Ok(item)
    }

    async fn update(&self, item: &Item) -> anyhow::Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
               SET title = $2, description = $3
             WHERE id = $1
            RETURNING id, owner_id, title, description, created_at
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .fetch_one(&self.db)
        .await
        .context("update item")?;
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete item")?;
        Ok(())
    }
}
