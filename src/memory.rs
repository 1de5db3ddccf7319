//! In-memory stores backing the test suite.

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::gate::OwnerScope;
use crate::items::model::{Item, ItemCreate};
use crate::items::repo::ItemStore;
use crate::users::model::{NewUser, User};
use crate::users::repo::{DuplicateEmail, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DuplicateEmail.into());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            hashed_password: user.hashed_password,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(DuplicateEmail.into());
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| anyhow!("no such user"))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn list(&self, skip: i64, limit: i64) -> anyhow::Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<Item>>,
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Item>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, scope: OwnerScope, skip: i64, limit: i64) -> anyhow::Result<Vec<Item>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|i| scope.includes(i.owner_id))
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, scope: OwnerScope) -> anyhow::Result<i64> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|i| scope.includes(i.owner_id))
            .count() as i64)
    }

    async fn insert(&self, owner_id: Uuid, item: ItemCreate) -> anyhow::Result<Item> {
        let item = Item {
            id: Uuid::new_v4(),
            owner_id,
            title: item.title,
            description: item.description,
            created_at: OffsetDateTime::now_utc(),
        };
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn update(&self, item: &Item) -> anyhow::Result<Item> {
        let mut items = self.items.write().await;
        let slot = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| anyhow!("no such item"))?;
        *slot = item.clone();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.items.write().await.retain(|i| i.id != id);
        Ok(())
    }
}
