use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::Item;

#[derive(Debug, Serialize)]
pub struct ItemPublic {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<Item> for ItemPublic {
    fn from(i: Item) -> Self {
        Self {
            id: i.id,
            owner_id: i.owner_id,
            title: i.title,
            description: i.description,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsPublic {
    pub data: Vec<ItemPublic>,
    pub count: i64,
}
