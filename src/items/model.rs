use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Owned resource. `owner_id` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; there is no `owner_id` field.
///
/// `description` distinguishes an absent key (`None`, keep) from an explicit
/// `null` (`Some(None)`, clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

impl Item {
    pub fn merged(&self, update: &ItemUpdate) -> Item {
        Item {
            id: self.id,
            owner_id: self.owner_id,
            title: update.title.clone().unwrap_or_else(|| self.title.clone()),
            description: match &update.description {
                Some(description) => description.clone(),
                None => self.description.clone(),
            },
            created_at: self.created_at,
        }
    }
}
