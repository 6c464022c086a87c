use opskins::{RawItem, SteamId};
use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

const IMAGE_SIZE: &str = "600px";

/// Cache key for an inventory. The bot's own slot is a separate variant, so
/// no user id can ever collide with it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnerId {
    Bot,
    User(SteamId),
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Bot => f.write_str("bot"),
            OwnerId::User(id) => write!(f, "user {id}"),
        }
    }
}

/// Immutable view of one tradable item, as shown to sessions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InventoryItem {
    pub id: String,
    pub category: String,
    pub name: String,
    pub image_url: String,
    pub color: String,
    pub price: i64,
}

impl From<RawItem> for InventoryItem {
    fn from(item: RawItem) -> Self {
        Self {
            id: item.id,
            category: item.category,
            name: item.name,
            image_url: item.image.get(IMAGE_SIZE).cloned().unwrap_or_default(),
            color: item.color,
            price: item.suggested_price,
        }
    }
}

/// A full inventory listing for one owner at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct InventorySnapshot {
    pub owner: OwnerId,
    pub items: Vec<InventoryItem>,
    pub fetched_at: OffsetDateTime,
}

impl InventorySnapshot {
    pub fn new(owner: OwnerId, items: Vec<InventoryItem>) -> Self {
        Self {
            owner,
            items,
            fetched_at: OffsetDateTime::now_utc(),
        }
    }
}
