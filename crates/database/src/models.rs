//! Database models and API projections.
//!
//! Wire-facing structs serialize with camelCase field names, matching the
//! JSON contract the frontend consumes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Identity-provider subject, or `email_<millis>` for local accounts.
    pub uid: String,
    pub email: String,
    pub full_name: String,
    /// PHC-format Argon2 hash; only local accounts carry one.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
    pub hostel: Option<String>,
    pub year: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

/// An item row as stored; hydrated into [`ItemWithSeller`] for the API.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub is_available: bool,
    pub seller_id: String,
    pub created_at: String,
}

/// The seller slice embedded in catalog responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub id: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub hostel: Option<String>,
}

/// A listing with its images, tags, and seller projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWithSeller {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub is_available: bool,
    pub seller_id: String,
    pub seller: Option<SellerSummary>,
    pub created_at: String,
}

/// Offset-pagination summary for a catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
    pub has_more: bool,
}

impl Pagination {
    /// Build the summary for a page: `pages = ceil(total / limit)` and
    /// `has_more = page < pages`.
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            (total + i64::from(limit) - 1) / i64::from(limit)
        };
        Self {
            total,
            page,
            limit,
            pages,
            has_more: i64::from(page) < pages,
        }
    }
}

/// A conversation between a buyer and a seller about one item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Conversation {
    pub id: String,
    pub item_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    /// Denormalized text of the most recent message.
    pub last_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One chat line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: String,
}

/// The item slice embedded in inbox and thread responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    /// First listing image, if any.
    pub image: Option<String>,
    pub price: f64,
}

/// One inbox row: a conversation projected for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    pub conversation_id: String,
    pub item: ItemSummary,
    pub last_message: Option<String>,
    pub updated_at: String,
    pub other_user: SellerSummary,
}

/// Conversation header returned with a message thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHead {
    pub conversation_id: String,
    pub item: ItemSummary,
    pub other_user: SellerSummary,
}
