//! Message storage and the send resolver.

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::conversation;
use crate::error::DatabaseError;
use crate::item;
use crate::models::{Conversation, Message};
use crate::validation::{self, ValidationError};

/// How many messages a thread view returns.
pub const MESSAGE_PAGE_SIZE: i64 = 20;

/// A message to be sent, addressed by conversation or by item.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub conversation_id: Option<String>,
    pub item_id: Option<String>,
    pub text: String,
}

/// Ways sending a message can fail.
#[derive(Debug, Error)]
pub enum SendError {
    /// The text failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A seller tried to open a conversation on their own item.
    #[error("you cannot message yourself about your own item")]
    SelfContact,

    /// Neither a conversation nor an item was addressed.
    #[error("conversationId or itemId is required")]
    MissingTarget,

    /// Storage failure, including absent conversations and items.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Send a message, creating the conversation on first contact.
///
/// Exactly one conversation row is mutated and one message row inserted per
/// successful send. The receiver is the counterparty of the conversation.
pub async fn send_message(
    pool: &SqlitePool,
    sender_id: &str,
    outgoing: &OutgoingMessage,
) -> Result<(Conversation, Message), SendError> {
    let text = validation::validate_message_text(&outgoing.text)?;

    let conversation = if let Some(conversation_id) = &outgoing.conversation_id {
        conversation::find_for_participant(pool, conversation_id, sender_id).await?
    } else if let Some(item_id) = &outgoing.item_id {
        let seller_id = item::get_seller_id(pool, item_id).await?;
        if seller_id == sender_id {
            return Err(SendError::SelfContact);
        }
        conversation::find_or_create(pool, item_id, sender_id, &seller_id).await?
    } else {
        return Err(SendError::MissingTarget);
    };

    let receiver_id = if conversation.buyer_id == sender_id {
        conversation.seller_id.clone()
    } else {
        conversation.buyer_id.clone()
    };

    let message = Message {
        id: Uuid::new_v4().to_string(),
        conversation_id: conversation.id.clone(),
        sender_id: sender_id.to_string(),
        receiver_id,
        text,
        created_at: crate::now_utc(),
    };

    insert_message(pool, &message).await?;
    conversation::touch(pool, &conversation.id, &message.text, &message.created_at).await?;

    tracing::debug!(
        conversation = %conversation.id,
        sender = %message.sender_id,
        "message stored"
    );

    Ok((conversation, message))
}

/// Insert a message row.
async fn insert_message(pool: &SqlitePool, message: &Message) -> crate::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, receiver_id, text, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.id)
    .bind(&message.conversation_id)
    .bind(&message.sender_id)
    .bind(&message.receiver_id)
    .bind(&message.text)
    .bind(&message.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recent `limit` messages of a conversation, oldest first.
pub async fn list_recent(
    pool: &SqlitePool,
    conversation_id: &str,
    limit: i64,
) -> crate::Result<Vec<Message>> {
    let mut messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_id, receiver_id, text, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(conversation_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    messages.reverse();
    Ok(messages)
}
