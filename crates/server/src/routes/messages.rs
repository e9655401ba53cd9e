//! Messaging routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use database::message::{self, OutgoingMessage};
use database::{conversation, ConversationHead, InboxEntry, Message};

use crate::error::Result;
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox).post(send))
        .route("/conversation/:id/messages", get(conversation_messages))
}

#[derive(Serialize)]
pub struct InboxResponse {
    pub success: bool,
    pub conversations: Vec<InboxEntry>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SendRequest {
    conversation_id: Option<String>,
    item_id: Option<String>,
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub conversation_id: String,
    pub message: Message,
}

#[derive(Serialize)]
pub struct ThreadResponse {
    pub success: bool,
    pub conversation: ConversationHead,
    pub messages: Vec<Message>,
}

/// All of the caller's conversations, newest activity first.
pub async fn inbox(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<InboxResponse>> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    let conversations = conversation::list_for_user(state.db.pool(), &user.id).await?;
    Ok(Json(InboxResponse {
        success: true,
        conversations,
    }))
}

/// Send a message, addressed by conversation or by item. First contact on
/// an item creates the conversation.
pub async fn send(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<SendResponse>)> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    let outgoing = OutgoingMessage {
        conversation_id: request.conversation_id,
        item_id: request.item_id,
        text: request.text,
    };
    let (conversation, message) =
        message::send_message(state.db.pool(), &user.id, &outgoing).await?;

    Ok((
        StatusCode::CREATED,
        Json(SendResponse {
            success: true,
            conversation_id: conversation.id,
            message,
        }),
    ))
}

/// The most recent messages of one conversation, oldest first, with the
/// conversation header. Participants only.
pub async fn conversation_messages(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ThreadResponse>> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    let conversation = conversation::thread_header(state.db.pool(), &id, &user.id).await?;
    let messages =
        message::list_recent(state.db.pool(), &id, message::MESSAGE_PAGE_SIZE).await?;

    Ok(Json(ThreadResponse {
        success: true,
        conversation,
        messages,
    }))
}
