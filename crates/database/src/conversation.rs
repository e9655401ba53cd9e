//! Conversation storage operations.
//!
//! A conversation is scoped to exactly one (item, buyer, seller) triple and
//! is created lazily on first contact. The unique constraint on the triple
//! makes creation idempotent: losing a concurrent first-contact race means
//! reusing the row the winner inserted.

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, ConversationHead, InboxEntry, ItemSummary, SellerSummary};

const CONVERSATION_COLUMNS: &str =
    "id, item_id, buyer_id, seller_id, last_message, created_at, updated_at";

/// Get a conversation the given user participates in.
///
/// Absent rows and rows the user is no party to are indistinguishable.
pub async fn find_for_participant(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations \
         WHERE id = ? AND (buyer_id = ? OR seller_id = ?)"
    ))
    .bind(id)
    .bind(user_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Conversation",
        id: id.to_string(),
    })
}

/// Look up the conversation for an (item, buyer, seller) triple.
pub async fn find_by_triple(
    pool: &SqlitePool,
    item_id: &str,
    buyer_id: &str,
    seller_id: &str,
) -> Result<Option<Conversation>> {
    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations \
         WHERE item_id = ? AND buyer_id = ? AND seller_id = ?"
    ))
    .bind(item_id)
    .bind(buyer_id)
    .bind(seller_id)
    .fetch_optional(pool)
    .await?;

    Ok(conversation)
}

/// Get the conversation for a triple, creating it on first contact.
pub async fn find_or_create(
    pool: &SqlitePool,
    item_id: &str,
    buyer_id: &str,
    seller_id: &str,
) -> Result<Conversation> {
    if let Some(existing) = find_by_triple(pool, item_id, buyer_id, seller_id).await? {
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    let now = crate::now_utc();

    let inserted = sqlx::query(
        r#"
        INSERT INTO conversations (id, item_id, buyer_id, seller_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(item_id)
    .bind(buyer_id)
    .bind(seller_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {
            tracing::debug!(conversation = %id, item = %item_id, "conversation created");
            Ok(Conversation {
                id,
                item_id: item_id.to_string(),
                buyer_id: buyer_id.to_string(),
                seller_id: seller_id.to_string(),
                last_message: None,
                created_at: now.clone(),
                updated_at: now,
            })
        }
        Err(err) => {
            if let sqlx::Error::Database(ref db_err) = err {
                if db_err.is_unique_violation() {
                    // Lost a concurrent first-contact race; reuse the winner's row.
                    return find_by_triple(pool, item_id, buyer_id, seller_id)
                        .await?
                        .ok_or_else(|| DatabaseError::NotFound {
                            entity: "Conversation",
                            id: id.clone(),
                        });
                }
            }
            Err(DatabaseError::Sqlx(err))
        }
    }
}

/// Record the latest message on a conversation.
pub async fn touch(
    pool: &SqlitePool,
    id: &str,
    last_message: &str,
    updated_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET last_message = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(last_message)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[derive(FromRow)]
struct ProjectionRow {
    conversation_id: String,
    item_id: String,
    item_title: String,
    item_price: f64,
    item_image: Option<String>,
    last_message: Option<String>,
    updated_at: String,
    other_id: String,
    other_name: String,
    other_avatar: Option<String>,
    other_hostel: Option<String>,
}

const PROJECTION_SELECT: &str = r#"
    SELECT c.id AS conversation_id,
           i.id AS item_id,
           i.title AS item_title,
           i.price AS item_price,
           (SELECT url FROM item_images
             WHERE item_id = i.id ORDER BY position LIMIT 1) AS item_image,
           c.last_message,
           c.updated_at,
           u.id AS other_id,
           u.full_name AS other_name,
           u.avatar AS other_avatar,
           u.hostel AS other_hostel
    FROM conversations c
    JOIN items i ON i.id = c.item_id
    JOIN users u ON u.id = CASE WHEN c.buyer_id = ? THEN c.seller_id ELSE c.buyer_id END
"#;

/// All conversations the user participates in, newest activity first,
/// projected for the inbox view.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<InboxEntry>> {
    let rows = sqlx::query_as::<_, ProjectionRow>(&format!(
        "{PROJECTION_SELECT} WHERE c.buyer_id = ? OR c.seller_id = ? \
         ORDER BY c.updated_at DESC"
    ))
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| InboxEntry {
            conversation_id: row.conversation_id,
            item: ItemSummary {
                id: row.item_id,
                title: row.item_title,
                image: row.item_image,
                price: row.item_price,
            },
            last_message: row.last_message,
            updated_at: row.updated_at,
            other_user: SellerSummary {
                id: row.other_id,
                full_name: row.other_name,
                avatar: row.other_avatar,
                hostel: row.other_hostel,
            },
        })
        .collect())
}

/// The header for a thread view, verifying the caller is a participant.
pub async fn thread_header(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<ConversationHead> {
    let row = sqlx::query_as::<_, ProjectionRow>(&format!(
        "{PROJECTION_SELECT} WHERE c.id = ? AND (c.buyer_id = ? OR c.seller_id = ?)"
    ))
    .bind(user_id)
    .bind(id)
    .bind(user_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Conversation",
        id: id.to_string(),
    })?;

    Ok(ConversationHead {
        conversation_id: row.conversation_id,
        item: ItemSummary {
            id: row.item_id,
            title: row.item_title,
            image: row.item_image,
            price: row.item_price,
        },
        other_user: SellerSummary {
            id: row.other_id,
            full_name: row.other_name,
            avatar: row.other_avatar,
            hostel: row.other_hostel,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{self, NewItem};
    use crate::user::{self, NewUser};
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_user(db: &Database, uid: &str) -> String {
        user::create_user(
            db.pool(),
            &NewUser {
                uid: uid.to_string(),
                email: format!("{uid}@campus.edu"),
                full_name: format!("User {uid}"),
                password_hash: None,
                avatar: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_item(db: &Database, seller_id: &str) -> String {
        item::create_item(
            db.pool(),
            &NewItem {
                title: "Desk".to_string(),
                description: "A desk".to_string(),
                price: 500.0,
                category: "Furniture".to_string(),
                condition: "Good".to_string(),
                images: vec!["https://cdn.test/desk.jpg".to_string()],
                tags: Vec::new(),
                is_available: true,
                seller_id: seller_id.to_string(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let item_id = seed_item(&db, &seller).await;

        let first = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();
        let second = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_reuses_existing_row() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let item_id = seed_item(&db, &seller).await;

        let existing = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();

        // Simulate the concurrent first-contact race: a second insert for
        // the same triple hits the unique constraint and must resolve to
        // the existing conversation.
        let inserted = sqlx::query(
            "INSERT INTO conversations \
             (id, item_id, buyer_id, seller_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind("other-id")
        .bind(&item_id)
        .bind(&buyer)
        .bind(&seller)
        .bind(crate::now_utc())
        .bind(crate::now_utc())
        .execute(db.pool())
        .await;
        assert!(inserted.is_err());

        let resolved = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();
        assert_eq!(resolved.id, existing.id);
    }

    #[tokio::test]
    async fn test_participant_scoping() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let stranger = seed_user(&db, "stranger").await;
        let item_id = seed_item(&db, &seller).await;

        let conversation = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();

        assert!(find_for_participant(db.pool(), &conversation.id, &buyer)
            .await
            .is_ok());
        assert!(find_for_participant(db.pool(), &conversation.id, &seller)
            .await
            .is_ok());

        let denied = find_for_participant(db.pool(), &conversation.id, &stranger).await;
        assert!(matches!(denied, Err(DatabaseError::NotFound { .. })));

        let denied = thread_header(db.pool(), &conversation.id, &stranger).await;
        assert!(matches!(denied, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_inbox_projection() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let item_id = seed_item(&db, &seller).await;

        let conversation = find_or_create(db.pool(), &item_id, &buyer, &seller)
            .await
            .unwrap();
        touch(db.pool(), &conversation.id, "Hi", &crate::now_utc())
            .await
            .unwrap();

        // Both sides see the thread, each with the other as counterparty.
        let buyer_inbox = list_for_user(db.pool(), &buyer).await.unwrap();
        assert_eq!(buyer_inbox.len(), 1);
        let entry = &buyer_inbox[0];
        assert_eq!(entry.conversation_id, conversation.id);
        assert_eq!(entry.last_message.as_deref(), Some("Hi"));
        assert_eq!(entry.item.title, "Desk");
        assert_eq!(entry.item.image.as_deref(), Some("https://cdn.test/desk.jpg"));
        assert_eq!(entry.other_user.id, seller);

        let seller_inbox = list_for_user(db.pool(), &seller).await.unwrap();
        assert_eq!(seller_inbox.len(), 1);
        assert_eq!(seller_inbox[0].other_user.id, buyer);

        let stranger = seed_user(&db, "stranger").await;
        let empty = list_for_user(db.pool(), &stranger).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_inbox_orders_by_recent_activity() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let first_item = seed_item(&db, &seller).await;
        let second_item = seed_item(&db, &seller).await;

        let first = find_or_create(db.pool(), &first_item, &buyer, &seller)
            .await
            .unwrap();
        let second = find_or_create(db.pool(), &second_item, &buyer, &seller)
            .await
            .unwrap();

        touch(db.pool(), &second.id, "earlier", &crate::now_utc())
            .await
            .unwrap();
        touch(db.pool(), &first.id, "latest", &crate::now_utc())
            .await
            .unwrap();

        let inbox = list_for_user(db.pool(), &buyer).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].conversation_id, first.id);
        assert_eq!(inbox[1].conversation_id, second.id);
    }
}
