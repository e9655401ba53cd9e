//! User storage operations.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Fields for a new user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Identity-provider subject, or a [`local_uid`] for email accounts.
    pub uid: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
}

/// Profile fields set during onboarding. All three are replaced on update;
/// fields left `None` are cleared.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub hostel: Option<String>,
    pub year: Option<String>,
    pub phone: Option<String>,
}

/// Generate a uid for a local email/password account.
pub fn local_uid() -> String {
    format!("email_{}", chrono::Utc::now().timestamp_millis())
}

const USER_COLUMNS: &str =
    "id, uid, email, full_name, password_hash, avatar, hostel, year, phone, created_at";

/// Create a new user.
pub async fn create_user(pool: &SqlitePool, new: &NewUser) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let created_at = crate::now_utc();

    sqlx::query(
        r#"
        INSERT INTO users (id, uid, email, full_name, password_hash, avatar, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.uid)
    .bind(&new.email)
    .bind(&new.full_name)
    .bind(&new.password_hash)
    .bind(&new.avatar)
    .bind(&created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: new.email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_user(pool, &id).await
}

/// Get a user by internal ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by external uid, failing if absent.
pub async fn get_user_by_uid(pool: &SqlitePool, uid: &str) -> Result<User> {
    find_user_by_uid(pool, uid)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "User",
            id: uid.to_string(),
        })
}

/// Look up a user by external uid.
pub async fn find_user_by_uid(pool: &SqlitePool, uid: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE uid = ?"
    ))
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Look up a user by email.
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Replace a user's onboarding profile fields.
pub async fn update_profile(
    pool: &SqlitePool,
    uid: &str,
    profile: &ProfileUpdate,
) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET hostel = ?, year = ?, phone = ?
        WHERE uid = ?
        "#,
    )
    .bind(&profile.hostel)
    .bind(&profile.year)
    .bind(&profile.phone)
    .bind(uid)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: uid.to_string(),
        });
    }

    get_user_by_uid(pool, uid).await
}
