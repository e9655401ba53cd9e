//! SQLite persistence layer for CampusSwap.
//!
//! This crate provides async database operations for users, item listings,
//! conversations, and messages using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:campus_swap.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let seller = user::create_user(
//!         db.pool(),
//!         &user::NewUser {
//!             uid: "google-uid-1".to_string(),
//!             email: "alice@campus.edu".to_string(),
//!             full_name: "Alice".to_string(),
//!             password_hash: None,
//!             avatar: None,
//!         },
//!     )
//!     .await?;
//!     println!("created {}", seller.id);
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod item;
pub mod message;
pub mod models;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Conversation, ConversationHead, InboxEntry, Item, ItemSummary, ItemWithSeller, Message,
    Pagination, SellerSummary, User,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/campus_swap.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Current UTC time as RFC 3339 text with microsecond precision.
///
/// Timestamps are stored as TEXT; this format keeps lexicographic order
/// aligned with chronological order.
pub fn now_utc() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::NewUser;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_user_crud() {
        let db = test_db().await;

        // Create
        let created = user::create_user(
            db.pool(),
            &NewUser {
                uid: "uid-123".to_string(),
                email: "alice@campus.edu".to_string(),
                full_name: "Alice".to_string(),
                password_hash: None,
                avatar: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.full_name, "Alice");
        assert!(created.password_hash.is_none());

        // Read
        let fetched = user::get_user_by_uid(db.pool(), "uid-123").await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.email, "alice@campus.edu");

        // Lookup by email
        let by_email = user::find_user_by_email(db.pool(), "alice@campus.edu")
            .await
            .unwrap();
        assert_eq!(by_email.unwrap().id, created.id);

        // Update profile
        let updated = user::update_profile(
            db.pool(),
            "uid-123",
            &user::ProfileUpdate {
                hostel: Some("North".to_string()),
                year: Some("2nd Year".to_string()),
                phone: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.hostel.as_deref(), Some("North"));
        assert_eq!(updated.year.as_deref(), Some("2nd Year"));
        assert!(updated.phone.is_none());

        // Missing user
        let result = user::get_user_by_uid(db.pool(), "no-such-uid").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn test_now_utc_orders_lexicographically() {
        let a = now_utc();
        let b = now_utc();
        assert!(a <= b);
        assert!(a.ends_with('Z'));
    }
}
