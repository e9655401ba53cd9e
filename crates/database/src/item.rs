//! Item catalog storage and the feed query builder.
//!
//! The feed endpoint translates a set of optional query parameters into a
//! filtered, sorted, paginated view over the items table. The filter is
//! coerced once at the HTTP boundary into an immutable [`ItemFilter`] and
//! every supplied predicate is applied conjunctively.

use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Item, ItemWithSeller, Pagination, SellerSummary};

/// Default feed page size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Cap on the similar-items lookup.
const SIMILAR_LIMIT: i64 = 8;

/// Feed sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Recent,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// No popularity metric is tracked; orders by recency.
    Popular,
}

impl SortOrder {
    /// Parse a query-string value, falling back to `Recent`.
    pub fn parse(value: &str) -> Self {
        match value {
            "price_low" => Self::PriceLow,
            "price_high" => Self::PriceHigh,
            "popular" => Self::Popular,
            _ => Self::Recent,
        }
    }

    fn order_clause(self) -> &'static str {
        match self {
            Self::Recent | Self::Popular => " ORDER BY i.created_at DESC, i.id DESC",
            Self::PriceLow => " ORDER BY i.price ASC, i.created_at DESC",
            Self::PriceHigh => " ORDER BY i.price DESC, i.created_at DESC",
        }
    }
}

/// Which slice of the catalog a query runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Public feed: available items only.
    Feed,
    /// One seller's items, regardless of availability.
    Seller(String),
}

/// Immutable filter options for one catalog page.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    pub scope: Scope,
    /// Case-insensitive substring over title OR description.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Inclusive price bounds; `None` means unbounded.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<String>,
    /// Matches items whose tag set intersects; stored lowercased.
    pub tags: Vec<String>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl ItemFilter {
    /// An unfiltered first page of the given scope.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            search: None,
            category: None,
            min_price: None,
            max_price: None,
            condition: None,
            tags: Vec::new(),
            sort: SortOrder::Recent,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    /// An unfiltered first page of the public feed.
    pub fn feed() -> Self {
        Self::new(Scope::Feed)
    }

    /// An unfiltered first page of one seller's items.
    pub fn for_seller(seller_id: impl Into<String>) -> Self {
        Self::new(Scope::Seller(seller_id.into()))
    }

    fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Fields for a new listing.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    /// Ordered image URLs, 1-5 entries.
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub is_available: bool,
    pub seller_id: String,
}

/// Partial update of a listing; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub is_available: Option<bool>,
    /// Replaces the full tag set when supplied.
    pub tags: Option<Vec<String>>,
}

impl ItemUpdate {
    fn has_column_change(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.price.is_some()
            || self.category.is_some()
            || self.condition.is_some()
            || self.is_available.is_some()
    }
}

const ITEM_COLUMNS: &str =
    "i.id, i.title, i.description, i.price, i.category, i.condition, i.is_available, \
     i.seller_id, i.created_at";

/// Create a listing with its images and tags.
pub async fn create_item(pool: &SqlitePool, new: &NewItem) -> Result<ItemWithSeller> {
    let id = Uuid::new_v4().to_string();
    let created_at = crate::now_utc();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO items (id, title, description, price, category, condition,
                           is_available, seller_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.title.trim())
    .bind(new.description.trim())
    .bind(new.price)
    .bind(&new.category)
    .bind(&new.condition)
    .bind(new.is_available)
    .bind(&new.seller_id)
    .bind(&created_at)
    .execute(&mut *tx)
    .await?;

    for (position, url) in new.images.iter().enumerate() {
        sqlx::query("INSERT INTO item_images (item_id, position, url) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut *tx)
            .await?;
    }

    for tag in normalize_tags(&new.tags) {
        sqlx::query("INSERT INTO item_tags (item_id, tag) VALUES (?, ?)")
            .bind(&id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::debug!(item = %id, seller = %new.seller_id, "item created");
    get_item(pool, &id).await
}

/// Get one listing with images, tags, and seller.
pub async fn get_item(pool: &SqlitePool, id: &str) -> Result<ItemWithSeller> {
    let row = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Item",
        id: id.to_string(),
    })?;

    let mut hydrated = hydrate(pool, vec![row]).await?;
    Ok(hydrated.remove(0))
}

/// The seller of a listing, without loading the whole row.
pub async fn get_seller_id(pool: &SqlitePool, item_id: &str) -> Result<String> {
    sqlx::query_scalar::<_, String>("SELECT seller_id FROM items WHERE id = ?")
        .bind(item_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Item",
            id: item_id.to_string(),
        })
}

/// Run the catalog query: conjunctive filters, sort, offset pagination.
pub async fn list_items(
    pool: &SqlitePool,
    filter: &ItemFilter,
) -> Result<(Vec<ItemWithSeller>, Pagination)> {
    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM items i");
    push_filters(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM items i"));
    push_filters(&mut page_query, filter);
    page_query.push(filter.sort.order_clause());
    page_query.push(" LIMIT ");
    page_query.push_bind(i64::from(filter.limit));
    page_query.push(" OFFSET ");
    page_query.push_bind(filter.offset());

    let rows: Vec<Item> = page_query.build_query_as().fetch_all(pool).await?;
    let items = hydrate(pool, rows).await?;

    Ok((items, Pagination::new(total, filter.page, filter.limit)))
}

/// Up to 8 other available items in the same category, newest first.
pub async fn similar_items(pool: &SqlitePool, id: &str) -> Result<Vec<ItemWithSeller>> {
    let category = sqlx::query_scalar::<_, String>("SELECT category FROM items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Item",
            id: id.to_string(),
        })?;

    let rows: Vec<Item> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM items i \
         WHERE i.category = ? AND i.id <> ? AND i.is_available = 1 \
         ORDER BY i.created_at DESC, i.id DESC LIMIT ?"
    ))
    .bind(&category)
    .bind(id)
    .bind(SIMILAR_LIMIT)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Apply a partial update to a listing owned by `seller_id`.
///
/// A listing that does not exist or belongs to someone else surfaces as
/// `NotFound` either way.
pub async fn update_item(
    pool: &SqlitePool,
    id: &str,
    seller_id: &str,
    update: &ItemUpdate,
) -> Result<ItemWithSeller> {
    if update.has_column_change() {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE items SET ");
        let mut fields = query.separated(", ");
        if let Some(title) = &update.title {
            fields.push("title = ");
            fields.push_bind_unseparated(title.trim().to_string());
        }
        if let Some(description) = &update.description {
            fields.push("description = ");
            fields.push_bind_unseparated(description.trim().to_string());
        }
        if let Some(price) = update.price {
            fields.push("price = ");
            fields.push_bind_unseparated(price);
        }
        if let Some(category) = &update.category {
            fields.push("category = ");
            fields.push_bind_unseparated(category.clone());
        }
        if let Some(condition) = &update.condition {
            fields.push("condition = ");
            fields.push_bind_unseparated(condition.clone());
        }
        if let Some(is_available) = update.is_available {
            fields.push("is_available = ");
            fields.push_bind_unseparated(is_available);
        }
        query.push(" WHERE id = ");
        query.push_bind(id.to_string());
        query.push(" AND seller_id = ");
        query.push_bind(seller_id.to_string());

        let result = query.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                entity: "Item",
                id: id.to_string(),
            });
        }
    } else {
        ensure_owned(pool, id, seller_id).await?;
    }

    if let Some(tags) = &update.tags {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM item_tags WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for tag in normalize_tags(tags) {
            sqlx::query("INSERT INTO item_tags (item_id, tag) VALUES (?, ?)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
    }

    get_item(pool, id).await
}

/// Delete a listing owned by `seller_id`; images, tags, conversations, and
/// messages cascade.
pub async fn delete_item(pool: &SqlitePool, id: &str, seller_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM items WHERE id = ? AND seller_id = ?")
        .bind(id)
        .bind(seller_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Item",
            id: id.to_string(),
        });
    }

    tracing::debug!(item = %id, "item deleted");
    Ok(())
}

async fn ensure_owned(pool: &SqlitePool, id: &str, seller_id: &str) -> Result<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1 FROM items WHERE id = ? AND seller_id = ?")
        .bind(id)
        .bind(seller_id)
        .fetch_optional(pool)
        .await?
        .map(|_| ())
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Item",
            id: id.to_string(),
        })
}

/// Push the conjunctive WHERE clause shared by the page and count queries.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
    query.push(" WHERE 1 = 1");

    match &filter.scope {
        Scope::Feed => {
            query.push(" AND i.is_available = 1");
        }
        Scope::Seller(seller_id) => {
            query.push(" AND i.seller_id = ");
            query.push_bind(seller_id.clone());
        }
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        query.push(" AND (i.title LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR i.description LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(category) = &filter.category {
        query.push(" AND i.category = ");
        query.push_bind(category.clone());
    }

    if let Some(min_price) = filter.min_price {
        query.push(" AND i.price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        query.push(" AND i.price <= ");
        query.push_bind(max_price);
    }

    if let Some(condition) = &filter.condition {
        query.push(" AND i.condition = ");
        query.push_bind(condition.clone());
    }

    if !filter.tags.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM item_tags t WHERE t.item_id = i.id AND t.tag IN (",
        );
        let mut tags = query.separated(", ");
        for tag in &filter.tags {
            tags.push_bind(tag.trim().to_lowercase());
        }
        query.push("))");
    }
}

/// Trim, lowercase, drop empties, dedup.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Attach images, tags, and seller projections to a page of item rows.
async fn hydrate(pool: &SqlitePool, rows: Vec<Item>) -> Result<Vec<ItemWithSeller>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

    let mut images: HashMap<String, Vec<String>> = HashMap::new();
    let mut image_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT item_id, url FROM item_images WHERE item_id IN (");
    let mut separated = image_query.separated(", ");
    for id in &ids {
        separated.push_bind(id.clone());
    }
    image_query.push(") ORDER BY item_id, position");
    let image_rows: Vec<(String, String)> =
        image_query.build_query_as().fetch_all(pool).await?;
    for (item_id, url) in image_rows {
        images.entry(item_id).or_default().push(url);
    }

    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    let mut tag_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT item_id, tag FROM item_tags WHERE item_id IN (");
    let mut separated = tag_query.separated(", ");
    for id in &ids {
        separated.push_bind(id.clone());
    }
    tag_query.push(") ORDER BY item_id, tag");
    let tag_rows: Vec<(String, String)> = tag_query.build_query_as().fetch_all(pool).await?;
    for (item_id, tag) in tag_rows {
        tags.entry(item_id).or_default().push(tag);
    }

    let seller_ids: BTreeSet<String> = rows.iter().map(|row| row.seller_id.clone()).collect();
    let mut sellers: HashMap<String, SellerSummary> = HashMap::new();
    let mut seller_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, full_name, avatar, hostel FROM users WHERE id IN (");
    let mut separated = seller_query.separated(", ");
    for id in &seller_ids {
        separated.push_bind(id.clone());
    }
    seller_query.push(")");
    let seller_rows: Vec<(String, String, Option<String>, Option<String>)> =
        seller_query.build_query_as().fetch_all(pool).await?;
    for (id, full_name, avatar, hostel) in seller_rows {
        sellers.insert(
            id.clone(),
            SellerSummary {
                id,
                full_name,
                avatar,
                hostel,
            },
        );
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let seller = sellers.get(&row.seller_id).cloned();
            ItemWithSeller {
                images: images.remove(&row.id).unwrap_or_default(),
                tags: tags.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                description: row.description,
                price: row.price,
                category: row.category,
                condition: row.condition,
                is_available: row.is_available,
                seller_id: row.seller_id,
                seller,
                created_at: row.created_at,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn listing(seller_id: &str, title: &str, price: f64, category: &str) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: format!("{title} in good shape"),
            price,
            category: category.to_string(),
            condition: "Good".to_string(),
            images: vec![format!("https://cdn.test/{title}.jpg")],
            tags: Vec::new(),
            is_available: true,
            seller_id: seller_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_item() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        let created = create_item(
            db.pool(),
            &NewItem {
                tags: vec!["Desk".to_string(), " study ".to_string()],
                images: vec![
                    "https://cdn.test/a.jpg".to_string(),
                    "https://cdn.test/b.jpg".to_string(),
                ],
                ..listing(&seller, "Desk", 500.0, "Furniture")
            },
        )
        .await
        .unwrap();

        assert_eq!(created.images.len(), 2);
        assert_eq!(created.images[0], "https://cdn.test/a.jpg");
        assert_eq!(created.tags, vec!["desk".to_string(), "study".to_string()]);
        assert!(created.is_available);

        let seller_summary = created.seller.unwrap();
        assert_eq!(seller_summary.full_name, "User seller");

        let missing = get_item(db.pool(), "no-such-item").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        create_item(db.pool(), &listing(&seller, "Wood Desk", 1500.0, "Furniture"))
            .await
            .unwrap();
        create_item(db.pool(), &listing(&seller, "Wood Chair", 300.0, "Furniture"))
            .await
            .unwrap();
        create_item(db.pool(), &listing(&seller, "Calculus Book", 1500.0, "TextBooks"))
            .await
            .unwrap();

        let mut filter = ItemFilter::feed();
        filter.category = Some("Furniture".to_string());
        filter.min_price = Some(1000.0);
        filter.max_price = Some(2000.0);

        let (items, pagination) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(pagination.total, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Wood Desk");
    }

    #[tokio::test]
    async fn test_price_bounds_are_inclusive() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        create_item(db.pool(), &listing(&seller, "Desk", 1500.0, "Furniture"))
            .await
            .unwrap();

        let mut filter = ItemFilter::feed();
        filter.min_price = Some(1500.0);
        filter.max_price = Some(1500.0);
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        create_item(db.pool(), &listing(&seller, "Desk Lamp", 200.0, "Electronics"))
            .await
            .unwrap();
        create_item(
            db.pool(),
            &NewItem {
                description: "Comes with a free lamp".to_string(),
                ..listing(&seller, "Side Table", 400.0, "Furniture")
            },
        )
        .await
        .unwrap();
        create_item(db.pool(), &listing(&seller, "Kettle", 150.0, "Appliances"))
            .await
            .unwrap();

        let mut filter = ItemFilter::feed();
        filter.search = Some("LAMP".to_string());
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_tag_intersection() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        create_item(
            db.pool(),
            &NewItem {
                tags: vec!["study".to_string(), "wood".to_string()],
                ..listing(&seller, "Desk", 500.0, "Furniture")
            },
        )
        .await
        .unwrap();
        create_item(
            db.pool(),
            &NewItem {
                tags: vec!["kitchen".to_string()],
                ..listing(&seller, "Kettle", 150.0, "Appliances")
            },
        )
        .await
        .unwrap();

        let mut filter = ItemFilter::feed();
        filter.tags = vec!["WOOD".to_string(), "metal".to_string()];
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Desk");

        let mut filter = ItemFilter::feed();
        filter.tags = vec!["metal".to_string()];
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_sort_orders() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        create_item(db.pool(), &listing(&seller, "Mid", 500.0, "Furniture"))
            .await
            .unwrap();
        create_item(db.pool(), &listing(&seller, "Cheap", 100.0, "Furniture"))
            .await
            .unwrap();
        create_item(db.pool(), &listing(&seller, "Pricey", 900.0, "Furniture"))
            .await
            .unwrap();

        let mut filter = ItemFilter::feed();
        filter.sort = SortOrder::PriceLow;
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        let prices: Vec<f64> = items.iter().map(|i| i.price).collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));

        filter.sort = SortOrder::PriceHigh;
        let (items, _) = list_items(db.pool(), &filter).await.unwrap();
        let prices: Vec<f64> = items.iter().map(|i| i.price).collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));

        // Recent and popular both order newest first.
        for sort in [SortOrder::Recent, SortOrder::Popular] {
            filter.sort = sort;
            let (items, _) = list_items(db.pool(), &filter).await.unwrap();
            assert_eq!(items[0].title, "Pricey");
            assert_eq!(items[2].title, "Mid");
        }
    }

    #[tokio::test]
    async fn test_pagination() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        for n in 0..25 {
            create_item(db.pool(), &listing(&seller, &format!("Item {n}"), 100.0, "Misc"))
                .await
                .unwrap();
        }

        let mut filter = ItemFilter::feed();
        filter.limit = 10;

        filter.page = 1;
        let (items, pagination) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(pagination.total, 25);
        assert_eq!(pagination.pages, 3);
        assert!(pagination.has_more);

        filter.page = 3;
        let (items, pagination) = list_items(db.pool(), &filter).await.unwrap();
        assert_eq!(items.len(), 5);
        assert!(!pagination.has_more);

        filter.page = 4;
        let (items, pagination) = list_items(db.pool(), &filter).await.unwrap();
        assert!(items.is_empty());
        assert!(!pagination.has_more);
    }

    #[tokio::test]
    async fn test_feed_hides_unavailable_seller_scope_does_not() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        create_item(db.pool(), &listing(&seller, "Available", 100.0, "Misc"))
            .await
            .unwrap();
        let sold = create_item(
            db.pool(),
            &NewItem {
                is_available: false,
                ..listing(&seller, "Sold", 100.0, "Misc")
            },
        )
        .await
        .unwrap();
        assert!(!sold.is_available);

        let (items, pagination) = list_items(db.pool(), &ItemFilter::feed()).await.unwrap();
        assert_eq!(pagination.total, 1);
        assert_eq!(items[0].title, "Available");

        let (items, pagination) = list_items(db.pool(), &ItemFilter::for_seller(seller.as_str()))
            .await
            .unwrap();
        assert_eq!(pagination.total, 2);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_similar_items() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;

        let base = create_item(db.pool(), &listing(&seller, "Base", 100.0, "Furniture"))
            .await
            .unwrap();
        for n in 0..10 {
            create_item(
                db.pool(),
                &listing(&seller, &format!("Other {n}"), 100.0, "Furniture"),
            )
            .await
            .unwrap();
        }
        create_item(db.pool(), &listing(&seller, "Unrelated", 100.0, "TextBooks"))
            .await
            .unwrap();
        create_item(
            db.pool(),
            &NewItem {
                is_available: false,
                ..listing(&seller, "Hidden", 100.0, "Furniture")
            },
        )
        .await
        .unwrap();

        let similar = similar_items(db.pool(), &base.id).await.unwrap();
        assert_eq!(similar.len(), 8);
        assert!(similar.iter().all(|i| i.category == "Furniture"));
        assert!(similar.iter().all(|i| i.id != base.id));
        assert!(similar.iter().all(|i| i.title != "Hidden"));

        let missing = similar_items(db.pool(), "no-such-item").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_item_ownership_and_fields() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let other = seed_user(&db, "other").await;

        let item = create_item(db.pool(), &listing(&seller, "Desk", 500.0, "Furniture"))
            .await
            .unwrap();

        // A non-owner cannot touch the listing.
        let denied = update_item(
            db.pool(),
            &item.id,
            &other,
            &ItemUpdate {
                price: Some(1.0),
                ..ItemUpdate::default()
            },
        )
        .await;
        assert!(matches!(denied, Err(DatabaseError::NotFound { .. })));

        let updated = update_item(
            db.pool(),
            &item.id,
            &seller,
            &ItemUpdate {
                price: Some(450.0),
                is_available: Some(false),
                tags: Some(vec!["Sale".to_string()]),
                ..ItemUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, 450.0);
        assert!(!updated.is_available);
        assert_eq!(updated.tags, vec!["sale".to_string()]);
        // Untouched fields survive.
        assert_eq!(updated.title, "Desk");
    }

    #[tokio::test]
    async fn test_delete_item_cascades() {
        let db = test_db().await;
        let seller = seed_user(&db, "seller").await;
        let other = seed_user(&db, "other").await;

        let item = create_item(db.pool(), &listing(&seller, "Desk", 500.0, "Furniture"))
            .await
            .unwrap();

        let denied = delete_item(db.pool(), &item.id, &other).await;
        assert!(matches!(denied, Err(DatabaseError::NotFound { .. })));

        delete_item(db.pool(), &item.id, &seller).await.unwrap();
        let gone = get_item(db.pool(), &item.id).await;
        assert!(matches!(gone, Err(DatabaseError::NotFound { .. })));

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM item_images WHERE item_id = ?")
                .bind(&item.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }
}
