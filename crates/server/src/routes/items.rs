//! Item catalog routes.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use database::item::{self, ItemFilter, ItemUpdate, NewItem, Scope, SortOrder};
use database::validation;
use database::{ItemWithSeller, Pagination};

use crate::error::{ApiError, Result};
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create))
        .route("/my", get(my_items))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route("/:id/similar", get(similar))
}

/// Raw feed query parameters.
///
/// Every field arrives as optional text; malformed values degrade to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedQuery {
    search: Option<String>,
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    condition: Option<String>,
    tags: Option<String>,
    sort_by: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl FeedQuery {
    /// Coerce the raw parameters into the immutable catalog filter.
    fn into_filter(self, scope: Scope) -> ItemFilter {
        let mut filter = ItemFilter::new(scope);
        filter.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        filter.category = self.category.filter(|s| !s.is_empty());
        filter.min_price = self.min_price.as_deref().and_then(parse_price);
        filter.max_price = self.max_price.as_deref().and_then(parse_price);
        filter.condition = self.condition.filter(|s| !s.is_empty());
        filter.tags = self.tags.as_deref().map(split_tags).unwrap_or_default();
        filter.sort = self
            .sort_by
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();
        filter.page = parse_positive(self.page.as_deref(), 1);
        filter.limit = parse_positive(self.limit.as_deref(), item::DEFAULT_PAGE_SIZE);
        filter
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0)
}

fn parse_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub items: Vec<ItemWithSeller>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub item: ItemWithSeller,
}

#[derive(Serialize)]
pub struct SimilarResponse {
    pub success: bool,
    pub items: Vec<ItemWithSeller>,
}

/// The public feed: available items, filtered, sorted, paginated.
pub async fn feed(
    State(state): State<AppState>,
    _caller: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let filter = query.into_filter(Scope::Feed);
    let (items, pagination) = item::list_items(state.db.pool(), &filter).await?;
    Ok(Json(FeedResponse {
        success: true,
        items,
        pagination,
    }))
}

/// The caller's own listings, regardless of availability.
pub async fn my_items(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    let filter = query.into_filter(Scope::Seller(user.id));
    let (items, pagination) = item::list_items(state.db.pool(), &filter).await?;
    Ok(Json(FeedResponse {
        success: true,
        items,
        pagination,
    }))
}

/// One listing with its seller.
pub async fn get_one(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>> {
    let item = item::get_item(state.db.pool(), &id).await?;
    Ok(Json(ItemResponse {
        success: true,
        item,
    }))
}

/// Up to 8 other available items in the same category.
pub async fn similar(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SimilarResponse>> {
    let items = item::similar_items(state.db.pool(), &id).await?;
    Ok(Json(SimilarResponse {
        success: true,
        items,
    }))
}

/// Create a listing from a multipart form: text fields plus 1-5 `images`
/// files, uploaded sequentially to the image store before the row is
/// written.
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;

    let mut title = String::new();
    let mut description = String::new();
    let mut price: Option<f64> = None;
    let mut category = String::new();
    let mut condition = String::new();
    let mut tags: Vec<String> = Vec::new();
    let mut is_available = true;
    let mut uploads: Vec<(String, String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {e}")))?;
                uploads.push((filename, content_type, bytes.to_vec()));
            }
            "title" => title = text_field(field).await?,
            "description" => description = text_field(field).await?,
            "price" => {
                let raw = text_field(field).await?;
                price = Some(
                    raw.trim()
                        .parse::<f64>()
                        .map_err(|_| ApiError::BadRequest("Invalid price".to_string()))?,
                );
            }
            "category" => category = text_field(field).await?,
            "condition" => condition = text_field(field).await?,
            "tags" => tags = parse_tags_field(&text_field(field).await?),
            "isAvailable" => {
                is_available = text_field(field).await?.trim().parse::<bool>().unwrap_or(true);
            }
            _ => {}
        }
    }

    let price = price.ok_or_else(|| ApiError::BadRequest("Price is required".to_string()))?;
    validation::validate_listing(
        &title,
        &description,
        price,
        &category,
        &condition,
        uploads.len(),
    )?;

    let mut images = Vec::with_capacity(uploads.len());
    for (filename, content_type, bytes) in uploads {
        let url = state.images.store(&filename, &content_type, bytes).await?;
        images.push(url);
    }

    let item = item::create_item(
        state.db.pool(),
        &NewItem {
            title,
            description,
            price,
            category,
            condition,
            images,
            tags,
            is_available,
            seller_id: user.id,
        },
    )
    .await?;
    info!(item = %item.id, seller = %item.seller_id, "Listing created");

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            success: true,
            item,
        }),
    ))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRequest {
    title: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    category: Option<String>,
    condition: Option<String>,
    tags: Option<Vec<String>>,
    is_available: Option<bool>,
}

/// Partially update a listing. Owner only; a foreign listing is
/// indistinguishable from an absent one.
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<ItemResponse>> {
    if let Some(price) = request.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::BadRequest(
                "Price must be a non-negative number".to_string(),
            ));
        }
    }
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
        }
    }

    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    let item = item::update_item(
        state.db.pool(),
        &id,
        &user.id,
        &ItemUpdate {
            title: request.title,
            description: request.description,
            price: request.price,
            category: request.category,
            condition: request.condition,
            is_available: request.is_available,
            tags: request.tags,
        },
    )
    .await?;

    Ok(Json(ItemResponse {
        success: true,
        item,
    }))
}

/// Delete a listing. Owner only.
pub async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let user = database::user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    item::delete_item(state.db.pool(), &id, &user.id).await?;
    info!(item = %id, "Listing deleted");
    Ok(Json(
        serde_json::json!({ "success": true, "message": "Item deleted" }),
    ))
}

async fn text_field(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart field: {e}")))
}

/// The client sends tags as a JSON array; tolerate a comma-separated list.
fn parse_tags_field(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => tags
            .into_iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect(),
        Err(_) => split_tags(raw),
    }
}
