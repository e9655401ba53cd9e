//! Authentication and profile routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use database::user::{self, NewUser, ProfileUpdate};
use database::validation;
use database::User;

use crate::error::{ApiError, Result};
use crate::extract::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", post(google_login))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/complete-profile", post(complete_profile))
        .route("/me", get(me))
        .route("/check-auth", get(check_auth))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleLoginRequest {
    firebase_token: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    email: String,
    password: String,
    full_name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ProfileRequest {
    hostel: Option<String>,
    year: Option<String>,
    phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
    pub is_new_user: bool,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// Log in with an identity-provider token, creating the user on first
/// contact.
pub async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let provider_token = request
        .firebase_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Firebase token required".to_string()))?;

    let identity = state.identity.verify(&provider_token).await?;

    let pool = state.db.pool();
    let (user, is_new_user) = match user::find_user_by_uid(pool, &identity.uid).await? {
        Some(user) => (user, false),
        None => {
            let user = user::create_user(
                pool,
                &NewUser {
                    uid: identity.uid.clone(),
                    email: identity.email.clone(),
                    full_name: identity.name.clone().unwrap_or_else(|| "User".to_string()),
                    password_hash: None,
                    avatar: identity.picture.clone(),
                },
            )
            .await?;
            info!(uid = %user.uid, "Created user from external identity");
            (user, true)
        }
    };

    let token = state.tokens.issue(&user.uid, &user.email)?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
        is_new_user,
    }))
}

/// Log in with email and password (local accounts only).
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password required".to_string(),
        ));
    }

    let pool = state.db.pool();
    let user = user::find_user_by_email(pool, request.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    // Only local accounts carry a hash; provider accounts cannot log in here.
    let hash = user
        .password_hash
        .as_deref()
        .filter(|_| user.uid.starts_with("email_"))
        .ok_or_else(invalid_credentials)?
        .to_string();

    if !auth::password::verify_password(&request.password, &hash)? {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(&user.uid, &user.email)?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
        is_new_user: false,
    }))
}

/// Register a local email/password account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if request.email.trim().is_empty()
        || request.password.is_empty()
        || request.full_name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("All fields required".to_string()));
    }
    validation::validate_email(&request.email)?;

    let pool = state.db.pool();
    if user::find_user_by_email(pool, request.email.trim())
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = auth::password::hash_password(&request.password)?;
    let user = user::create_user(
        pool,
        &NewUser {
            uid: user::local_uid(),
            email: request.email.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            password_hash: Some(password_hash),
            avatar: None,
        },
    )
    .await?;
    info!(uid = %user.uid, "Registered local account");

    let token = state.tokens.issue(&user.uid, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user,
            is_new_user: true,
        }),
    ))
}

/// Complete onboarding / update the profile fields.
pub async fn complete_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user = user::update_profile(
        state.db.pool(),
        &caller.uid,
        &ProfileUpdate {
            hostel: request.hostel,
            year: request.year,
            phone: request.phone,
        },
    )
    .await?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Get the current user.
pub async fn me(State(state): State<AppState>, caller: AuthUser) -> Result<Json<UserResponse>> {
    let user = user::get_user_by_uid(state.db.pool(), &caller.uid).await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Unauthenticated liveness ping.
pub async fn check_auth() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "message": "Authenticated" }))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}
