use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use super::ApiJson;
use crate::errors::ApiError;
use crate::models::user::{
    CreateUserPayload, Role, TokenPayload, UpdateProfilePayload, UserProfile,
};
use crate::routes::auth::AuthenticatedUser;
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct TokenBody {
    token: String,
}

#[instrument(name = "HTTP: Create user", skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let new_user = payload.validate()?;
    let user = state.auth_service.register(&new_user, Role::Regular).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

#[instrument(name = "HTTP: Token request", skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> Result<Json<TokenBody>, ApiError> {
    tracing::info!("Received token request");
    let credentials = payload.validate()?;
    let user = state.auth_service.login(&credentials).await?;
    let token = state.auth_service.issue_token(user.id).await?;
    Ok(Json(TokenBody { token }))
}

#[instrument(name = "HTTP: Read own profile", skip_all, fields(user_id = user.id()))]
pub async fn me(user: AuthenticatedUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user.0))
}

#[instrument(name = "HTTP: Update own profile", skip_all, fields(user_id = user.id()))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(payload): ApiJson<UpdateProfilePayload>,
) -> Result<Json<UserProfile>, ApiError> {
    let changes = payload.validate()?;
    let updated = state.auth_service.update_profile(user.id(), &changes).await?;
    Ok(Json(UserProfile::from(&updated)))
}
