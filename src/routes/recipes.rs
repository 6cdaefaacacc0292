use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::errors::ApiError;
use crate::models::recipe::{RecipeDetail, RecipeListQuery, RecipePayload, RecipeSummary};
use crate::routes::auth::AuthenticatedUser;
use crate::startup::AppState;

#[instrument(name = "HTTP: List recipes", skip_all, fields(user_id = user.id()))]
pub async fn list_recipes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let filter = query.validate()?;
    let recipes = state.recipe_service.list(user.id(), &filter).await?;
    Ok(Json(recipes))
}

#[instrument(name = "HTTP: Create recipe", skip_all, fields(user_id = user.id()))]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let recipe = payload.validate_new()?;
    let detail = state.recipe_service.create(user.id(), &recipe).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[instrument(name = "HTTP: Recipe detail", skip(state, user), fields(user_id = user.id()))]
pub async fn get_recipe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    Ok(Json(state.recipe_service.detail(user.id(), id).await?))
}

#[instrument(name = "HTTP: Replace recipe", skip(state, user, payload), fields(user_id = user.id()))]
pub async fn replace_recipe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<Json<RecipeDetail>, ApiError> {
    update(&state, &user, id, payload, false).await
}

#[instrument(name = "HTTP: Patch recipe", skip(state, user, payload), fields(user_id = user.id()))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<Json<RecipeDetail>, ApiError> {
    update(&state, &user, id, payload, true).await
}

#[instrument(name = "HTTP: Delete recipe", skip(state, user), fields(user_id = user.id()))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.recipe_service.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update(
    state: &AppState,
    user: &AuthenticatedUser,
    id: i64,
    payload: RecipePayload,
    partial: bool,
) -> Result<Json<RecipeDetail>, ApiError> {
    let detail = state
        .recipe_service
        .update(user.id(), id, payload, partial)
        .await?;
    Ok(Json(detail))
}
