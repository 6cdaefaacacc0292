//! Handlers shared by `/tags` and `/ingredients`. Each router is layered with
//! an `Extension<LabelKind>` naming the collection it serves.

use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::errors::ApiError;
use crate::models::label::{LabelKind, LabelListQuery, LabelPayload, LabelView};
use crate::routes::auth::AuthenticatedUser;
use crate::startup::AppState;

#[instrument(name = "HTTP: List labels", skip_all, fields(kind = kind.as_str(), user_id = user.id()))]
pub async fn list_labels(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<LabelListQuery>,
) -> Result<Json<Vec<LabelView>>, ApiError> {
    let labels = state
        .labels(kind)
        .list(user.id(), query.assigned_only != 0)
        .await?;
    Ok(Json(labels))
}

#[instrument(name = "HTTP: Label detail", skip(state, user), fields(user_id = user.id()))]
pub async fn get_label(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<LabelView>, ApiError> {
    Ok(Json(state.labels(kind).detail(user.id(), id).await?))
}

#[instrument(name = "HTTP: Rename label", skip(state, user, payload), fields(user_id = user.id()))]
pub async fn update_label(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<LabelPayload>,
) -> Result<Json<LabelView>, ApiError> {
    Ok(Json(state.labels(kind).rename(user.id(), id, payload).await?))
}

#[instrument(name = "HTTP: Delete label", skip(state, user), fields(user_id = user.id()))]
pub async fn delete_label(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.labels(kind).delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
