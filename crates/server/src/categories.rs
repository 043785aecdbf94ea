//! Category API endpoints

use api_types::category::{CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath},
    server::ServerState,
    user,
};

fn category_view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        description: category.description,
        color: category.color,
        icon: category.icon,
        is_default: category.is_default,
    }
}

fn category_cmd(username: &str, payload: CategoryNew) -> engine::NewCategoryCmd {
    let mut cmd = engine::NewCategoryCmd::new(username, payload.name);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(color) = payload.color {
        cmd = cmd.color(color);
    }
    if let Some(icon) = payload.icon {
        cmd = cmd.icon(icon);
    }
    cmd
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state.engine.list_categories(&user.username).await?;
    Ok(Json(CategoryListResponse {
        categories: categories.into_iter().map(category_view).collect(),
    }))
}

/// Served without credentials.
pub async fn defaults(
    State(state): State<ServerState>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state.engine.default_categories().await?;
    Ok(Json(CategoryListResponse {
        categories: categories.into_iter().map(category_view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(&user.username, id).await?;
    Ok(Json(category_view(category)))
}

pub async fn category_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .new_category(category_cmd(&user.username, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let cmd = engine::UpdateCategoryCmd::new(id, category_cmd(&user.username, payload));
    let category = state.engine.update_category(cmd).await?;
    Ok(Json(category_view(category)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
