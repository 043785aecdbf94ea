//! Budget API endpoints

use api_types::budget::{
    BudgetAlert, BudgetAlertLevel, BudgetAlertListResponse, BudgetListQuery, BudgetListResponse,
    BudgetNew, BudgetUpdate, BudgetView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath, ApiQuery},
    server::ServerState,
    user,
};

fn map_level(level: engine::BudgetAlertLevel) -> BudgetAlertLevel {
    match level {
        engine::BudgetAlertLevel::Warning => BudgetAlertLevel::Warning,
        engine::BudgetAlertLevel::Exceeded => BudgetAlertLevel::Exceeded,
    }
}

fn budget_view(status: engine::BudgetStatus) -> BudgetView {
    let remaining_minor = status.remaining_minor();
    let percentage_used = status.percentage_used();
    let budget = status.budget;
    BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        category_name: status.category_name,
        category_color: status.category_color,
        category_icon: status.category_icon,
        name: budget.name,
        amount_minor: budget.amount_minor,
        start_date: budget.start_date,
        end_date: budget.end_date,
        is_active: budget.is_active,
        spent_minor: status.spent_minor,
        remaining_minor,
        percentage_used,
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

fn alert_view(status: engine::BudgetStatus) -> Option<BudgetAlert> {
    let level = map_level(status.alert_level()?);
    let percentage_used = status.percentage_used();
    Some(BudgetAlert {
        budget_id: status.budget.id,
        budget_name: status.budget.name,
        category_name: status.category_name,
        amount_minor: status.budget.amount_minor,
        spent_minor: status.spent_minor,
        percentage_used,
        level,
    })
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<BudgetListQuery>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let budgets = state
        .engine
        .list_budgets(&user.username, query.active_only.unwrap_or(false))
        .await?;
    Ok(Json(BudgetListResponse {
        budgets: budgets.into_iter().map(budget_view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state.engine.budget(&user.username, id).await?;
    Ok(Json(budget_view(budget)))
}

pub async fn budget_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let cmd = engine::NewBudgetCmd::new(
        user.username.clone(),
        payload.category_id,
        payload.name,
        payload.amount_minor,
        payload.start_date,
        payload.end_date,
    );
    let budget = state.engine.new_budget(cmd).await?;
    Ok((StatusCode::CREATED, Json(budget_view(budget))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let cmd = engine::UpdateBudgetCmd::new(
        id,
        engine::NewBudgetCmd::new(
            user.username.clone(),
            payload.category_id,
            payload.name,
            payload.amount_minor,
            payload.start_date,
            payload.end_date,
        ),
    )
    .active(payload.is_active.unwrap_or(true));
    let budget = state.engine.update_budget(cmd).await?;
    Ok(Json(budget_view(budget)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn alerts(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetAlertListResponse>, ServerError> {
    let alerts = state.engine.budget_alerts(&user.username).await?;
    Ok(Json(BudgetAlertListResponse {
        alerts: alerts.into_iter().filter_map(alert_view).collect(),
    }))
}
