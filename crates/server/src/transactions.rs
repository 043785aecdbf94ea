//! Transactions API endpoints

use api_types::transaction::{
    CategoryTotal, MonthlyReport, TransactionKind as ApiKind, TransactionListQuery,
    TransactionListResponse, TransactionNew, TransactionSummary, TransactionView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath, ApiQuery},
    server::ServerState,
    user,
};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn map_api_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Income => engine::TransactionKind::Income,
        ApiKind::Expense => engine::TransactionKind::Expense,
    }
}

fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        category_id: tx.category_id,
        description: tx.description,
        amount_minor: tx.amount_minor,
        kind: map_kind(tx.kind),
        date: tx.date,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

fn category_total(total: engine::CategoryTotal) -> CategoryTotal {
    CategoryTotal {
        category_id: total.category_id,
        name: total.name,
        kind: map_kind(total.kind),
        total_minor: total.total_minor,
        count: total.count,
    }
}

fn summary_view(summary: engine::TransactionSummary) -> TransactionSummary {
    TransactionSummary {
        total_income_minor: summary.total_income_minor,
        total_expenses_minor: summary.total_expense_minor,
        balance_minor: summary.balance_minor,
        transaction_count: summary.transaction_count,
        categories: summary.categories.into_iter().map(category_total).collect(),
    }
}

fn new_cmd(username: &str, payload: TransactionNew) -> engine::NewTransactionCmd {
    engine::NewTransactionCmd::new(
        username,
        payload.category_id,
        map_api_kind(payload.kind),
        payload.amount_minor,
        payload.date.with_timezone(&Utc),
    )
    .description(payload.description)
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = engine::TransactionListFilter {
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        kind: query.kind.map(map_api_kind),
        category_id: query.category_id,
    };

    let txs = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?;
    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(transaction_view).collect(),
    }))
}

/// Record an income or expense. The main piggybank follows the new ledger
/// balance.
pub async fn transaction_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .engine
        .new_transaction(new_cmd(&user.username, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(&user.username, id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TransactionNew>,
) -> Result<Json<TransactionView>, ServerError> {
    let cmd = engine::UpdateTransactionCmd::new(id, new_cmd(&user.username, payload));
    let tx = state.engine.update_transaction(cmd).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Result<Json<TransactionSummary>, ServerError> {
    let summary = state
        .engine
        .transaction_summary(
            &user.username,
            query.from.map(|dt| dt.with_timezone(&Utc)),
            query.to.map(|dt| dt.with_timezone(&Utc)),
        )
        .await?;
    Ok(Json(summary_view(summary)))
}

pub async fn monthly_report(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath((year, month)): ApiPath<(i32, u32)>,
) -> Result<Json<MonthlyReport>, ServerError> {
    let report = state
        .engine
        .monthly_report(&user.username, year, month)
        .await?;
    Ok(Json(MonthlyReport {
        year: report.year,
        month: report.month,
        summary: summary_view(report.summary),
        income_categories: report
            .income_categories
            .into_iter()
            .map(category_total)
            .collect(),
        expense_categories: report
            .expense_categories
            .into_iter()
            .map(category_total)
            .collect(),
    }))
}
