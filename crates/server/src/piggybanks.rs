//! Piggybank API endpoints

use api_types::piggybank::{
    LedgerCheck, MonthlyBalance, PiggybankDeleted, PiggybankListResponse, PiggybankNew,
    PiggybankSummary, PiggybankTransactionKind as ApiKind, PiggybankTransactionListResponse,
    PiggybankTransactionNew, PiggybankTransactionView, PiggybankUpdate, PiggybankView,
    TransferNew, TransferView,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath},
    server::ServerState,
    user,
};

fn map_kind(kind: engine::PiggybankTransactionKind) -> ApiKind {
    match kind {
        engine::PiggybankTransactionKind::Deposit => ApiKind::Deposit,
        engine::PiggybankTransactionKind::Withdrawal => ApiKind::Withdrawal,
        engine::PiggybankTransactionKind::Transfer => ApiKind::Transfer,
        engine::PiggybankTransactionKind::MonthlyBalance => ApiKind::MonthlyBalance,
    }
}

fn map_api_kind(kind: ApiKind) -> engine::PiggybankTransactionKind {
    match kind {
        ApiKind::Deposit => engine::PiggybankTransactionKind::Deposit,
        ApiKind::Withdrawal => engine::PiggybankTransactionKind::Withdrawal,
        ApiKind::Transfer => engine::PiggybankTransactionKind::Transfer,
        ApiKind::MonthlyBalance => engine::PiggybankTransactionKind::MonthlyBalance,
    }
}

fn piggybank_view(piggybank: engine::Piggybank) -> PiggybankView {
    PiggybankView {
        id: piggybank.id,
        percentage_to_target: piggybank.percentage_to_target(),
        remaining_to_target_minor: piggybank.remaining_to_target_minor(),
        name: piggybank.name,
        description: piggybank.description,
        amount_minor: piggybank.amount_minor,
        target_amount_minor: piggybank.target_amount_minor,
        is_main_piggybank: piggybank.is_main,
        created_at: piggybank.created_at,
        updated_at: piggybank.updated_at,
    }
}

fn entry_view(
    tx: engine::PiggybankTransaction,
    piggybank_name: String,
    source_piggybank_name: Option<String>,
) -> PiggybankTransactionView {
    PiggybankTransactionView {
        id: tx.id,
        piggybank_id: tx.piggybank_id,
        piggybank_name,
        source_piggybank_id: tx.source_piggybank_id,
        source_piggybank_name,
        amount_minor: tx.amount_minor,
        signed_amount_minor: tx.signed_amount_minor(),
        kind: map_kind(tx.kind),
        description: tx.description,
        created_at: tx.created_at,
    }
}

fn transaction_view(entry: engine::PiggybankTransactionEntry) -> PiggybankTransactionView {
    entry_view(
        entry.transaction,
        entry.piggybank_name,
        entry.source_piggybank_name,
    )
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<PiggybankListResponse>, ServerError> {
    let piggybanks = state.engine.list_piggybanks(&user.username).await?;
    Ok(Json(PiggybankListResponse {
        piggybanks: piggybanks.into_iter().map(piggybank_view).collect(),
    }))
}

pub async fn summary(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<PiggybankSummary>, ServerError> {
    let summary = state.engine.piggybank_summary(&user.username).await?;
    Ok(Json(PiggybankSummary {
        total_amount_minor: summary.total_amount_minor,
        count: summary.count,
        main_amount_minor: summary.main_amount_minor,
        piggybanks: summary.piggybanks.into_iter().map(piggybank_view).collect(),
    }))
}

/// Handle requests for creating a new piggybank
pub async fn piggybank_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<PiggybankNew>,
) -> Result<(StatusCode, Json<PiggybankView>), ServerError> {
    let mut cmd = engine::NewPiggybankCmd::new(user.username.clone(), payload.name)
        .target_amount_minor(payload.target_amount_minor.unwrap_or(0))
        .initial_amount_minor(payload.initial_amount_minor.unwrap_or(0));
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let piggybank = state.engine.new_piggybank(cmd).await?;
    Ok((StatusCode::CREATED, Json(piggybank_view(piggybank))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PiggybankView>, ServerError> {
    let piggybank = state.engine.piggybank(&user.username, id).await?;
    Ok(Json(piggybank_view(piggybank)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PiggybankUpdate>,
) -> Result<Json<PiggybankView>, ServerError> {
    let mut cmd = engine::UpdatePiggybankCmd::new(
        user.username.clone(),
        id,
        payload.name,
        payload.target_amount_minor,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let piggybank = state.engine.update_piggybank(cmd).await?;
    Ok(Json(piggybank_view(piggybank)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PiggybankDeleted>, ServerError> {
    let deleted = state.engine.delete_piggybank(&user.username, id).await?;
    Ok(Json(PiggybankDeleted {
        id: deleted.piggybank_id,
        migrated_minor: deleted.migrated_minor,
        main_piggybank_id: deleted.main_piggybank_id,
    }))
}

pub async fn list_transactions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PiggybankTransactionListResponse>, ServerError> {
    let entries = state
        .engine
        .list_piggybank_transactions(&user.username, id)
        .await?;
    Ok(Json(PiggybankTransactionListResponse {
        transactions: entries.into_iter().map(transaction_view).collect(),
    }))
}

pub async fn transaction_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PiggybankTransactionNew>,
) -> Result<(StatusCode, Json<PiggybankTransactionView>), ServerError> {
    let mut cmd = engine::PiggybankTransactionCmd::new(
        user.username.clone(),
        id,
        map_api_kind(payload.kind),
        payload.amount_minor,
        payload.description,
    );
    if let Some(source) = payload.source_piggybank_id {
        cmd = cmd.source_piggybank_id(source);
    }

    let entry = state.engine.new_piggybank_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(entry))))
}

pub async fn transfer(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TransferNew>,
) -> Result<Json<TransferView>, ServerError> {
    let mut cmd = engine::TransferCmd::new(
        user.username.clone(),
        payload.source_piggybank_id,
        payload.destination_piggybank_id,
        payload.amount_minor,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let receipt = state.engine.transfer(cmd).await?;
    Ok(Json(TransferView {
        outgoing: entry_view(receipt.outgoing, receipt.source_name.clone(), None),
        incoming: entry_view(
            receipt.incoming,
            receipt.destination_name,
            Some(receipt.source_name),
        ),
        source_amount_minor: receipt.source_amount_minor,
        destination_amount_minor: receipt.destination_amount_minor,
    }))
}

pub async fn calculate_monthly_balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<MonthlyBalance>, ServerError> {
    let summary = state
        .engine
        .recompute_monthly_balance(&user.username)
        .await?;
    Ok(Json(MonthlyBalance {
        total_savings_minor: summary.total_savings_minor,
        months_processed: summary.months_processed,
        main_piggybank_id: summary.main_piggybank_id,
    }))
}

pub async fn ledger_check(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LedgerCheck>, ServerError> {
    let check = state
        .engine
        .verify_piggybank_ledger(&user.username, id)
        .await?;
    Ok(Json(LedgerCheck {
        piggybank_id: check.piggybank_id,
        cached_minor: check.cached_minor,
        derived_minor: check.derived_minor,
        consistent: check.is_consistent(),
    }))
}
