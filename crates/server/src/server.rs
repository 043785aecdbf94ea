use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{budgets, categories, piggybanks, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Where the HTTP server listens.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Resolve the Basic-auth credentials to a user and attach it to the request.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/piggybanks",
            get(piggybanks::list).post(piggybanks::piggybank_new),
        )
        .route("/piggybanks/summary", get(piggybanks::summary))
        .route("/piggybanks/transfer", post(piggybanks::transfer))
        .route(
            "/piggybanks/calculate-monthly-balance",
            post(piggybanks::calculate_monthly_balance),
        )
        .route(
            "/piggybanks/{id}",
            get(piggybanks::get)
                .put(piggybanks::update)
                .delete(piggybanks::delete),
        )
        .route(
            "/piggybanks/{id}/transactions",
            get(piggybanks::list_transactions).post(piggybanks::transaction_new),
        )
        .route("/piggybanks/{id}/ledger-check", get(piggybanks::ledger_check))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::transaction_new),
        )
        .route("/transactions/summary", get(transactions::summary))
        .route(
            "/transactions/monthly-report/{year}/{month}",
            get(transactions::monthly_report),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::category_new),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/budgets",
            get(budgets::list).post(budgets::budget_new),
        )
        .route("/budgets/alerts", get(budgets::alerts))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .put(budgets::update)
                .delete(budgets::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Added after the auth layer, so it is public.
        .route("/categories/default", get(categories::defaults))
        .with_state(state)
}

/// Build the router for an engine and the connection used to resolve users.
pub fn app(engine: Engine, db: DatabaseConnection) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

pub async fn run(engine: Engine, db: DatabaseConnection, config: ServerConfig) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, db)).await
}
