use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use chrono::Utc;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    server::app(engine, db)
}

fn basic(username: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

async fn send_as(
    app: &Router,
    auth: &str,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_raw(app, auth, method, uri, body.map(|body| body.to_string())).await
}

/// Non-JSON response bodies come back as `Value::String`.
async fn send_raw(
    app: &Router,
    auth: &str,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, &basic("alice", "password"), method, uri, body).await
}

async fn category_id(app: &Router, name: &str) -> String {
    let (status, body) = send(app, Method::GET, "/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app().await;

    let (status, _) = send_as(
        &app,
        &basic("alice", "nope"),
        Method::GET,
        "/piggybanks",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn piggybank_lifecycle() {
    let app = test_app().await;

    let (status, trip) = send(
        &app,
        Method::POST,
        "/piggybanks",
        Some(json!({ "name": "Trip", "initial_amount_minor": 10000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(trip["is_main_piggybank"], true);
    assert_eq!(trip["amount_minor"], 10000);
    let trip_id = trip["id"].as_str().unwrap().to_string();

    let (status, car) = send(
        &app,
        Method::POST,
        "/piggybanks",
        Some(json!({ "name": "Car", "target_amount_minor": 400000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(car["is_main_piggybank"], false);
    let car_id = car["id"].as_str().unwrap().to_string();

    let (status, receipt) = send(
        &app,
        Method::POST,
        "/piggybanks/transfer",
        Some(json!({
            "source_piggybank_id": trip_id,
            "destination_piggybank_id": car_id,
            "amount_minor": 4000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["source_amount_minor"], 6000);
    assert_eq!(receipt["destination_amount_minor"], 4000);
    assert_eq!(receipt["incoming"]["source_piggybank_name"], "Trip");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/piggybanks/{car_id}/transactions"),
        Some(json!({ "amount_minor": 4001, "description": "tyres", "kind": "withdrawal" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::DELETE, &format!("/piggybanks/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, deleted) =
        send(&app, Method::DELETE, &format!("/piggybanks/{car_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["migrated_minor"], 4000);

    let (status, summary) = send(&app, Method::GET, "/piggybanks/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["count"], 1);
    assert_eq!(summary["main_amount_minor"], 10000);

    let (status, check) = send(
        &app,
        Method::GET,
        &format!("/piggybanks/{trip_id}/ledger-check"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["consistent"], true);

    let (status, _) = send(&app, Method::GET, &format!("/piggybanks/{car_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn piggybank_validation_errors() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::POST, "/piggybanks", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("name"));

    let (status, body) = send(&app, Method::GET, "/piggybanks/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send_raw(
        &app,
        &basic("alice", "password"),
        Method::POST,
        "/piggybanks",
        Some("{\"name\": ".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/transactions?kind=refund", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn ledger_endpoints_and_monthly_balance() {
    let app = test_app().await;
    let salary = category_id(&app, "Salary").await;
    let food = category_id(&app, "Food").await;

    let (status, pay) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "category_id": salary,
            "description": "pay",
            "amount_minor": 150000,
            "kind": "income",
            "date": "2024-04-15T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let pay_id = pay["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "category_id": food,
            "description": "groceries",
            "amount_minor": 20000,
            "kind": "expense",
            "date": "2024-04-20T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = send(&app, Method::GET, "/transactions?kind=expense", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["transactions"].as_array().unwrap().len(), 1);

    let (status, report) =
        send(&app, Method::GET, "/transactions/monthly-report/2024/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["balance_minor"], 130000);
    assert_eq!(report["expense_categories"][0]["name"], "Food");

    let (status, summary) = send(&app, Method::GET, "/transactions/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_income_minor"], 150000);
    assert_eq!(summary["total_expenses_minor"], 20000);

    let (status, _) = send(&app, Method::DELETE, &format!("/transactions/{pay_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/transactions/{pay_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "category_id": salary,
            "description": "bonus",
            "amount_minor": 50000,
            "kind": "income",
            "date": Utc::now().to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, sweep) = send(
        &app,
        Method::POST,
        "/piggybanks/calculate-monthly-balance",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(sweep["months_processed"].as_u64().unwrap() >= 1);

    let (status, piggybanks) = send(&app, Method::GET, "/piggybanks", None).await;
    assert_eq!(status, StatusCode::OK);
    let piggybanks = piggybanks["piggybanks"].as_array().unwrap();
    assert_eq!(piggybanks.len(), 1);
    assert_eq!(piggybanks[0]["is_main_piggybank"], true);
    assert_eq!(piggybanks[0]["amount_minor"], sweep["total_savings_minor"]);
}

#[tokio::test]
async fn category_conflicts_are_reported() {
    let app = test_app().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/categories",
        Some(json!({ "name": "Pets" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_default"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/categories",
        Some(json!({ "name": "pets" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_crud_and_public_defaults() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/categories/default")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let defaults: Value = serde_json::from_slice(&bytes).unwrap();
    let defaults = defaults["categories"].as_array().unwrap();
    assert_eq!(defaults.len(), 7);
    assert!(defaults.iter().all(|c| c["is_default"] == true));

    let (status, pets) = send(
        &app,
        Method::POST,
        "/categories",
        Some(json!({ "name": "Pets", "color": "#112233" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let pets_id = pets["id"].as_str().unwrap().to_string();

    let (status, renamed) = send(
        &app,
        Method::PUT,
        &format!("/categories/{pets_id}"),
        Some(json!({ "name": "Animals", "icon": "pets" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Animals");
    assert_eq!(renamed["icon"], "pets");

    let (status, fetched) = send(&app, Method::GET, &format!("/categories/{pets_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Animals");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/categories/{pets_id}"),
        Some(json!({ "name": "Animals", "color": "blue" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let food = category_id(&app, "Food").await;
    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{food}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "category_id": pets_id,
            "description": "vet",
            "amount_minor": 8000,
            "kind": "expense",
            "date": "2024-04-20T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{pets_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, unused) = send(
        &app,
        Method::POST,
        "/categories",
        Some(json!({ "name": "Hobbies" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let unused_id = unused["id"].as_str().unwrap().to_string();
    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{unused_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/categories/{unused_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn budget_endpoints_and_alerts() {
    let app = test_app().await;
    let food = category_id(&app, "Food").await;
    let today = Utc::now().date_naive().to_string();

    let (status, budget) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(json!({
            "category_id": food,
            "name": "Groceries",
            "amount_minor": 10000,
            "start_date": today,
            "end_date": today,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(budget["spent_minor"], 0);
    assert_eq!(budget["category_name"], "Food");
    let budget_id = budget["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/budgets",
        Some(json!({
            "category_id": food,
            "name": "Overlap",
            "amount_minor": 5000,
            "start_date": today,
            "end_date": today,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "category_id": food,
            "description": "market",
            "amount_minor": 9000,
            "kind": "expense",
            "date": Utc::now().to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = send(&app, Method::GET, &format!("/budgets/{budget_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["spent_minor"], 9000);
    assert_eq!(fetched["remaining_minor"], 1000);
    assert_eq!(fetched["percentage_used"], 90.0);

    let (status, alerts) = send(&app, Method::GET, "/budgets/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts["alerts"][0]["budget_id"], budget_id.as_str());
    assert_eq!(alerts["alerts"][0]["level"], "warning");

    let (status, paused) = send(
        &app,
        Method::PUT,
        &format!("/budgets/{budget_id}"),
        Some(json!({
            "category_id": food,
            "name": "Groceries",
            "amount_minor": 10000,
            "start_date": today,
            "end_date": today,
            "is_active": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["is_active"], false);

    let (status, active) = send(&app, Method::GET, "/budgets?active_only=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(active["budgets"].as_array().unwrap().is_empty());
    let (status, all) = send(&app, Method::GET, "/budgets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["budgets"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/categories/{food}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/budgets/{budget_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/budgets/{budget_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
