use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BudgetAlertLevel, Engine, EngineError, NewBudgetCmd, NewCategoryCmd, NewTransactionCmd,
    UpdateBudgetCmd, UpdateCategoryCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn category_id(engine: &Engine, user_id: &str, name: &str) -> Uuid {
    engine
        .list_categories(user_id)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .id
}

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, d).unwrap()
}

async fn spend(engine: &Engine, category: Uuid, amount_minor: i64, month: u32, d: u32, hour: u32) {
    let date = Utc.with_ymd_and_hms(2024, month, d, hour, 0, 0).unwrap();
    engine
        .new_transaction(
            NewTransactionCmd::expense("alice", category, amount_minor, date).description("shop"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn spent_counts_expenses_of_the_category_inside_the_period() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;
    let housing = category_id(&engine, "alice", "Housing").await;
    let salary = category_id(&engine, "alice", "Salary").await;

    let budget = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Groceries", 200_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    assert_eq!(budget.spent_minor, 0);
    assert_eq!(budget.category_name, "Food");

    spend(&engine, food, 50_00, 3, 1, 0).await;
    spend(&engine, food, 30_00, 3, 31, 23).await;
    spend(&engine, food, 99_00, 4, 1, 0).await;
    spend(&engine, food, 99_00, 2, 29, 23).await;
    spend(&engine, housing, 99_00, 3, 10, 12).await;
    engine
        .new_transaction(
            NewTransactionCmd::income(
                "alice",
                salary,
                99_00,
                Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            )
            .description("pay"),
        )
        .await
        .unwrap();

    let status = engine.budget("alice", budget.budget.id).await.unwrap();
    assert_eq!(status.spent_minor, 80_00);
    assert_eq!(status.remaining_minor(), 120_00);
    assert_eq!(status.percentage_used(), 40.0);
    assert_eq!(status.alert_level(), None);
}

#[tokio::test]
async fn budget_input_is_validated() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;

    let err = engine
        .new_budget(NewBudgetCmd::new("alice", food, " ", 10_00, day(3, 1), day(3, 31)))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Food", 0, day(3, 1), day(3, 31)))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Food", 10_00, day(3, 2), day(3, 1)))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let pets = engine
        .new_category(NewCategoryCmd::new("bob", "Pets"))
        .await
        .unwrap();
    let err = engine
        .new_budget(NewBudgetCmd::new("alice", pets.id, "Vet", 10_00, day(3, 1), day(3, 31)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("category not exists".to_string()));

    assert!(engine.list_budgets("alice", false).await.unwrap().is_empty());
}

#[tokio::test]
async fn active_budgets_of_a_category_must_not_overlap() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;
    let housing = category_id(&engine, "alice", "Housing").await;

    let march = engine
        .new_budget(NewBudgetCmd::new("alice", food, "March", 100_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();

    let err = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Late", 100_00, day(3, 31), day(4, 30)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine
        .new_budget(NewBudgetCmd::new("alice", food, "April", 100_00, day(4, 1), day(4, 30)))
        .await
        .unwrap();
    engine
        .new_budget(NewBudgetCmd::new("alice", housing, "Rent", 900_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    engine
        .new_budget(NewBudgetCmd::new("bob", food, "March", 100_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();

    let paused = engine
        .update_budget(
            UpdateBudgetCmd::new(
                march.budget.id,
                NewBudgetCmd::new("alice", food, "March", 150_00, day(3, 1), day(3, 31)),
            )
            .active(false),
        )
        .await
        .unwrap();
    assert!(!paused.budget.is_active);
    assert_eq!(paused.budget.amount_minor, 150_00);

    engine
        .new_budget(NewBudgetCmd::new("alice", food, "Spring", 100_00, day(3, 15), day(3, 31)))
        .await
        .unwrap();

    let err = engine
        .update_budget(UpdateBudgetCmd::new(
            march.budget.id,
            NewBudgetCmd::new("alice", food, "March", 150_00, day(3, 1), day(3, 31)),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    assert_eq!(engine.list_budgets("alice", false).await.unwrap().len(), 4);
    assert_eq!(engine.list_budgets("alice", true).await.unwrap().len(), 3);
    assert_eq!(engine.list_budgets("bob", false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn alerts_list_running_budgets_over_the_threshold() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;
    let housing = category_id(&engine, "alice", "Housing").await;
    let transport = category_id(&engine, "alice", "Transport").await;

    let groceries = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Groceries", 100_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    let rent = engine
        .new_budget(NewBudgetCmd::new("alice", housing, "Rent", 500_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    engine
        .new_budget(NewBudgetCmd::new("alice", transport, "Bus", 100_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    engine
        .new_budget(NewBudgetCmd::new("alice", food, "April", 10_00, day(4, 1), day(4, 30)))
        .await
        .unwrap();

    spend(&engine, food, 80_00, 3, 5, 12).await;
    spend(&engine, housing, 600_00, 3, 1, 9).await;
    spend(&engine, transport, 79_00, 3, 5, 12).await;
    spend(&engine, food, 50_00, 4, 2, 12).await;

    let alerts = engine.budget_alerts_as_of("alice", day(3, 20)).await.unwrap();
    let ids: Vec<Uuid> = alerts.iter().map(|a| a.budget.id).collect();
    assert_eq!(ids, [rent.budget.id, groceries.budget.id]);
    assert_eq!(alerts[0].alert_level(), Some(BudgetAlertLevel::Exceeded));
    assert_eq!(alerts[0].remaining_minor(), -100_00);
    assert_eq!(alerts[1].alert_level(), Some(BudgetAlertLevel::Warning));

    assert!(engine.budget_alerts_as_of("bob", day(3, 20)).await.unwrap().is_empty());
}

#[tokio::test]
async fn budgets_are_scoped_to_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;

    let budget = engine
        .new_budget(NewBudgetCmd::new("alice", food, "Groceries", 100_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();

    assert!(matches!(
        engine.budget("bob", budget.budget.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine.delete_budget("bob", budget.budget.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));

    engine.delete_budget("alice", budget.budget.id).await.unwrap();
    assert!(matches!(
        engine.budget("alice", budget.budget.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn category_update_and_delete_rules() {
    let (engine, _db) = engine_with_db().await;
    let food = category_id(&engine, "alice", "Food").await;

    let defaults = engine.default_categories().await.unwrap();
    assert_eq!(defaults.len(), 7);
    assert!(defaults.iter().all(|c| c.user_id.is_none()));

    let pets = engine
        .new_category(NewCategoryCmd::new("alice", "Pets"))
        .await
        .unwrap();
    let garden = engine
        .new_category(NewCategoryCmd::new("alice", "Garden"))
        .await
        .unwrap();
    let fetched = engine.category("alice", pets.id).await.unwrap();
    assert_eq!(fetched.name, "Pets");
    assert!(!fetched.is_default);
    assert!(matches!(
        engine.category("bob", pets.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));

    let err = engine
        .new_category(NewCategoryCmd::new("alice", "Tools").color("red"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let renamed = engine
        .update_category(UpdateCategoryCmd::new(
            pets.id,
            NewCategoryCmd::new("alice", "Animals").color("#a0b1c2").icon("pets"),
        ))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Animals");
    assert_eq!(renamed.color, "#a0b1c2");
    assert_eq!(renamed.icon, "pets");

    let same_name = engine
        .update_category(UpdateCategoryCmd::new(
            pets.id,
            NewCategoryCmd::new("alice", "animals"),
        ))
        .await
        .unwrap();
    assert_eq!(same_name.name, "animals");
    assert_eq!(same_name.icon, "category");

    let err = engine
        .update_category(UpdateCategoryCmd::new(
            pets.id,
            NewCategoryCmd::new("alice", "garden"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = engine
        .update_category(UpdateCategoryCmd::new(food, NewCategoryCmd::new("alice", "Meals")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = engine.delete_category("alice", food).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    spend(&engine, pets.id, 20_00, 3, 3, 10).await;
    let err = engine.delete_category("alice", pets.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let budget = engine
        .new_budget(NewBudgetCmd::new("alice", garden.id, "Seeds", 30_00, day(3, 1), day(3, 31)))
        .await
        .unwrap();
    let err = engine.delete_category("alice", garden.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine.delete_budget("alice", budget.budget.id).await.unwrap();
    engine.delete_category("alice", garden.id).await.unwrap();
    assert!(matches!(
        engine.category("alice", garden.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine.delete_category("bob", pets.id).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}
