//! Seeds the shared default categories (rows without an owner).

use chrono::Utc;
use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

const DEFAULTS: &[(&str, &str, &str)] = &[
    ("Salary", "#16A34A", "payments"),
    ("Food", "#F97316", "restaurant"),
    ("Housing", "#0EA5E9", "home"),
    ("Transport", "#6366F1", "directions_car"),
    ("Health", "#EF4444", "favorite"),
    ("Leisure", "#EAB308", "celebration"),
    ("Other", "#3B82F6", "category"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let now = Utc::now();

        for (name, color, icon) in DEFAULTS {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO categories (id, user_id, name, description, color, icon, is_default, created_at, updated_at) \
                 SELECT ?, NULL, ?, NULL, ?, ?, 1, ?, ? \
                 WHERE NOT EXISTS (SELECT 1 FROM categories WHERE user_id IS NULL AND lower(name) = lower(?));",
                vec![
                    Uuid::new_v4().to_string().into(),
                    (*name).into(),
                    (*color).into(),
                    (*icon).into(),
                    now.into(),
                    now.into(),
                    (*name).into(),
                ],
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "DELETE FROM categories WHERE user_id IS NULL AND is_default = 1;".to_string(),
        ))
        .await?;
        Ok(())
    }
}
