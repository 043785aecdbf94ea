//! At most one main piggybank per user, enforced by the store.
//!
//! The engine already checks for an existing main account inside the same DB
//! transaction that inserts a new piggybank; the partial unique index turns a
//! concurrent double insert into a constraint error instead of two mains.

use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let duplicates = db
            .query_all(Statement::from_string(
                backend,
                "SELECT user_id FROM piggybanks WHERE is_main_piggybank = 1 GROUP BY user_id HAVING COUNT(*) > 1;".to_string(),
            ))
            .await?;
        if let Some(row) = duplicates.first() {
            let user_id: String = row.try_get("", "user_id")?;
            return Err(DbErr::Custom(format!(
                "cannot enforce single main piggybank: user '{user_id}' has more than one"
            )));
        }

        db.execute(Statement::from_string(
            backend,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"idx-piggybanks-user_id-main\" ON piggybanks (user_id) WHERE is_main_piggybank = 1;"
                .to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "DROP INDEX IF EXISTS \"idx-piggybanks-user_id-main\";".to_string(),
        ))
        .await?;
        Ok(())
    }
}
