use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Piggybank, ResultEngine, categories, piggybank_transactions,
    piggybank_transactions::PiggybankTransaction, piggybanks, transactions,
};

use super::Engine;

pub(super) const MAIN_PIGGYBANK_NAME: &str = "Main piggybank";
const MAIN_PIGGYBANK_DESCRIPTION: &str = "Collects each month's positive balance automatically";

impl Engine {
    pub(super) async fn require_piggybank(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        piggybank_id: Uuid,
    ) -> ResultEngine<piggybanks::Model> {
        piggybanks::Entity::find_by_id(piggybank_id.to_string())
            .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("piggybank not exists".to_string()))
    }

    pub(super) async fn find_main_piggybank(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<piggybanks::Model>> {
        piggybanks::Entity::find()
            .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
            .filter(piggybanks::Column::IsMainPiggybank.eq(true))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Return the user's main piggybank, creating an empty one when missing.
    pub(super) async fn ensure_main_piggybank(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<piggybanks::Model> {
        if let Some(main) = self.find_main_piggybank(db, user_id).await? {
            return Ok(main);
        }

        let main = Piggybank::new(
            user_id.to_string(),
            MAIN_PIGGYBANK_NAME.to_string(),
            Some(MAIN_PIGGYBANK_DESCRIPTION.to_string()),
            0,
            true,
            now,
        );
        let model = piggybanks::ActiveModel::from(&main).insert(db).await?;
        tracing::info!(user_id, piggybank_id = %main.id, "main piggybank created");
        Ok(model)
    }

    pub(super) async fn count_piggybanks(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<u64> {
        piggybanks::Entity::find()
            .filter(piggybanks::Column::UserId.eq(user_id.to_string()))
            .count(db)
            .await
            .map_err(Into::into)
    }

    /// A category is visible when the user owns it or it is a shared default.
    pub(super) async fn require_category_visible(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.eq(user_id.to_string()))
                    .add(categories::Column::UserId.is_null()),
            )
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Insert a log entry and move the piggybank's cached balance by the
    /// entry's signed effect.
    pub(super) async fn append_log_entry(
        &self,
        db: &DatabaseTransaction,
        piggybank: &piggybanks::Model,
        entry: &PiggybankTransaction,
    ) -> ResultEngine<piggybanks::Model> {
        let amount_minor = piggybank
            .amount_minor
            .checked_add(entry.signed_amount_minor())
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;

        piggybank_transactions::ActiveModel::from(entry)
            .insert(db)
            .await?;

        self.set_piggybank_amount(db, &piggybank.id, amount_minor, entry.created_at)
            .await
    }

    pub(super) async fn set_piggybank_amount(
        &self,
        db: &DatabaseTransaction,
        piggybank_id: &str,
        amount_minor: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<piggybanks::Model> {
        let active = piggybanks::ActiveModel {
            id: ActiveValue::Set(piggybank_id.to_string()),
            amount_minor: ActiveValue::Set(amount_minor),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        active.update(db).await.map_err(Into::into)
    }
}
