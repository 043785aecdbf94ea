use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{EngineError, Piggybank, ResultEngine, TransactionKind, transactions};

use super::{Engine, with_tx};

impl Engine {
    /// Overwrite the main piggybank balance with the ledger balance
    /// (total income minus total expense).
    ///
    /// No log entry is written, so the main piggybank stops matching its log
    /// after a sync. Returns `None` when the user has no main piggybank.
    pub async fn sync_main_piggybank(&self, user_id: &str) -> ResultEngine<Option<Piggybank>> {
        with_tx!(self, |db_tx| {
            self.sync_main_piggybank_in_tx(&db_tx, user_id).await
        })
    }

    pub(super) async fn sync_main_piggybank_in_tx(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<Piggybank>> {
        let Some(main) = self.find_main_piggybank(db, user_id).await? else {
            return Ok(None);
        };

        let balance_minor = self.ledger_balance(db, user_id).await?;
        let model = self
            .set_piggybank_amount(db, &main.id, balance_minor, Utc::now())
            .await?;
        tracing::debug!(user_id, balance_minor, "main piggybank synced with ledger");
        Piggybank::try_from(model).map(Some)
    }

    /// Total income minus total expense over the whole ledger of a user.
    pub(super) async fn ledger_balance(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<i64> {
        let totals: Vec<(String, Option<i64>)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(
                Expr::col(transactions::Column::AmountMinor).sum(),
                "total",
            )
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .group_by(transactions::Column::Kind)
            .into_tuple()
            .all(db)
            .await?;

        let mut balance_minor: i64 = 0;
        for (kind, total) in totals {
            let total = total.unwrap_or(0);
            let signed = match TransactionKind::try_from(kind.as_str())? {
                TransactionKind::Income => total,
                TransactionKind::Expense => -total,
            };
            balance_minor = balance_minor
                .checked_add(signed)
                .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        }
        Ok(balance_minor)
    }
}
