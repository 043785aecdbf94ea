//! Monthly balance sweep.
//!
//! Replays the whole income/expense ledger of a user one calendar month at a
//! time and deposits each month's positive net into the main piggybank. The
//! previous sweep's `MonthlyBalance` entries are replaced on every run, which
//! makes the sweep re-runnable without double counting.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, PiggybankTransaction, PiggybankTransactionKind, ResultEngine, Transaction,
    TransactionKind, piggybank_transactions, transactions, util::parse_uuid,
};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyBalanceSummary {
    pub total_savings_minor: i64,
    /// Months walked, including those with no surplus.
    pub months_processed: u32,
    pub main_piggybank_id: Uuid,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MonthTotals {
    income_minor: i64,
    expense_minor: i64,
}

impl MonthTotals {
    fn balance_minor(self) -> i64 {
        self.income_minor - self.expense_minor
    }
}

fn first_of_month(date: NaiveDate) -> ResultEngine<NaiveDate> {
    date.with_day(1)
        .ok_or_else(|| EngineError::InvalidDate(format!("no first day for {date}")))
}

fn next_month(date: NaiveDate) -> ResultEngine<NaiveDate> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| EngineError::InvalidDate(format!("month after {date} out of range")))
}

fn month_label(month: NaiveDate) -> String {
    format!("monthly balance {:02}/{}", month.month(), month.year())
}

/// Sum income and expense per calendar month (UTC date of the transaction).
fn bucket_by_month(
    transactions: &[Transaction],
) -> ResultEngine<BTreeMap<NaiveDate, MonthTotals>> {
    let mut months: BTreeMap<NaiveDate, MonthTotals> = BTreeMap::new();
    for tx in transactions {
        let month = first_of_month(tx.date.date_naive())?;
        let totals = months.entry(month).or_default();
        let slot = match tx.kind {
            TransactionKind::Income => &mut totals.income_minor,
            TransactionKind::Expense => &mut totals.expense_minor,
        };
        *slot = slot
            .checked_add(tx.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
    }
    Ok(months)
}

impl Engine {
    /// Rebuild the main piggybank from the monthly surpluses up to the
    /// current month.
    ///
    /// The current month is read from the UTC calendar, the same one used to
    /// bucket transactions, so the newest month is never cut off.
    pub async fn recompute_monthly_balance(
        &self,
        user_id: &str,
    ) -> ResultEngine<MonthlyBalanceSummary> {
        self.recompute_monthly_balance_as_of(user_id, Utc::now().date_naive())
            .await
    }

    /// Like [`Engine::recompute_monthly_balance`], with `today` (a UTC date)
    /// fixing the last month walked.
    ///
    /// The main piggybank is created when missing. With no transactions the
    /// sweep stops there and nothing else is touched. Otherwise the previous
    /// `MonthlyBalance` entries are dropped, one entry is written per month
    /// with a positive net, and the main balance is overwritten with the
    /// total. Loss months are counted but never subtracted.
    pub async fn recompute_monthly_balance_as_of(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<MonthlyBalanceSummary> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.sweep_monthly_balance(&db_tx, user_id, today, now)
                .await
        })
    }

    async fn sweep_monthly_balance(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultEngine<MonthlyBalanceSummary> {
        let main = self.ensure_main_piggybank(db_tx, user_id, now).await?;
        let main_piggybank_id = parse_uuid(&main.id, "piggybank")?;

        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(transactions::Column::Date)
            .all(db_tx)
            .await?;
        let ledger = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let Some(first) = ledger.first() else {
            return Ok(MonthlyBalanceSummary {
                total_savings_minor: 0,
                months_processed: 0,
                main_piggybank_id,
            });
        };

        piggybank_transactions::Entity::delete_many()
            .filter(piggybank_transactions::Column::PiggybankId.eq(main.id.clone()))
            .filter(
                piggybank_transactions::Column::Kind
                    .eq(PiggybankTransactionKind::MonthlyBalance.as_str()),
            )
            .exec(db_tx)
            .await?;

        let months = bucket_by_month(&ledger)?;
        let mut cursor = first_of_month(first.date.date_naive())?;
        let horizon = first_of_month(today)?;
        let mut total_savings_minor: i64 = 0;
        let mut months_processed: u32 = 0;

        while cursor <= horizon {
            months_processed += 1;
            let balance_minor = months
                .get(&cursor)
                .copied()
                .unwrap_or_default()
                .balance_minor();
            tracing::debug!(user_id, month = %cursor, balance_minor, "month processed");
            if balance_minor > 0 {
                let entry = PiggybankTransaction::new(
                    user_id.to_string(),
                    main_piggybank_id,
                    None,
                    balance_minor,
                    month_label(cursor),
                    PiggybankTransactionKind::MonthlyBalance,
                    now,
                )?;
                piggybank_transactions::ActiveModel::from(&entry)
                    .insert(db_tx)
                    .await?;
                total_savings_minor = total_savings_minor
                    .checked_add(balance_minor)
                    .ok_or_else(|| {
                        EngineError::InvalidAmount("amount overflow".to_string())
                    })?;
            }
            cursor = next_month(cursor)?;
        }

        self.set_piggybank_amount(db_tx, &main.id, total_savings_minor, now)
            .await?;

        tracing::info!(
            user_id,
            months_processed,
            total_savings_minor,
            "monthly balance recomputed"
        );
        Ok(MonthlyBalanceSummary {
            total_savings_minor,
            months_processed,
            main_piggybank_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionKind, amount_minor: i64, y: i32, m: u32, d: u32) -> Transaction {
        let at = Utc.with_ymd_and_hms(y, m, d, 23, 59, 59).unwrap();
        Transaction {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            category_id: Uuid::new_v4(),
            description: "test".to_string(),
            amount_minor,
            kind,
            date: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn month_helpers() {
        assert_eq!(first_of_month(date(2024, 2, 29)).unwrap(), date(2024, 2, 1));
        assert_eq!(next_month(date(2024, 12, 1)).unwrap(), date(2025, 1, 1));
        assert_eq!(month_label(date(2024, 3, 1)), "monthly balance 03/2024");
    }

    #[test]
    fn last_day_of_month_lands_in_its_month() {
        let months = bucket_by_month(&[
            tx(TransactionKind::Income, 100_00, 2024, 1, 31),
            tx(TransactionKind::Expense, 30_00, 2024, 1, 31),
            tx(TransactionKind::Income, 5_00, 2024, 2, 1),
        ])
        .unwrap();

        assert_eq!(months.len(), 2);
        assert_eq!(months[&date(2024, 1, 1)].balance_minor(), 70_00);
        assert_eq!(months[&date(2024, 2, 1)].balance_minor(), 5_00);
    }
}
