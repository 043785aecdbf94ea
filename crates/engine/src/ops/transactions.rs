use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Months, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, NewTransactionCmd, ResultEngine, Transaction, TransactionKind,
    UpdateTransactionCmd, transactions,
    util::{normalize_required_description, parse_uuid, require_positive_amount},
};

use super::{Engine, with_tx};

/// Filters for listing ledger transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidDate(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lt(to));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
        }
        self
    }
}

/// Per-category totals inside a summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    pub total_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub total_income_minor: i64,
    pub total_expense_minor: i64,
    pub balance_minor: i64,
    pub transaction_count: u64,
    /// Sorted by total, largest first.
    pub categories: Vec<CategoryTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub summary: TransactionSummary,
    pub income_categories: Vec<CategoryTotal>,
    pub expense_categories: Vec<CategoryTotal>,
}

fn summarize(
    ledger: &[Transaction],
    category_names: &HashMap<Uuid, String>,
) -> ResultEngine<TransactionSummary> {
    let overflow = || EngineError::InvalidAmount("amount overflow".to_string());
    let mut total_income_minor: i64 = 0;
    let mut total_expense_minor: i64 = 0;
    let mut per_category: BTreeMap<(Uuid, &'static str), CategoryTotal> = BTreeMap::new();

    for tx in ledger {
        match tx.kind {
            TransactionKind::Income => {
                total_income_minor = total_income_minor
                    .checked_add(tx.amount_minor)
                    .ok_or_else(overflow)?;
            }
            TransactionKind::Expense => {
                total_expense_minor = total_expense_minor
                    .checked_add(tx.amount_minor)
                    .ok_or_else(overflow)?;
            }
        }

        let entry = per_category
            .entry((tx.category_id, tx.kind.as_str()))
            .or_insert_with(|| CategoryTotal {
                category_id: tx.category_id,
                name: category_names
                    .get(&tx.category_id)
                    .cloned()
                    .unwrap_or_default(),
                kind: tx.kind,
                total_minor: 0,
                count: 0,
            });
        entry.total_minor = entry
            .total_minor
            .checked_add(tx.amount_minor)
            .ok_or_else(overflow)?;
        entry.count += 1;
    }

    let mut categories: Vec<CategoryTotal> = per_category.into_values().collect();
    categories.sort_by(|a, b| b.total_minor.cmp(&a.total_minor));

    Ok(TransactionSummary {
        total_income_minor,
        total_expense_minor,
        balance_minor: total_income_minor - total_expense_minor,
        transaction_count: ledger.len() as u64,
        categories,
    })
}

fn month_range(year: i32, month: u32) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || EngineError::InvalidDate(format!("invalid month: {year}-{month:02}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(invalid)?;
    let from = first.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
    let to = next.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
    Ok((from, to))
}

impl Engine {
    /// Record an income or expense.
    ///
    /// The main piggybank is synced with the ledger balance in the same DB
    /// transaction.
    pub async fn new_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Transaction> {
        require_positive_amount(cmd.amount_minor, "amount")?;
        let description = normalize_required_description(&cmd.description)?;

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_category_visible(&db_tx, &cmd.user_id, cmd.category_id)
                .await?;

            let tx = Transaction {
                id: Uuid::new_v4(),
                user_id: cmd.user_id.clone(),
                category_id: cmd.category_id,
                description,
                amount_minor: cmd.amount_minor,
                kind: cmd.kind,
                date: cmd.date,
                created_at: now,
                updated_at: now,
            };
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.sync_main_piggybank_in_tx(&db_tx, &cmd.user_id).await?;

            tracing::debug!(
                user_id = %cmd.user_id,
                transaction_id = %tx.id,
                kind = tx.kind.as_str(),
                "ledger transaction created"
            );
            Ok(tx)
        })
    }

    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        require_positive_amount(cmd.amount_minor, "amount")?;
        let description = normalize_required_description(&cmd.description)?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;
            self.require_category_visible(&db_tx, &cmd.user_id, cmd.category_id)
                .await?;

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(model.id),
                category_id: ActiveValue::Set(cmd.category_id.to_string()),
                description: ActiveValue::Set(description),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                date: ActiveValue::Set(cmd.date),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            self.sync_main_piggybank_in_tx(&db_tx, &cmd.user_id).await?;
            Transaction::try_from(model)
        })
    }

    pub async fn delete_transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            transactions::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            self.sync_main_piggybank_in_tx(&db_tx, user_id).await?;
            tracing::debug!(user_id, transaction_id = %transaction_id, "ledger transaction deleted");
            Ok(())
        })
    }

    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            Transaction::try_from(model)
        })
    }

    /// Ledger transactions of a user, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            self.load_transactions(&db_tx, user_id, filter).await
        })
    }

    /// Income, expense and per-category totals over `[from, to)`.
    pub async fn transaction_summary(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<TransactionSummary> {
        let filter = TransactionListFilter {
            from,
            to,
            ..Default::default()
        };
        validate_list_filter(&filter)?;
        with_tx!(self, |db_tx| {
            let ledger = self.load_transactions(&db_tx, user_id, &filter).await?;
            let names = self.category_names(&db_tx, user_id).await?;
            summarize(&ledger, &names)
        })
    }

    /// Summary of one calendar month (UTC) with the category breakdown split
    /// by kind.
    pub async fn monthly_report(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthlyReport> {
        let (from, to) = month_range(year, month)?;
        let summary = self
            .transaction_summary(user_id, Some(from), Some(to))
            .await?;
        let (income_categories, expense_categories) = summary
            .categories
            .iter()
            .cloned()
            .partition(|c| c.kind == TransactionKind::Income);
        Ok(MonthlyReport {
            year,
            month,
            summary,
            income_categories,
            expense_categories,
        })
    }

    async fn load_transactions(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .apply_tx_filters(filter)
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn category_names(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        self.visible_categories(db, user_id)
            .await?
            .into_iter()
            .map(|model| -> ResultEngine<(Uuid, String)> {
                Ok((parse_uuid(&model.id, "category")?, model.name))
            })
            .collect()
    }
}
