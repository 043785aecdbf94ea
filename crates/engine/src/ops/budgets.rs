use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetStatus, EngineError, NewBudgetCmd, ResultEngine, TransactionKind,
    UpdateBudgetCmd, budgets, categories, transactions,
    util::{normalize_required_name, require_positive_amount},
};

use super::{Engine, with_tx};

fn validate_period(start_date: NaiveDate, end_date: NaiveDate) -> ResultEngine<()> {
    if start_date > end_date {
        return Err(EngineError::InvalidDate(
            "budget start date must not be after its end date".to_string(),
        ));
    }
    Ok(())
}

/// `[start 00:00, day after end 00:00)` in UTC.
fn period_bounds(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || EngineError::InvalidDate("budget period out of range".to_string());
    let from = start_date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
    let to = end_date
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?
        .and_utc();
    Ok((from, to))
}

impl Engine {
    /// Budgets of a user, newest first.
    pub async fn list_budgets(
        &self,
        user_id: &str,
        active_only: bool,
    ) -> ResultEngine<Vec<BudgetStatus>> {
        with_tx!(self, |db_tx| {
            let mut query = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()));
            if active_only {
                query = query.filter(budgets::Column::IsActive.eq(true));
            }
            let models = query
                .order_by_desc(budgets::Column::CreatedAt)
                .order_by_desc(budgets::Column::Id)
                .all(&db_tx)
                .await?;

            let mut statuses = Vec::with_capacity(models.len());
            for model in models {
                statuses.push(self.budget_status(&db_tx, model).await?);
            }
            Ok(statuses)
        })
    }

    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<BudgetStatus> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, user_id, budget_id).await?;
            self.budget_status(&db_tx, model).await
        })
    }

    /// Create a budget for a category visible to the user.
    ///
    /// Active budgets of the same category may not cover a common day.
    pub async fn new_budget(&self, cmd: NewBudgetCmd) -> ResultEngine<BudgetStatus> {
        let name = normalize_required_name(&cmd.name, "budget")?;
        require_positive_amount(cmd.amount_minor, "budget amount")?;
        validate_period(cmd.start_date, cmd.end_date)?;

        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_category_visible(&db_tx, &cmd.user_id, cmd.category_id)
                .await?;
            self.reject_overlapping_budget(
                &db_tx,
                &cmd.user_id,
                cmd.category_id,
                cmd.start_date,
                cmd.end_date,
                None,
            )
            .await?;

            let budget = Budget {
                id: Uuid::new_v4(),
                user_id: cmd.user_id.clone(),
                category_id: cmd.category_id,
                name,
                amount_minor: cmd.amount_minor,
                start_date: cmd.start_date,
                end_date: cmd.end_date,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            let model = budgets::ActiveModel::from(&budget).insert(&db_tx).await?;
            tracing::info!(
                user_id = %cmd.user_id,
                budget_id = %budget.id,
                amount_minor = budget.amount_minor,
                "budget created"
            );
            self.budget_status(&db_tx, model).await
        })
    }

    pub async fn update_budget(&self, cmd: UpdateBudgetCmd) -> ResultEngine<BudgetStatus> {
        let name = normalize_required_name(&cmd.name, "budget")?;
        require_positive_amount(cmd.amount_minor, "budget amount")?;
        validate_period(cmd.start_date, cmd.end_date)?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_budget(&db_tx, &cmd.user_id, cmd.budget_id)
                .await?;
            self.require_category_visible(&db_tx, &cmd.user_id, cmd.category_id)
                .await?;
            if cmd.is_active {
                self.reject_overlapping_budget(
                    &db_tx,
                    &cmd.user_id,
                    cmd.category_id,
                    cmd.start_date,
                    cmd.end_date,
                    Some(&model.id),
                )
                .await?;
            }

            let active = budgets::ActiveModel {
                id: ActiveValue::Set(model.id),
                category_id: ActiveValue::Set(cmd.category_id.to_string()),
                name: ActiveValue::Set(name),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                start_date: ActiveValue::Set(cmd.start_date),
                end_date: ActiveValue::Set(cmd.end_date),
                is_active: ActiveValue::Set(cmd.is_active),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            self.budget_status(&db_tx, model).await
        })
    }

    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_budget(&db_tx, user_id, budget_id).await?;
            budgets::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::info!(user_id, budget_id = %budget_id, "budget deleted");
            Ok(())
        })
    }

    /// Active budgets running today (UTC) that used at least 80% of their
    /// limit, most used first.
    pub async fn budget_alerts(&self, user_id: &str) -> ResultEngine<Vec<BudgetStatus>> {
        self.budget_alerts_as_of(user_id, Utc::now().date_naive())
            .await
    }

    /// Like [`Engine::budget_alerts`], for the budgets running on `today`.
    pub async fn budget_alerts_as_of(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<Vec<BudgetStatus>> {
        with_tx!(self, |db_tx| {
            let models = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .filter(budgets::Column::IsActive.eq(true))
                .all(&db_tx)
                .await?;

            let mut alerts = Vec::new();
            for model in models {
                let budget = Budget::try_from(model)?;
                if !budget.contains(today) {
                    continue;
                }
                let status = self.status_of(&db_tx, budget).await?;
                if status.alert_level().is_some() {
                    alerts.push(status);
                }
            }
            alerts.sort_by(|a, b| b.percentage_used().total_cmp(&a.percentage_used()));
            Ok(alerts)
        })
    }

    async fn require_budget(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        budget_id: Uuid,
    ) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(budget_id.to_string())
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))
    }

    async fn reject_overlapping_budget(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .filter(budgets::Column::CategoryId.eq(category_id.to_string()))
            .filter(budgets::Column::IsActive.eq(true));
        if let Some(id) = exclude_id {
            query = query.filter(budgets::Column::Id.ne(id.to_string()));
        }

        let mut overlapping = false;
        for model in query.all(db).await? {
            if Budget::try_from(model)?.overlaps(start_date, end_date) {
                overlapping = true;
                break;
            }
        }
        if overlapping {
            return Err(EngineError::Conflict(
                "an active budget already covers this category in the given period".to_string(),
            ));
        }
        Ok(())
    }

    async fn budget_status(
        &self,
        db: &DatabaseTransaction,
        model: budgets::Model,
    ) -> ResultEngine<BudgetStatus> {
        self.status_of(db, Budget::try_from(model)?).await
    }

    /// Sum the category's expenses inside the budget period.
    async fn status_of(
        &self,
        db: &DatabaseTransaction,
        budget: Budget,
    ) -> ResultEngine<BudgetStatus> {
        let (from, to) = period_bounds(budget.start_date, budget.end_date)?;

        let spent: Option<Option<i64>> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "spent")
            .filter(transactions::Column::UserId.eq(budget.user_id.clone()))
            .filter(transactions::Column::CategoryId.eq(budget.category_id.to_string()))
            .filter(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
            .filter(transactions::Column::Date.gte(from))
            .filter(transactions::Column::Date.lt(to))
            .into_tuple()
            .one(db)
            .await?;

        let category = categories::Entity::find_by_id(budget.category_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;

        Ok(BudgetStatus {
            budget,
            category_name: category.name,
            category_color: category.color,
            category_icon: category.icon,
            spent_minor: spent.flatten().unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_covers_whole_end_day() {
        let (from, to) = period_bounds(day(2024, 2, 1), day(2024, 2, 29)).unwrap();
        assert_eq!(from.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn reversed_period_is_rejected() {
        assert!(validate_period(day(2024, 2, 1), day(2024, 2, 1)).is_ok());
        assert!(matches!(
            validate_period(day(2024, 2, 2), day(2024, 2, 1)),
            Err(EngineError::InvalidDate(_))
        ));
    }
}
