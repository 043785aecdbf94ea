//! Spending limits per category.
//!
//! A budget caps the expenses of one category between two calendar days
//! (both inclusive, UTC). What was spent is never stored: it is summed from
//! the ledger whenever a budget is read.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Share of the limit at which a budget starts raising alerts.
pub(crate) const WARNING_PERCENTAGE: f64 = 80.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Inclusive ranges overlap when each starts before the other ends.
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        self.start_date <= end_date && start_date <= self.end_date
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// A budget together with what has been spent against it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub category_name: String,
    pub category_color: String,
    pub category_icon: String,
    pub spent_minor: i64,
}

impl BudgetStatus {
    /// Negative once the budget is exceeded.
    pub fn remaining_minor(&self) -> i64 {
        self.budget.amount_minor - self.spent_minor
    }

    pub fn percentage_used(&self) -> f64 {
        if self.budget.amount_minor > 0 {
            self.spent_minor as f64 / self.budget.amount_minor as f64 * 100.0
        } else {
            0.0
        }
    }

    /// `None` below the warning threshold.
    pub fn alert_level(&self) -> Option<BudgetAlertLevel> {
        let used = self.percentage_used();
        if used >= 100.0 {
            Some(BudgetAlertLevel::Exceeded)
        } else if used >= WARNING_PERCENTAGE {
            Some(BudgetAlertLevel::Warning)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlertLevel {
    Warning,
    Exceeded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id.to_string()),
            user_id: ActiveValue::Set(budget.user_id.clone()),
            category_id: ActiveValue::Set(budget.category_id.to_string()),
            name: ActiveValue::Set(budget.name.clone()),
            amount_minor: ActiveValue::Set(budget.amount_minor),
            start_date: ActiveValue::Set(budget.start_date),
            end_date: ActiveValue::Set(budget.end_date),
            is_active: ActiveValue::Set(budget.is_active),
            created_at: ActiveValue::Set(budget.created_at),
            updated_at: ActiveValue::Set(budget.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "budget")?,
            user_id: model.user_id,
            category_id: parse_uuid(&model.category_id, "category")?,
            name: model.name,
            amount_minor: model.amount_minor,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn status(amount_minor: i64, spent_minor: i64) -> BudgetStatus {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        BudgetStatus {
            budget: Budget {
                id: Uuid::new_v4(),
                user_id: "alice".to_string(),
                category_id: Uuid::new_v4(),
                name: "Groceries".to_string(),
                amount_minor,
                start_date: day(3, 1),
                end_date: day(3, 31),
                is_active: true,
                created_at: at,
                updated_at: at,
            },
            category_name: "Food".to_string(),
            category_color: "#3B82F6".to_string(),
            category_icon: "category".to_string(),
            spent_minor,
        }
    }

    #[test]
    fn inclusive_overlap() {
        let march = status(100_00, 0).budget;
        assert!(march.overlaps(day(3, 31), day(4, 30)));
        assert!(march.overlaps(day(2, 1), day(3, 1)));
        assert!(march.overlaps(day(3, 10), day(3, 12)));
        assert!(!march.overlaps(day(4, 1), day(4, 30)));
        assert!(march.contains(day(3, 31)));
        assert!(!march.contains(day(4, 1)));
    }

    #[test]
    fn derived_fields_and_alert_levels() {
        let under = status(200_00, 50_00);
        assert_eq!(under.remaining_minor(), 150_00);
        assert_eq!(under.percentage_used(), 25.0);
        assert_eq!(under.alert_level(), None);

        assert_eq!(status(100_00, 80_00).alert_level(), Some(BudgetAlertLevel::Warning));

        let over = status(100_00, 125_00);
        assert_eq!(over.remaining_minor(), -25_00);
        assert_eq!(over.alert_level(), Some(BudgetAlertLevel::Exceeded));
    }
}
