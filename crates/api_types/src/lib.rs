//! Request and response bodies of the HTTP API.
//!
//! Money is always an integer amount of cents (`*_minor`).

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod piggybank {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PiggybankTransactionKind {
        Deposit,
        Withdrawal,
        Transfer,
        MonthlyBalance,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankNew {
        pub name: String,
        pub description: Option<String>,
        /// Defaults to `0` (no target).
        pub target_amount_minor: Option<i64>,
        /// Opening balance, logged as an initial deposit when positive.
        pub initial_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankUpdate {
        pub name: String,
        pub description: Option<String>,
        pub target_amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub amount_minor: i64,
        pub target_amount_minor: i64,
        pub is_main_piggybank: bool,
        pub percentage_to_target: f64,
        pub remaining_to_target_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankListResponse {
        pub piggybanks: Vec<PiggybankView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankSummary {
        pub total_amount_minor: i64,
        pub count: usize,
        pub main_amount_minor: i64,
        pub piggybanks: Vec<PiggybankView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankDeleted {
        pub id: Uuid,
        /// Balance moved to the main piggybank.
        pub migrated_minor: i64,
        pub main_piggybank_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankTransactionNew {
        /// Must be > 0. The kind defines the sign.
        pub amount_minor: i64,
        pub description: String,
        pub kind: PiggybankTransactionKind,
        /// Required for `transfer` entries, rejected otherwise.
        pub source_piggybank_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankTransactionView {
        pub id: Uuid,
        pub piggybank_id: Uuid,
        pub piggybank_name: String,
        pub source_piggybank_id: Option<Uuid>,
        /// `None` when there is no source or it has been deleted.
        pub source_piggybank_name: Option<String>,
        pub amount_minor: i64,
        /// Effect on the piggybank balance.
        pub signed_amount_minor: i64,
        pub description: String,
        pub kind: PiggybankTransactionKind,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PiggybankTransactionListResponse {
        pub transactions: Vec<PiggybankTransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub source_piggybank_id: Uuid,
        pub destination_piggybank_id: Uuid,
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub outgoing: PiggybankTransactionView,
        pub incoming: PiggybankTransactionView,
        pub source_amount_minor: i64,
        pub destination_amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyBalance {
        pub total_savings_minor: i64,
        pub months_processed: u32,
        pub main_piggybank_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerCheck {
        pub piggybank_id: Uuid,
        pub cached_minor: i64,
        pub derived_minor: i64,
        pub consistent: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub category_id: Uuid,
        pub description: String,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: DateTime<FixedOffset>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        /// Inclusive lower bound.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<FixedOffset>>,
        pub kind: Option<TransactionKind>,
        pub category_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub description: String,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category_id: Uuid,
        pub name: String,
        pub kind: TransactionKind,
        pub total_minor: i64,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionSummary {
        pub total_income_minor: i64,
        pub total_expenses_minor: i64,
        pub balance_minor: i64,
        pub transaction_count: u64,
        pub categories: Vec<CategoryTotal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyReport {
        pub year: i32,
        pub month: u32,
        pub summary: TransactionSummary,
        pub income_categories: Vec<CategoryTotal>,
        pub expense_categories: Vec<CategoryTotal>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub description: Option<String>,
        pub color: Option<String>,
        pub icon: Option<String>,
    }

    /// Replaces every editable field. Missing color and icon fall back to
    /// the defaults.
    pub type CategoryUpdate = CategoryNew;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub color: String,
        pub icon: String,
        /// Shared default category, visible to every user.
        pub is_default: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetAlertLevel {
        /// At least 80% of the limit used.
        Warning,
        /// Limit reached or passed.
        Exceeded,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub category_id: Uuid,
        pub name: String,
        /// Must be > 0.
        pub amount_minor: i64,
        /// First day of the period, inclusive.
        pub start_date: NaiveDate,
        /// Last day of the period, inclusive.
        pub end_date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub category_id: Uuid,
        pub name: String,
        pub amount_minor: i64,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        /// Defaults to `true`.
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetListQuery {
        pub active_only: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub category_name: String,
        pub category_color: String,
        pub category_icon: String,
        pub name: String,
        pub amount_minor: i64,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub is_active: bool,
        /// Expenses of the category inside the period.
        pub spent_minor: i64,
        /// Negative once the limit is exceeded.
        pub remaining_minor: i64,
        pub percentage_used: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetAlert {
        pub budget_id: Uuid,
        pub budget_name: String,
        pub category_name: String,
        pub amount_minor: i64,
        pub spent_minor: i64,
        pub percentage_used: f64,
        pub level: BudgetAlertLevel,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetAlertListResponse {
        pub alerts: Vec<BudgetAlert>,
    }
}
