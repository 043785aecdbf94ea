//! Command structs for engine operations.
//!
//! These types group parameters for write operations (piggybank create,
//! update, log entries, transfers, ledger writes, categories and budgets), keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{PiggybankTransactionKind, TransactionKind};

/// Create a piggybank.
#[derive(Clone, Debug)]
pub struct NewPiggybankCmd {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub target_amount_minor: i64,
    /// Opening balance, logged as an "initial deposit" when positive.
    pub initial_amount_minor: i64,
}

impl NewPiggybankCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            target_amount_minor: 0,
            initial_amount_minor: 0,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target_amount_minor(mut self, amount_minor: i64) -> Self {
        self.target_amount_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn initial_amount_minor(mut self, amount_minor: i64) -> Self {
        self.initial_amount_minor = amount_minor;
        self
    }
}

/// Edit the user-editable fields of a piggybank.
///
/// The balance and the main flag are not editable through this path.
#[derive(Clone, Debug)]
pub struct UpdatePiggybankCmd {
    pub user_id: String,
    pub piggybank_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_amount_minor: i64,
}

impl UpdatePiggybankCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        piggybank_id: Uuid,
        name: impl Into<String>,
        target_amount_minor: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            piggybank_id,
            name: name.into(),
            description: None,
            target_amount_minor,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Append an entry to a piggybank log.
#[derive(Clone, Debug)]
pub struct PiggybankTransactionCmd {
    pub user_id: String,
    pub piggybank_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub kind: PiggybankTransactionKind,
    pub source_piggybank_id: Option<Uuid>,
}

impl PiggybankTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        piggybank_id: Uuid,
        kind: PiggybankTransactionKind,
        amount_minor: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            piggybank_id,
            amount_minor,
            description: description.into(),
            kind,
            source_piggybank_id: None,
        }
    }

    #[must_use]
    pub fn deposit(
        user_id: impl Into<String>,
        piggybank_id: Uuid,
        amount_minor: i64,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            user_id,
            piggybank_id,
            PiggybankTransactionKind::Deposit,
            amount_minor,
            description,
        )
    }

    #[must_use]
    pub fn withdrawal(
        user_id: impl Into<String>,
        piggybank_id: Uuid,
        amount_minor: i64,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            user_id,
            piggybank_id,
            PiggybankTransactionKind::Withdrawal,
            amount_minor,
            description,
        )
    }

    #[must_use]
    pub fn source_piggybank_id(mut self, source_piggybank_id: Uuid) -> Self {
        self.source_piggybank_id = Some(source_piggybank_id);
        self
    }
}

/// Move money between two piggybanks of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: String,
    pub source_piggybank_id: Uuid,
    pub destination_piggybank_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        source_piggybank_id: Uuid,
        destination_piggybank_id: Uuid,
        amount_minor: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            source_piggybank_id,
            destination_piggybank_id,
            amount_minor,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Record an income or expense in the ledger.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub user_id: String,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        category_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category_id,
            kind,
            amount_minor,
            description: String::new(),
            date,
        }
    }

    #[must_use]
    pub fn income(
        user_id: impl Into<String>,
        category_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, category_id, TransactionKind::Income, amount_minor, date)
    }

    #[must_use]
    pub fn expense(
        user_id: impl Into<String>,
        category_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, category_id, TransactionKind::Expense, amount_minor, date)
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Replace every editable field of a ledger transaction.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, cmd: NewTransactionCmd) -> Self {
        Self {
            user_id: cmd.user_id,
            transaction_id,
            category_id: cmd.category_id,
            kind: cmd.kind,
            amount_minor: cmd.amount_minor,
            description: cmd.description,
            date: cmd.date,
        }
    }
}

/// Create a user category.
#[derive(Clone, Debug)]
pub struct NewCategoryCmd {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewCategoryCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            color: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Replace the editable fields of a user category.
#[derive(Clone, Debug)]
pub struct UpdateCategoryCmd {
    pub user_id: String,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl UpdateCategoryCmd {
    #[must_use]
    pub fn new(category_id: Uuid, cmd: NewCategoryCmd) -> Self {
        Self {
            user_id: cmd.user_id,
            category_id,
            name: cmd.name,
            description: cmd.description,
            color: cmd.color,
            icon: cmd.icon,
        }
    }
}

/// Create a spending limit for one category over an inclusive date range.
#[derive(Clone, Debug)]
pub struct NewBudgetCmd {
    pub user_id: String,
    pub category_id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewBudgetCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        category_id: Uuid,
        name: impl Into<String>,
        amount_minor: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category_id,
            name: name.into(),
            amount_minor,
            start_date,
            end_date,
        }
    }
}

/// Replace every editable field of a budget.
#[derive(Clone, Debug)]
pub struct UpdateBudgetCmd {
    pub user_id: String,
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

impl UpdateBudgetCmd {
    #[must_use]
    pub fn new(budget_id: Uuid, cmd: NewBudgetCmd) -> Self {
        Self {
            user_id: cmd.user_id,
            budget_id,
            category_id: cmd.category_id,
            name: cmd.name,
            amount_minor: cmd.amount_minor,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            is_active: true,
        }
    }

    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}
