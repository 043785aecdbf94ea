//! Piggybank ledger engine.
//!
//! Savings sub-accounts ("piggybanks") backed by an append-only log, the
//! transfer and deletion rules that move money between them, and the monthly
//! balance sweep that replays the income/expense ledger into the main
//! piggybank. Alongside sits the income/expense ledger they read from, with
//! its categories and per-category budgets. Everything is persisted through
//! `sea-orm`; every multi-step write runs inside one database transaction.

pub use budgets::{Budget, BudgetAlertLevel, BudgetStatus};
pub use categories::Category;
pub use commands::{
    NewBudgetCmd, NewCategoryCmd, NewPiggybankCmd, NewTransactionCmd, PiggybankTransactionCmd,
    TransferCmd, UpdateBudgetCmd, UpdateCategoryCmd, UpdatePiggybankCmd, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    CategoryTotal, DeletedPiggybank, Engine, EngineBuilder, LedgerCheck, MonthlyBalanceSummary,
    MonthlyReport, PiggybankSummary, TransactionListFilter, TransactionSummary, TransferReceipt,
};
pub use piggybank_transactions::{
    PiggybankTransaction, PiggybankTransactionEntry, PiggybankTransactionKind,
};
pub use piggybanks::Piggybank;
pub use transactions::{Transaction, TransactionKind};

mod budgets;
mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod piggybank_transactions;
mod piggybanks;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
