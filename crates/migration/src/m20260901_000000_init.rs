//! Initial schema migration.
//!
//! - `users`: identities the HTTP layer authenticates against
//! - `categories`: income/expense categories (shared defaults have no owner)
//! - `transactions`: the income/expense ledger
//! - `piggybanks`: savings sub-accounts with a cached balance
//! - `piggybank_transactions`: append-only log behind each piggybank balance

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Color,
    Icon,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    CategoryId,
    Description,
    AmountMinor,
    Kind,
    Date,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Piggybanks {
    Table,
    Id,
    UserId,
    Name,
    Description,
    AmountMinor,
    TargetAmountMinor,
    IsMainPiggybank,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PiggybankTransactions {
    Table,
    Id,
    UserId,
    PiggybankId,
    SourcePiggybankId,
    AmountMinor,
    Description,
    Kind,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::UserId).string())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Description).string())
                    .col(
                        ColumnDef::new(Categories::Color)
                            .string()
                            .not_null()
                            .default("#3B82F6"),
                    )
                    .col(
                        ColumnDef::new(Categories::Icon)
                            .string()
                            .not_null()
                            .default("category"),
                    )
                    .col(
                        ColumnDef::new(Categories::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Categories::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-user_id")
                            .from(Categories::Table, Categories::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::CategoryId).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Date).timestamp().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Piggybanks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Piggybanks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Piggybanks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Piggybanks::UserId).string().not_null())
                    .col(ColumnDef::new(Piggybanks::Name).string().not_null())
                    .col(ColumnDef::new(Piggybanks::Description).string())
                    .col(
                        ColumnDef::new(Piggybanks::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Piggybanks::TargetAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Piggybanks::IsMainPiggybank)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Piggybanks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Piggybanks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-piggybanks-user_id")
                            .from(Piggybanks::Table, Piggybanks::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-piggybanks-user_id")
                    .table(Piggybanks::Table)
                    .col(Piggybanks::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Piggybank transactions
        // ───────────────────────────────────────────────────────────────────
        //
        // `source_piggybank_id` is a logical reference only: the automatic
        // migration entry written when a piggybank is deleted keeps pointing
        // at the removed account.
        manager
            .create_table(
                Table::create()
                    .table(PiggybankTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PiggybankTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PiggybankTransactions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PiggybankTransactions::PiggybankId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PiggybankTransactions::SourcePiggybankId).string())
                    .col(
                        ColumnDef::new(PiggybankTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PiggybankTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PiggybankTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(PiggybankTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-piggybank_transactions-piggybank_id")
                            .from(
                                PiggybankTransactions::Table,
                                PiggybankTransactions::PiggybankId,
                            )
                            .to(Piggybanks::Table, Piggybanks::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-piggybank_transactions-user_id")
                            .from(PiggybankTransactions::Table, PiggybankTransactions::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-piggybank_transactions-piggybank_id")
                    .table(PiggybankTransactions::Table)
                    .col(PiggybankTransactions::PiggybankId)
                    .col(PiggybankTransactions::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-piggybank_transactions-source_piggybank_id")
                    .table(PiggybankTransactions::Table)
                    .col(PiggybankTransactions::SourcePiggybankId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(PiggybankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Piggybanks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
