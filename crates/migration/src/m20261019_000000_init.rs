//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: identities owning budgets and payment codes
//! - `projects`: donation recipients and their processing cut
//! - `budgets`: pools of funds, a tree per project
//! - `codes`: payment code tokens and the budget/ratio split they route to
//! - `payments`: incoming money reported by external sources
//! - `transactions`: append-only ledger legs

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Nickname,
    Email,
    CreatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Token,
    Slug,
    Name,
    Summary,
    Website,
    ProcessingCut,
    Private,
    PrivateBalance,
    Activated,
    CreatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    Token,
    ProjectId,
    UserId,
    ParentId,
    Name,
    Description,
    Private,
    PrivateBalance,
}

#[derive(Iden)]
enum Codes {
    Table,
    Id,
    Token,
    BudgetIds,
    Ratios,
    UserId,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    BudgetId,
    CreatedAt,
    Amount,
    Currency,
    Code,
    Purpose,
    RemoteAccount,
    RemoteName,
    RemoteTransactionId,
    RemoteBankId,
    Source,
    Pending,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BudgetId,
    FromBudgetId,
    ToBudgetId,
    Amount,
    CreatedAt,
    Purpose,
    PaymentId,
}

fn id_column<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
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
                    .col(&mut id_column(Users::Id))
                    .col(ColumnDef::new(Users::Uuid).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Users::Nickname)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Projects
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(&mut id_column(Projects::Id))
                    .col(
                        ColumnDef::new(Projects::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Projects::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(
                        ColumnDef::new(Projects::Summary)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Projects::Website)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Projects::ProcessingCut)
                            .big_integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(Projects::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::PrivateBalance)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Projects::Activated)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(&mut id_column(Budgets::Id))
                    .col(
                        ColumnDef::new(Budgets::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Budgets::ProjectId).integer())
                    .col(ColumnDef::new(Budgets::UserId).integer())
                    .col(ColumnDef::new(Budgets::ParentId).integer())
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(ColumnDef::new(Budgets::Description).string())
                    .col(
                        ColumnDef::new(Budgets::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Budgets::PrivateBalance)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-project_id")
                            .from(Budgets::Table, Budgets::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-parent_id")
                            .from(Budgets::Table, Budgets::ParentId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-project_id-parent_id")
                    .table(Budgets::Table)
                    .col(Budgets::ProjectId)
                    .col(Budgets::ParentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Codes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Codes::Table)
                    .if_not_exists()
                    .col(&mut id_column(Codes::Id))
                    .col(ColumnDef::new(Codes::Token).string().not_null().unique_key())
                    .col(ColumnDef::new(Codes::BudgetIds).string().not_null())
                    .col(ColumnDef::new(Codes::Ratios).string().not_null())
                    .col(ColumnDef::new(Codes::UserId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-codes-user_id")
                            .from(Codes::Table, Codes::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL user ids compare distinct in a plain unique index.
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx-codes-split-unique"
                   ON codes (budget_ids, ratios, IFNULL(user_id, 0));"#,
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(&mut id_column(Payments::Id))
                    .col(ColumnDef::new(Payments::BudgetId).integer().not_null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Payments::Code).string())
                    .col(
                        ColumnDef::new(Payments::Purpose)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Payments::RemoteAccount)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Payments::RemoteName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Payments::RemoteTransactionId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Payments::RemoteBankId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Payments::Source).string().not_null())
                    .col(
                        ColumnDef::new(Payments::Pending)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-budget_id")
                            .from(Payments::Table, Payments::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-pending")
                    .table(Payments::Table)
                    .col(Payments::Pending)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(&mut id_column(Transactions::Id))
                    .col(ColumnDef::new(Transactions::BudgetId).integer().not_null())
                    .col(ColumnDef::new(Transactions::FromBudgetId).integer())
                    .col(ColumnDef::new(Transactions::ToBudgetId).integer())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Purpose).string())
                    .col(ColumnDef::new(Transactions::PaymentId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-budget_id")
                            .from(Transactions::Table, Transactions::BudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_budget_id")
                            .from(Transactions::Table, Transactions::FromBudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_budget_id")
                            .from(Transactions::Table, Transactions::ToBudgetId)
                            .to(Budgets::Table, Budgets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-payment_id")
                            .from(Transactions::Table, Transactions::PaymentId)
                            .to(Payments::Table, Payments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-budget_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::BudgetId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-payment_id")
                    .table(Transactions::Table)
                    .col(Transactions::PaymentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Codes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
