//! Ledger legs.
//!
//! A [`Transaction`] row is one leg of a double-entry transfer: it belongs to
//! a single budget and changes that budget's balance by `amount`.
//!
//! Amounts are signed integer **minor units**:
//! - positive values increase the owning budget's balance
//! - negative values decrease it
//!
//! A transfer always writes two legs with mirrored fields:
//!
//! | leg    | `budget_id` | `from_budget_id` | `to_budget_id` | `amount` |
//! |--------|-------------|------------------|----------------|----------|
//! | debit  | from        | –                | to             | `-n`     |
//! | credit | to          | from             | –              | `+n`     |
//!
//! The only unpaired leg is the one recording a payment's arrival on its
//! source budget. Rows are append-only.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub budget_id: i64,
    pub from_budget_id: Option<i64>,
    pub to_budget_id: Option<i64>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub purpose: Option<String>,
    pub payment_id: Option<i64>,
}

impl Transaction {
    /// The debit leg of a transfer of `amount > 0` from `from` to `to`.
    pub(crate) fn debit(
        from: i64,
        to: i64,
        amount: i64,
        created_at: DateTime<Utc>,
        purpose: Option<String>,
        payment_id: Option<i64>,
    ) -> Self {
        Self {
            id: 0,
            budget_id: from,
            from_budget_id: None,
            to_budget_id: Some(to),
            amount: -amount,
            created_at,
            purpose,
            payment_id,
        }
    }

    /// The credit leg of a transfer of `amount > 0` from `from` to `to`.
    pub(crate) fn credit(
        from: i64,
        to: i64,
        amount: i64,
        created_at: DateTime<Utc>,
        purpose: Option<String>,
        payment_id: Option<i64>,
    ) -> Self {
        Self {
            id: 0,
            budget_id: to,
            from_budget_id: Some(from),
            to_budget_id: None,
            amount,
            created_at,
            purpose,
            payment_id,
        }
    }

    /// The leg recording money arriving on a budget from outside the ledger.
    pub(crate) fn arrival(
        budget_id: i64,
        amount: i64,
        created_at: DateTime<Utc>,
        purpose: Option<String>,
        payment_id: i64,
    ) -> Self {
        Self {
            id: 0,
            budget_id,
            from_budget_id: None,
            to_budget_id: None,
            amount,
            created_at,
            purpose,
            payment_id: Some(payment_id),
        }
    }

    /// The other budget involved in this leg, if any.
    #[must_use]
    pub fn counterparty(&self) -> Option<i64> {
        self.to_budget_id.or(self.from_budget_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_id: i64,
    pub from_budget_id: Option<i64>,
    pub to_budget_id: Option<i64>,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub purpose: Option<String>,
    pub payment_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Budgets,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            budget_id: ActiveValue::Set(tx.budget_id),
            from_budget_id: ActiveValue::Set(tx.from_budget_id),
            to_budget_id: ActiveValue::Set(tx.to_budget_id),
            amount: ActiveValue::Set(tx.amount),
            created_at: ActiveValue::Set(tx.created_at),
            purpose: ActiveValue::Set(tx.purpose.clone()),
            payment_id: ActiveValue::Set(tx.payment_id),
        }
    }
}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            budget_id: model.budget_id,
            from_budget_id: model.from_budget_id,
            to_budget_id: model.to_budget_id,
            amount: model.amount,
            created_at: model.created_at,
            purpose: model.purpose,
            payment_id: model.payment_id,
        }
    }
}
