//! Incoming payments.
//!
//! A [`Payment`] is a one-time money movement reported by an external source
//! (bank import, payment provider). It lands on its own source budget and
//! stays `pending` until a code is known and its amount has been routed to the
//! code's budgets.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    /// Budget the money arrives on before being routed.
    pub budget_id: i64,
    pub created_at: DateTime<Utc>,
    /// Minor units, positive = incoming, negative = reversal.
    pub amount: i64,
    pub currency: Currency,
    pub code: Option<String>,
    pub purpose: String,
    pub remote_account: String,
    pub remote_name: String,
    pub remote_transaction_id: String,
    pub remote_bank_id: String,
    /// Source system tag, e.g. `hbci` or `paypal`.
    pub source: String,
    pub pending: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_id: i64,
    pub created_at: DateTime<Utc>,
    pub amount: i64,
    pub currency: String,
    pub code: Option<String>,
    pub purpose: String,
    pub remote_account: String,
    pub remote_name: String,
    pub remote_transaction_id: String,
    pub remote_bank_id: String,
    pub source: String,
    pub pending: bool,
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

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: if payment.id > 0 {
                ActiveValue::Unchanged(payment.id)
            } else {
                ActiveValue::NotSet
            },
            budget_id: ActiveValue::Set(payment.budget_id),
            created_at: ActiveValue::Set(payment.created_at),
            amount: ActiveValue::Set(payment.amount),
            currency: ActiveValue::Set(payment.currency.code().to_string()),
            code: ActiveValue::Set(payment.code.clone()),
            purpose: ActiveValue::Set(payment.purpose.clone()),
            remote_account: ActiveValue::Set(payment.remote_account.clone()),
            remote_name: ActiveValue::Set(payment.remote_name.clone()),
            remote_transaction_id: ActiveValue::Set(payment.remote_transaction_id.clone()),
            remote_bank_id: ActiveValue::Set(payment.remote_bank_id.clone()),
            source: ActiveValue::Set(payment.source.clone()),
            pending: ActiveValue::Set(payment.pending),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            budget_id: model.budget_id,
            created_at: model.created_at,
            amount: model.amount,
            currency: Currency::try_from(model.currency.as_str())?,
            code: model.code,
            purpose: model.purpose,
            remote_account: model.remote_account,
            remote_name: model.remote_name,
            remote_transaction_id: model.remote_transaction_id,
            remote_bank_id: model.remote_bank_id,
            source: model.source,
            pending: model.pending,
        })
    }
}
