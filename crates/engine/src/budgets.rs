//! The module contains the `Budget` struct.
//!
//! A budget is a named pool of funds. Budgets form a tree per project through
//! `parent_id`. A budget never stores its balance: the balance is always the
//! sum of its own ledger legs (see [`Engine::balance`]).
//!
//! [`Engine::balance`]: crate::Engine::balance

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    /// Public identifier handed out to clients.
    pub token: String,
    pub project_id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub private_balance: bool,
}

impl Budget {
    /// Returns `true` for budgets without a parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub token: String,
    pub project_id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub private_balance: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Projects,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Budget {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            project_id: model.project_id,
            user_id: model.user_id,
            parent_id: model.parent_id,
            name: model.name,
            description: model.description,
            private: model.private,
            private_balance: model.private_balance,
        }
    }
}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: if budget.id > 0 {
                ActiveValue::Unchanged(budget.id)
            } else {
                ActiveValue::NotSet
            },
            token: ActiveValue::Set(budget.token.clone()),
            project_id: ActiveValue::Set(budget.project_id),
            user_id: ActiveValue::Set(budget.user_id),
            parent_id: ActiveValue::Set(budget.parent_id),
            name: ActiveValue::Set(budget.name.clone()),
            description: ActiveValue::Set(budget.description.clone()),
            private: ActiveValue::Set(budget.private),
            private_balance: ActiveValue::Set(budget.private_balance),
        }
    }
}
