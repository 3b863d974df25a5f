//! Projects receive donations through their budgets and configure the
//! processing cut the platform keeps from every incoming share.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

/// Processing cut applied when a project does not configure one.
pub const DEFAULT_PROCESSING_CUT: i64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    /// Public identifier handed out to clients.
    pub token: String,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub website: String,
    /// Percentage (0..=100) of every positive share kept by the platform.
    pub processing_cut: i64,
    pub private: bool,
    pub private_balance: bool,
    pub activated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub token: String,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub website: String,
    pub processing_cut: i64,
    pub private: bool,
    pub private_balance: bool,
    pub activated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budgets::Entity")]
    Budgets,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            token: model.token,
            slug: model.slug,
            name: model.name,
            summary: model.summary,
            website: model.website,
            processing_cut: model.processing_cut,
            private: model.private,
            private_balance: model.private_balance,
            activated: model.activated,
            created_at: model.created_at,
        }
    }
}

impl From<&Project> for ActiveModel {
    fn from(project: &Project) -> Self {
        Self {
            id: if project.id > 0 {
                ActiveValue::Unchanged(project.id)
            } else {
                ActiveValue::NotSet
            },
            token: ActiveValue::Set(project.token.clone()),
            slug: ActiveValue::Set(project.slug.clone()),
            name: ActiveValue::Set(project.name.clone()),
            summary: ActiveValue::Set(project.summary.clone()),
            website: ActiveValue::Set(project.website.clone()),
            processing_cut: ActiveValue::Set(project.processing_cut),
            private: ActiveValue::Set(project.private),
            private_balance: ActiveValue::Set(project.private_balance),
            activated: ActiveValue::Set(project.activated),
            created_at: ActiveValue::Set(project.created_at),
        }
    }
}
