use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Budget, CacheKey, EngineError, NewBudgetCmd, ResultEngine, budgets,
    util::{new_public_token, normalize_optional_text, normalize_required_name, require_id},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a budget.
    ///
    /// A parent must exist and belong to the same project as the new budget.
    pub async fn new_budget(&self, cmd: NewBudgetCmd) -> ResultEngine<Budget> {
        let budget = with_tx!(self, |db_tx| self.insert_budget(&db_tx, cmd).await)?;
        self.cache.invalidate(&CacheKey::Budget(budget.token.clone()));
        Ok(budget)
    }

    /// Return a budget by id.
    pub async fn budget(&self, id: i64) -> ResultEngine<Budget> {
        require_id(id, "budget")?;
        with_tx!(self, |db_tx| self.require_budget(&db_tx, id).await)
    }

    /// Return a budget by its public token, going through the cache.
    pub async fn budget_by_token(&self, token: &str) -> ResultEngine<Budget> {
        if let Some(budget) = self.cache.budget(token) {
            return Ok(budget);
        }
        let budget = with_tx!(self, |db_tx| {
            budgets::Entity::find()
                .filter(budgets::Column::Token.eq(token))
                .one(&db_tx)
                .await?
                .map(Budget::from)
                .ok_or_else(|| EngineError::UnknownBudget(format!("budget {token} not exists")))
        })?;
        self.cache.put_budget(&budget);
        Ok(budget)
    }

    /// Budgets of a project without a parent, oldest first.
    pub async fn root_budgets(&self, project_id: i64) -> ResultEngine<Vec<Budget>> {
        require_id(project_id, "project")?;
        with_tx!(self, |db_tx| {
            self.require_project(&db_tx, project_id).await?;
            let models = budgets::Entity::find()
                .filter(budgets::Column::ProjectId.eq(project_id))
                .filter(budgets::Column::ParentId.is_null())
                .order_by_asc(budgets::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Budget::from).collect())
        })
    }

    /// Direct children of a budget, oldest first.
    pub async fn child_budgets(&self, budget_id: i64) -> ResultEngine<Vec<Budget>> {
        require_id(budget_id, "budget")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            let models = budgets::Entity::find()
                .filter(budgets::Column::ParentId.eq(budget_id))
                .order_by_asc(budgets::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Budget::from).collect())
        })
    }

    /// Persist edits to a budget's name, description, parent and visibility
    /// flags. The token, project and owner never change.
    pub async fn save_budget(&self, budget: &Budget) -> ResultEngine<Budget> {
        require_id(budget.id, "budget")?;
        let name = normalize_required_name(&budget.name, "budget")?;
        let saved = with_tx!(self, |db_tx| {
            let current = self.require_budget(&db_tx, budget.id).await?;
            if let Some(parent_id) = budget.parent_id {
                require_id(parent_id, "budget")?;
                self.require_parent(&db_tx, parent_id, current.project_id)
                    .await?;
                self.reject_cycle(&db_tx, current.id, parent_id).await?;
            }

            let model = budgets::ActiveModel {
                id: ActiveValue::Unchanged(current.id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional_text(
                    budget.description.as_deref(),
                )),
                parent_id: ActiveValue::Set(budget.parent_id),
                private: ActiveValue::Set(budget.private),
                private_balance: ActiveValue::Set(budget.private_balance),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok::<_, EngineError>(Budget::from(model))
        })?;
        self.cache.invalidate(&CacheKey::Budget(saved.token.clone()));
        Ok(saved)
    }

    pub(super) async fn require_budget(
        &self,
        db_tx: &DatabaseTransaction,
        id: i64,
    ) -> ResultEngine<Budget> {
        budgets::Entity::find_by_id(id)
            .one(db_tx)
            .await?
            .map(Budget::from)
            .ok_or_else(|| EngineError::UnknownBudget(format!("budget {id} not exists")))
    }

    async fn require_parent(
        &self,
        db_tx: &DatabaseTransaction,
        parent_id: i64,
        project_id: Option<i64>,
    ) -> ResultEngine<Budget> {
        let parent = self.require_budget(db_tx, parent_id).await?;
        if parent.project_id != project_id {
            return Err(EngineError::InvalidId(format!(
                "parent budget {parent_id} belongs to another project"
            )));
        }
        Ok(parent)
    }

    /// Walk up from `parent_id` and fail if the chain reaches `budget_id`.
    async fn reject_cycle(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: i64,
        parent_id: i64,
    ) -> ResultEngine<()> {
        let mut next = Some(parent_id);
        while let Some(ancestor_id) = next {
            if ancestor_id == budget_id {
                return Err(EngineError::InvalidId(format!(
                    "budget {budget_id} cannot be nested under its own descendant {parent_id}"
                )));
            }
            next = self.require_budget(db_tx, ancestor_id).await?.parent_id;
        }
        Ok(())
    }

    pub(super) async fn insert_budget(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: NewBudgetCmd,
    ) -> ResultEngine<Budget> {
        let name = normalize_required_name(&cmd.name, "budget")?;
        if let Some(project_id) = cmd.project_id {
            require_id(project_id, "project")?;
            self.require_project(db_tx, project_id).await?;
        }
        if let Some(user_id) = cmd.user_id {
            require_id(user_id, "user")?;
            self.require_user(db_tx, user_id).await?;
        }
        if let Some(parent_id) = cmd.parent_id {
            require_id(parent_id, "budget")?;
            self.require_parent(db_tx, parent_id, cmd.project_id)
                .await?;
        }

        let budget = Budget {
            id: 0,
            token: new_public_token(),
            project_id: cmd.project_id,
            user_id: cmd.user_id,
            parent_id: cmd.parent_id,
            name,
            description: normalize_optional_text(cmd.description.as_deref()),
            private: cmd.private,
            private_balance: cmd.private_balance,
        };
        let model = budgets::ActiveModel::from(&budget).insert(db_tx).await?;
        tracing::info!(budget_id = model.id, name = %model.name, "budget created");
        Ok(Budget::from(model))
    }
}
