use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Budget, CacheKey, DEFAULT_PROCESSING_CUT, EngineError, MAX_PERCENT, NewBudgetCmd,
    NewProjectCmd, Project, ResultEngine, projects,
    util::{
        new_public_token, normalize_optional_text, normalize_required_name, require_id,
        validate_slug,
    },
};

use super::{Engine, with_tx};

/// Name of the budget collecting processing cuts inside the platform project.
const PLATFORM_BUDGET_NAME: &str = "Processing Cuts";

fn validate_processing_cut(percent: i64) -> ResultEngine<i64> {
    if !(0..=MAX_PERCENT).contains(&percent) {
        return Err(EngineError::InvalidRatio(format!(
            "processing cut {percent} is outside 0..=100"
        )));
    }
    Ok(percent)
}

impl Engine {
    /// Create a project and its root budget.
    ///
    /// The root budget carries the project name. Fails with
    /// [`EngineError::ExistingKey`] when the slug is taken.
    pub async fn new_project(&self, cmd: NewProjectCmd) -> ResultEngine<Project> {
        let (project, root) = with_tx!(self, |db_tx| self.insert_project(&db_tx, cmd).await)?;
        self.cache
            .invalidate(&CacheKey::Project(project.token.clone()));
        self.cache.invalidate(&CacheKey::Budget(root.token));
        Ok(project)
    }

    /// Create the platform project (no processing cut) together with the
    /// budget collecting processing cuts, and return that budget.
    pub async fn bootstrap_platform(&self, name: &str, slug: &str) -> ResultEngine<Budget> {
        let cmd = NewProjectCmd::new(name, slug).processing_cut(0);
        let (project, root, budget) = with_tx!(self, |db_tx| {
            let (project, root) = self.insert_project(&db_tx, cmd).await?;
            let budget_cmd = NewBudgetCmd::new(PLATFORM_BUDGET_NAME)
                .project_id(project.id)
                .description("Processing cuts kept from incoming payments");
            let budget = self.insert_budget(&db_tx, budget_cmd).await?;
            Ok::<_, EngineError>((project, root, budget))
        })?;
        self.cache.invalidate(&CacheKey::Project(project.token));
        self.cache.invalidate(&CacheKey::Budget(root.token));
        self.cache
            .invalidate(&CacheKey::Budget(budget.token.clone()));
        tracing::info!(budget_id = budget.id, token = %budget.token, "platform budget created");
        Ok(budget)
    }

    /// Return a project by id.
    pub async fn project(&self, id: i64) -> ResultEngine<Project> {
        require_id(id, "project")?;
        with_tx!(self, |db_tx| self.require_project(&db_tx, id).await)
    }

    /// Return a project by its public token, going through the cache.
    pub async fn project_by_token(&self, token: &str) -> ResultEngine<Project> {
        if let Some(project) = self.cache.project(token) {
            return Ok(project);
        }
        let project = with_tx!(self, |db_tx| {
            projects::Entity::find()
                .filter(projects::Column::Token.eq(token))
                .one(&db_tx)
                .await?
                .map(Project::from)
                .ok_or_else(|| EngineError::UnknownProject(format!("project {token} not exists")))
        })?;
        self.cache.put_project(&project);
        Ok(project)
    }

    /// Change the percentage kept from every positive share routed to the
    /// project's budgets.
    pub async fn set_processing_cut(&self, project_id: i64, percent: i64) -> ResultEngine<Project> {
        require_id(project_id, "project")?;
        let percent = validate_processing_cut(percent)?;
        let project = with_tx!(self, |db_tx| {
            let project = self.require_project(&db_tx, project_id).await?;
            let model = projects::ActiveModel {
                id: ActiveValue::Unchanged(project.id),
                processing_cut: ActiveValue::Set(percent),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok::<_, EngineError>(Project::from(model))
        })?;
        self.cache
            .invalidate(&CacheKey::Project(project.token.clone()));
        tracing::info!(project_id, percent, "processing cut updated");
        Ok(project)
    }

    pub(super) async fn require_project(
        &self,
        db_tx: &DatabaseTransaction,
        id: i64,
    ) -> ResultEngine<Project> {
        projects::Entity::find_by_id(id)
            .one(db_tx)
            .await?
            .map(Project::from)
            .ok_or_else(|| EngineError::UnknownProject(format!("project {id} not exists")))
    }

    async fn insert_project(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: NewProjectCmd,
    ) -> ResultEngine<(Project, Budget)> {
        let name = normalize_required_name(&cmd.name, "project")?;
        let slug = validate_slug(&cmd.slug)?;
        let processing_cut =
            validate_processing_cut(cmd.processing_cut.unwrap_or(DEFAULT_PROCESSING_CUT))?;

        let exists = projects::Entity::find()
            .filter(projects::Column::Slug.eq(slug.as_str()))
            .one(db_tx)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(slug));
        }

        let project = Project {
            id: 0,
            token: new_public_token(),
            slug,
            name: name.clone(),
            summary: cmd.summary.trim().to_string(),
            website: normalize_optional_text(Some(&cmd.website)).unwrap_or_default(),
            processing_cut,
            private: cmd.private,
            private_balance: cmd.private_balance,
            activated: true,
            created_at: Utc::now(),
        };
        let model = projects::ActiveModel::from(&project).insert(db_tx).await?;
        let project = Project::from(model);

        let mut root = NewBudgetCmd::new(name).project_id(project.id);
        root.private = project.private;
        root.private_balance = project.private_balance;
        let budget = self.insert_budget(db_tx, root).await?;

        tracing::info!(
            project_id = project.id,
            slug = %project.slug,
            root_budget_id = budget.id,
            "project created"
        );
        Ok((project, budget))
    }
}
