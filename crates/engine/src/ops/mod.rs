use std::sync::Arc;

use sea_orm::{DatabaseConnection, QueryFilter, prelude::*};

use crate::{EngineError, EntityCache, NoCache, ResultEngine};

mod budgets;
mod codes;
mod ledger;
mod payments;
mod projects;
mod search;
mod statistics;
mod users;

pub use search::SearchResults;
pub use statistics::Statistics;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    cache: Arc<dyn EntityCache>,
    /// Budget collecting processing cuts.
    platform_budget_id: Option<i64>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Id of the budget collecting processing cuts, when configured.
    #[must_use]
    pub fn platform_budget_id(&self) -> Option<i64> {
        self.platform_budget_id
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    cache: Arc<dyn EntityCache>,
    platform_budget: Option<String>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            cache: Arc::new(NoCache),
            platform_budget: None,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Cache for budgets, projects and codes looked up by token.
    pub fn cache(mut self, cache: Arc<dyn EntityCache>) -> EngineBuilder {
        self.cache = cache;
        self
    }

    /// Token of the budget receiving processing cuts.
    pub fn platform_budget(mut self, token: impl Into<String>) -> EngineBuilder {
        self.platform_budget = Some(token.into());
        self
    }

    /// Construct `Engine`
    ///
    /// Fails with [`EngineError::UnknownBudget`] when a platform budget token
    /// is configured but does not exist.
    pub async fn build(self) -> ResultEngine<Engine> {
        let platform_budget_id = match self.platform_budget {
            Some(token) => {
                let model = crate::budgets::Entity::find()
                    .filter(crate::budgets::Column::Token.eq(token.as_str()))
                    .one(&self.database)
                    .await?
                    .ok_or_else(|| {
                        EngineError::UnknownBudget(format!("platform budget {token} not exists"))
                    })?;
                Some(model.id)
            }
            None => None,
        };

        Ok(Engine {
            database: self.database,
            cache: self.cache,
            platform_budget_id,
        })
    }
}
