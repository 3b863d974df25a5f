use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::LikeExpr,
};

use crate::{Budget, EngineError, Payment, Project, ResultEngine, budgets, payments, projects};

use super::{Engine, with_tx};

/// Rows returned per entity kind.
const SEARCH_LIMIT: u64 = 50;

/// Projects, budgets and payments matching a search term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub term: String,
    pub projects: Vec<Project>,
    pub budgets: Vec<Budget>,
    /// Newest first.
    pub payments: Vec<Payment>,
}

/// `LIKE` pattern matching `term` anywhere, with wildcards in `term` taken
/// literally.
fn contains(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

impl Engine {
    /// Search projects (name, slug, summary), budgets (name, description)
    /// and payments (purpose, code, remote name and account).
    ///
    /// Matching is a case-insensitive substring match. Private projects,
    /// private budgets and budgets of private projects are never returned.
    pub async fn search(&self, term: &str) -> ResultEngine<SearchResults> {
        let term = term.trim();
        if term.is_empty() {
            return Err(EngineError::InvalidName(
                "search term must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let projects = projects::Entity::find()
                .filter(projects::Column::Private.eq(false))
                .filter(
                    Condition::any()
                        .add(projects::Column::Name.like(contains(term)))
                        .add(projects::Column::Slug.like(contains(term)))
                        .add(projects::Column::Summary.like(contains(term))),
                )
                .order_by_asc(projects::Column::Id)
                .limit(SEARCH_LIMIT)
                .all(&db_tx)
                .await?;

            let hidden: Vec<i64> = projects::Entity::find()
                .select_only()
                .column(projects::Column::Id)
                .filter(projects::Column::Private.eq(true))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let budgets = budgets::Entity::find()
                .filter(budgets::Column::Private.eq(false))
                .filter(
                    Condition::any()
                        .add(budgets::Column::ProjectId.is_null())
                        .add(budgets::Column::ProjectId.is_not_in(hidden)),
                )
                .filter(
                    Condition::any()
                        .add(budgets::Column::Name.like(contains(term)))
                        .add(budgets::Column::Description.like(contains(term))),
                )
                .order_by_asc(budgets::Column::Id)
                .limit(SEARCH_LIMIT)
                .all(&db_tx)
                .await?;

            let payments = payments::Entity::find()
                .filter(
                    Condition::any()
                        .add(payments::Column::Purpose.like(contains(term)))
                        .add(payments::Column::Code.like(contains(term)))
                        .add(payments::Column::RemoteName.like(contains(term)))
                        .add(payments::Column::RemoteAccount.like(contains(term))),
                )
                .order_by_desc(payments::Column::CreatedAt)
                .order_by_desc(payments::Column::Id)
                .limit(SEARCH_LIMIT)
                .all(&db_tx)
                .await?;

            Ok::<_, EngineError>(SearchResults {
                term: term.to_string(),
                projects: projects.into_iter().map(Project::from).collect(),
                budgets: budgets.into_iter().map(Budget::from).collect(),
                payments: payments
                    .into_iter()
                    .map(Payment::try_from)
                    .collect::<ResultEngine<_>>()?,
            })
        })
    }
}
