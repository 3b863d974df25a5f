use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{ResultEngine, budgets, util::require_id};

use super::{Engine, with_tx};

/// How many past month ends the monthly change averages over.
const CHANGE_WINDOW: usize = 12;

/// Balance figures of a project across all of its budgets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statistics {
    pub project_id: i64,
    pub balance: i64,
    /// Month-end balances, newest first.
    pub month_end_balances: Vec<i64>,
    /// Average change per month over the last year (or less, for younger
    /// projects).
    pub monthly_change: i64,
}

pub(crate) fn monthly_change(balance: i64, month_end_balances: &[i64]) -> i64 {
    if month_end_balances.is_empty() {
        return 0;
    }
    let k = (month_end_balances.len() - 1).min(CHANGE_WINDOW - 1);
    let months = i128::try_from(k + 1).unwrap_or(i128::MAX);
    let change = (i128::from(balance) - i128::from(month_end_balances[k])) / months;
    i64::try_from(change).unwrap_or(if change > 0 { i64::MAX } else { i64::MIN })
}

impl Engine {
    /// Sum of the balances of every budget in the project.
    pub async fn project_balance(&self, project_id: i64) -> ResultEngine<i64> {
        require_id(project_id, "project")?;
        with_tx!(self, |db_tx| {
            self.require_project(&db_tx, project_id).await?;
            let budget_ids = self.project_budget_ids(&db_tx, project_id).await?;
            self.sum_legs(&db_tx, &budget_ids).await
        })
    }

    /// Balance, month-end history and average monthly change of a project,
    /// relative to `now`.
    pub async fn project_statistics(
        &self,
        project_id: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Statistics> {
        require_id(project_id, "project")?;
        with_tx!(self, |db_tx| {
            self.require_project(&db_tx, project_id).await?;
            let budget_ids = self.project_budget_ids(&db_tx, project_id).await?;
            let balance = self.sum_legs(&db_tx, &budget_ids).await?;
            let month_end_balances = self.history_in(&db_tx, &budget_ids, now).await?;
            Ok(Statistics {
                project_id,
                balance,
                monthly_change: monthly_change(balance, &month_end_balances),
                month_end_balances,
            })
        })
    }

    async fn project_budget_ids(
        &self,
        db_tx: &DatabaseTransaction,
        project_id: i64,
    ) -> ResultEngine<Vec<i64>> {
        let ids: Vec<i64> = budgets::Entity::find()
            .select_only()
            .column(budgets::Column::Id)
            .filter(budgets::Column::ProjectId.eq(project_id))
            .into_tuple()
            .all(db_tx)
            .await?;
        Ok(ids)
    }
}
