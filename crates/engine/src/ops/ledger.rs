use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, Transaction, TransferCmd, transactions,
    util::{
        next_month_start, normalize_optional_text, previous_month_start, require_id,
        start_of_month,
    },
};

use super::{Engine, with_tx};

/// Sum of leg amounts, failing instead of wrapping when it leaves `i64`.
pub(crate) fn checked_total(amounts: impl IntoIterator<Item = i64>) -> ResultEngine<i64> {
    amounts
        .into_iter()
        .try_fold(0_i64, i64::checked_add)
        .ok_or_else(|| EngineError::InvalidAmount("balance out of range".to_string()))
}

/// Balances at the end of each month, newest first.
///
/// `legs` are `(created_at, amount)` pairs sorted newest first. The first
/// entry is the balance at the end of the month starting at `current_month`;
/// legs dated after that month are ignored. Earlier month ends follow until
/// the balance drops to zero, which is not included.
pub(crate) fn month_end_series(
    legs: &[(DateTime<Utc>, i64)],
    current_month: DateTime<Utc>,
) -> ResultEngine<Vec<i64>> {
    let horizon = next_month_start(current_month);
    let mut remaining = legs.iter().filter(|(at, _)| *at < horizon).peekable();
    let mut balance = checked_total(
        legs.iter()
            .filter(|(at, _)| *at < horizon)
            .map(|(_, amount)| *amount),
    )?;

    let mut series = vec![balance];
    let mut boundary = current_month;
    loop {
        while let Some((_, amount)) = remaining.next_if(|(at, _)| *at >= boundary) {
            balance = balance.checked_sub(*amount).ok_or_else(|| {
                EngineError::InvalidAmount("balance out of range".to_string())
            })?;
        }
        if balance == 0 || remaining.peek().is_none() {
            break;
        }
        series.push(balance);
        boundary = previous_month_start(boundary);
    }
    Ok(series)
}

impl Engine {
    /// Move `amount` minor units from one budget to another.
    ///
    /// A negative amount moves funds the other way. Writes a debit and a
    /// credit leg and returns them as `(credit, debit)`. The debited budget
    /// must hold at least the moved amount.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<(Transaction, Transaction)> {
        require_id(cmd.from_budget_id, "budget")?;
        require_id(cmd.to_budget_id, "budget")?;
        if cmd.amount == 0 {
            return Err(EngineError::InvalidAmount(
                "transfer amount must not be zero".to_string(),
            ));
        }
        if cmd.from_budget_id == cmd.to_budget_id {
            return Err(EngineError::InvalidAmount(
                "cannot transfer to the same budget".to_string(),
            ));
        }
        let (debited, amount) = if cmd.amount > 0 {
            (cmd.from_budget_id, cmd.amount)
        } else {
            let amount = cmd.amount.checked_neg().ok_or_else(|| {
                EngineError::InvalidAmount("transfer amount out of range".to_string())
            })?;
            (cmd.to_budget_id, amount)
        };
        let purpose = normalize_optional_text(cmd.purpose.as_deref());

        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, cmd.from_budget_id).await?;
            self.require_budget(&db_tx, cmd.to_budget_id).await?;

            let available = self.sum_legs(&db_tx, &[debited]).await?;
            if available < amount {
                return Err(EngineError::InsufficientFunds(format!(
                    "budget {debited} holds {available}, needs {amount}"
                )));
            }

            self.write_transfer(
                &db_tx,
                cmd.from_budget_id,
                cmd.to_budget_id,
                cmd.amount,
                cmd.occurred_at,
                purpose,
                None,
            )
            .await?
            .ok_or_else(|| EngineError::InvalidAmount("nothing to transfer".to_string()))
        })
    }

    /// Current balance of a budget: the sum of all its legs.
    pub async fn balance(&self, budget_id: i64) -> ResultEngine<i64> {
        require_id(budget_id, "budget")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            self.sum_legs(&db_tx, &[budget_id]).await
        })
    }

    /// Month-end balances of a budget, newest first, relative to `now`.
    pub async fn balance_history(
        &self,
        budget_id: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<i64>> {
        require_id(budget_id, "budget")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            self.history_in(&db_tx, &[budget_id], now).await
        })
    }

    /// Legs of a budget, newest first.
    pub async fn transactions_for_budget(&self, budget_id: i64) -> ResultEngine<Vec<Transaction>> {
        require_id(budget_id, "budget")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, budget_id).await?;
            let models = transactions::Entity::find()
                .filter(transactions::Column::BudgetId.eq(budget_id))
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?;
            let mut legs: Vec<Transaction> = models.into_iter().map(Transaction::from).collect();
            legs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(legs)
        })
    }

    pub(super) async fn sum_legs(
        &self,
        db_tx: &DatabaseTransaction,
        budget_ids: &[i64],
    ) -> ResultEngine<i64> {
        let amounts: Vec<i64> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Amount)
            .filter(transactions::Column::BudgetId.is_in(budget_ids.iter().copied()))
            .into_tuple()
            .all(db_tx)
            .await?;
        checked_total(amounts)
    }

    pub(super) async fn history_in(
        &self,
        db_tx: &DatabaseTransaction,
        budget_ids: &[i64],
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<i64>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::BudgetId.is_in(budget_ids.iter().copied()))
            .all(db_tx)
            .await?;
        let mut legs: Vec<(DateTime<Utc>, i64)> = models
            .into_iter()
            .map(|model| (model.created_at, model.amount))
            .collect();
        legs.sort_by(|a, b| b.0.cmp(&a.0));
        month_end_series(&legs, start_of_month(now))
    }

    /// Write both legs of a transfer. A zero amount or a transfer onto the
    /// same budget writes nothing.
    #[allow(clippy::too_many_arguments)]
    pub(super) async fn write_transfer(
        &self,
        db_tx: &DatabaseTransaction,
        from: i64,
        to: i64,
        amount: i64,
        created_at: DateTime<Utc>,
        purpose: Option<String>,
        payment_id: Option<i64>,
    ) -> ResultEngine<Option<(Transaction, Transaction)>> {
        if amount == 0 || from == to {
            return Ok(None);
        }
        let (from, to, amount) = if amount > 0 {
            (from, to, amount)
        } else {
            let amount = amount.checked_neg().ok_or_else(|| {
                EngineError::InvalidAmount("transfer amount out of range".to_string())
            })?;
            (to, from, amount)
        };

        let debit = Transaction::debit(from, to, amount, created_at, purpose.clone(), payment_id);
        let credit = Transaction::credit(from, to, amount, created_at, purpose, payment_id);
        let debit = transactions::ActiveModel::from(&debit).insert(db_tx).await?;
        let credit = transactions::ActiveModel::from(&credit).insert(db_tx).await?;
        tracing::debug!(from, to, amount, payment_id, "transfer recorded");

        Ok(Some((Transaction::from(credit), Transaction::from(debit))))
    }

    pub(super) async fn write_arrival(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: i64,
        amount: i64,
        created_at: DateTime<Utc>,
        purpose: Option<String>,
        payment_id: i64,
    ) -> ResultEngine<Transaction> {
        let leg = Transaction::arrival(budget_id, amount, created_at, purpose, payment_id);
        let model = transactions::ActiveModel::from(&leg).insert(db_tx).await?;
        Ok(Transaction::from(model))
    }
}
