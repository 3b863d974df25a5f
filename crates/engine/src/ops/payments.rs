use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Code, EngineError, Payment, RecordPaymentCmd, ResultEngine, allocate, payments,
    split_processing_cut,
    tokens::normalize_reference,
    util::require_id,
};

use super::{Engine, with_tx};

/// One recipient's part of a processed payment.
#[derive(Debug)]
struct Routing {
    budget_id: i64,
    net: i64,
    cut: i64,
}

impl Engine {
    /// Record an incoming payment and route it when its code is known.
    ///
    /// An explicit code must exist (typos up to two edits are tolerated).
    /// Without one, the purpose line is searched for a code; when none is
    /// found the payment stays pending on its source budget until
    /// [`Engine::attach_code`] is called.
    pub async fn record_payment(&self, cmd: RecordPaymentCmd) -> ResultEngine<Payment> {
        require_id(cmd.budget_id, "budget")?;
        if cmd.amount == 0 {
            return Err(EngineError::InvalidAmount(
                "payment amount must not be zero".to_string(),
            ));
        }

        let payment = with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, cmd.budget_id).await?;

            let code = match cmd.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                Some(token) => Some(self.require_code_like(&db_tx, token).await?),
                None => self.resolve_reference_in(&db_tx, &cmd.purpose).await?,
            };

            let payment = Payment {
                id: 0,
                budget_id: cmd.budget_id,
                created_at: cmd.created_at,
                amount: cmd.amount,
                currency: cmd.currency,
                code: None,
                purpose: cmd.purpose.trim().to_string(),
                remote_account: cmd.remote_account,
                remote_name: cmd.remote_name,
                remote_transaction_id: cmd.remote_transaction_id,
                remote_bank_id: cmd.remote_bank_id,
                source: cmd.source,
                pending: true,
            };
            let model = payments::ActiveModel::from(&payment).insert(&db_tx).await?;
            let payment = Payment::try_from(model)?;
            tracing::info!(
                payment_id = payment.id,
                budget_id = payment.budget_id,
                amount = payment.amount,
                currency = %payment.currency,
                "payment recorded"
            );

            match code {
                Some(code) => self.process_payment(&db_tx, payment, &code).await,
                None => {
                    tracing::debug!(payment_id = payment.id, "payment left pending");
                    Ok(payment)
                }
            }
        })?;
        Ok(payment)
    }

    /// Attach a code to a pending payment and route it.
    ///
    /// Fails with [`EngineError::PaymentSettled`] when the payment has
    /// already been processed.
    pub async fn attach_code(&self, payment_id: i64, token: &str) -> ResultEngine<Payment> {
        require_id(payment_id, "payment")?;
        with_tx!(self, |db_tx| {
            let payment = self.require_payment(&db_tx, payment_id).await?;
            if !payment.pending {
                return Err(EngineError::PaymentSettled(format!(
                    "payment {payment_id} is already settled"
                )));
            }
            let token = normalize_reference(token.trim());
            let code = self
                .find_code_by_token(&db_tx, &token)
                .await?
                .ok_or_else(|| EngineError::UnknownCode(token.clone()))?;
            self.process_payment(&db_tx, payment, &code).await
        })
    }

    /// Return a payment by id.
    pub async fn payment(&self, id: i64) -> ResultEngine<Payment> {
        require_id(id, "payment")?;
        with_tx!(self, |db_tx| self.require_payment(&db_tx, id).await)
    }

    /// Payments still waiting for a code, oldest first.
    pub async fn pending_payments(&self) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            let models = payments::Entity::find()
                .filter(payments::Column::Pending.eq(true))
                .order_by_asc(payments::Column::CreatedAt)
                .order_by_asc(payments::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Payment::try_from).collect()
        })
    }

    async fn require_payment(&self, db_tx: &DatabaseTransaction, id: i64) -> ResultEngine<Payment> {
        let model = payments::Entity::find_by_id(id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::UnknownPayment(format!("payment {id} not exists")))?;
        Payment::try_from(model)
    }

    /// Exact token first, then the closest token within typo distance.
    async fn require_code_like(&self, db_tx: &DatabaseTransaction, token: &str) -> ResultEngine<Code> {
        let normalized = normalize_reference(token);
        if let Some(code) = self.find_code_by_token(db_tx, &normalized).await? {
            return Ok(code);
        }
        self.resolve_reference_in(db_tx, token)
            .await?
            .ok_or_else(|| EngineError::UnknownCode(normalized))
    }

    /// Route a pending payment through `code`.
    ///
    /// The amount first lands on the payment's source budget, then every
    /// recipient's share moves on from there, minus the recipient project's
    /// processing cut which goes to the platform budget. Negative payments
    /// (refunds) are split the same way but never charge a cut.
    ///
    /// Every lookup happens before the first leg is written.
    async fn process_payment(
        &self,
        db_tx: &DatabaseTransaction,
        payment: Payment,
        code: &Code,
    ) -> ResultEngine<Payment> {
        let shares = allocate(payment.amount, &code.ratios)?;

        let mut routings = Vec::with_capacity(shares.len());
        for ((budget_id, _), share) in code.splits().zip(shares) {
            let recipient = self.require_budget(db_tx, budget_id).await?;
            let cut_percent = match recipient.project_id {
                Some(project_id) => self.require_project(db_tx, project_id).await?.processing_cut,
                None => 0,
            };
            let (cut, net) = if share > 0 {
                split_processing_cut(share, cut_percent)?
            } else {
                (0, share)
            };
            routings.push(Routing {
                budget_id,
                net,
                cut,
            });
        }

        let platform_budget_id = if routings.iter().any(|r| r.cut != 0) {
            let id = self.platform_budget_id.ok_or_else(|| {
                EngineError::UnknownBudget("no platform budget configured".to_string())
            })?;
            self.require_budget(db_tx, id).await?;
            Some(id)
        } else {
            None
        };

        let purpose = Some(format!("payment {} ({})", payment.id, code.token));
        self.write_arrival(
            db_tx,
            payment.budget_id,
            payment.amount,
            payment.created_at,
            purpose.clone(),
            payment.id,
        )
        .await?;

        for routing in &routings {
            self.write_transfer(
                db_tx,
                payment.budget_id,
                routing.budget_id,
                routing.net,
                payment.created_at,
                purpose.clone(),
                Some(payment.id),
            )
            .await?;
            if let Some(platform_budget_id) = platform_budget_id {
                self.write_transfer(
                    db_tx,
                    payment.budget_id,
                    platform_budget_id,
                    routing.cut,
                    payment.created_at,
                    Some(format!("processing cut, payment {}", payment.id)),
                    Some(payment.id),
                )
                .await?;
            }
        }

        let model = payments::ActiveModel {
            id: ActiveValue::Unchanged(payment.id),
            code: ActiveValue::Set(Some(code.token.clone())),
            pending: ActiveValue::Set(false),
            ..Default::default()
        }
        .update(db_tx)
        .await?;

        tracing::info!(
            payment_id = payment.id,
            code = %code.token,
            recipients = routings.len(),
            "payment processed"
        );
        Payment::try_from(model)
    }
}
