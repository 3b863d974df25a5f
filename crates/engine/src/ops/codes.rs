use sea_orm::{
    DatabaseTransaction, QueryFilter, QuerySelect, SqlErr, TransactionTrait, prelude::*,
};

use crate::{
    CacheKey, Code, EngineError, MAX_PERCENT, ResultEngine, canonicalize,
    codes::{self, encode_ids},
    tokens::{closest_token, generate_distinct_token, normalize_reference},
    util::require_id,
};

use super::{Engine, with_tx};

/// Concurrent creators of the same code race on the unique indexes; the loser
/// retries and then finds the winner's row.
const MAX_INSERT_ATTEMPTS: usize = 3;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Run `op` again while it fails on a unique index, at most
/// [`MAX_INSERT_ATTEMPTS`] times. `op` receives the attempt number.
async fn retry_on_unique_violation<T, F, Fut>(mut op: F) -> ResultEngine<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = ResultEngine<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Err(EngineError::Database(err))
                if attempt < MAX_INSERT_ATTEMPTS && is_unique_violation(&err) =>
            {
                tracing::warn!(attempt, error = %err, "code insert collided, retrying");
            }
            result => return result,
        }
    }
}

impl Engine {
    /// Return the code routing a payment to `budget_ids` by `ratios`,
    /// creating it on first use.
    ///
    /// The same budget/ratio pairing (in any order) and owner always yields
    /// the same code.
    pub async fn code_for(
        &self,
        budget_ids: &[i64],
        ratios: &[i64],
        user_id: Option<i64>,
    ) -> ResultEngine<Code> {
        let (budget_ids, ratios) = canonicalize(budget_ids, ratios)?;
        if let Some(user_id) = user_id {
            require_id(user_id, "user")?;
        }

        let (ids, ratios) = (budget_ids.as_slice(), ratios.as_slice());
        let code =
            retry_on_unique_violation(move |_| self.find_or_insert_code(ids, ratios, user_id))
                .await?;
        self.cache.invalidate(&CacheKey::Code(code.token.clone()));
        Ok(code)
    }

    /// Code sending everything to a single budget.
    pub async fn code_for_budget(&self, budget_id: i64, user_id: Option<i64>) -> ResultEngine<Code> {
        self.code_for(&[budget_id], &[MAX_PERCENT], user_id).await
    }

    /// Exact lookup by token, going through the cache.
    pub async fn code_by_token(&self, token: &str) -> ResultEngine<Code> {
        let token = normalize_reference(token.trim());
        if let Some(code) = self.cache.code(&token) {
            return Ok(code);
        }
        let code = with_tx!(self, |db_tx| self.find_code_by_token(&db_tx, &token).await)?
            .ok_or_else(|| EngineError::UnknownCode(token.clone()))?;
        self.cache.put_code(&code);
        Ok(code)
    }

    /// Find the code a free-text reference (e.g. a bank transfer purpose)
    /// most likely names. Typos up to two edits are tolerated.
    pub async fn resolve_reference(&self, reference: &str) -> ResultEngine<Option<Code>> {
        with_tx!(self, |db_tx| self.resolve_reference_in(&db_tx, reference).await)
    }

    pub(super) async fn find_code_by_token(
        &self,
        db_tx: &DatabaseTransaction,
        token: &str,
    ) -> ResultEngine<Option<Code>> {
        codes::Entity::find()
            .filter(codes::Column::Token.eq(token))
            .one(db_tx)
            .await?
            .map(Code::try_from)
            .transpose()
    }

    pub(super) async fn resolve_reference_in(
        &self,
        db_tx: &DatabaseTransaction,
        reference: &str,
    ) -> ResultEngine<Option<Code>> {
        let models = codes::Entity::find().all(db_tx).await?;
        let Some(token) = closest_token(reference, models.iter().map(|m| m.token.as_str())) else {
            tracing::debug!(reference, "no code matches reference");
            return Ok(None);
        };
        let token = token.to_string();
        models
            .into_iter()
            .find(|m| m.token == token)
            .map(Code::try_from)
            .transpose()
    }

    async fn find_or_insert_code(
        &self,
        budget_ids: &[i64],
        ratios: &[i64],
        user_id: Option<i64>,
    ) -> ResultEngine<Code> {
        with_tx!(self, |db_tx| {
            for budget_id in budget_ids {
                self.require_budget(&db_tx, *budget_id).await?;
            }
            if let Some(user_id) = user_id {
                self.require_user(&db_tx, user_id).await?;
            }

            let query = codes::Entity::find()
                .filter(codes::Column::BudgetIds.eq(encode_ids(budget_ids)))
                .filter(codes::Column::Ratios.eq(encode_ids(ratios)));
            let query = match user_id {
                Some(user_id) => query.filter(codes::Column::UserId.eq(user_id)),
                None => query.filter(codes::Column::UserId.is_null()),
            };

            match query.one(&db_tx).await? {
                Some(model) => Code::try_from(model),
                None => {
                    let existing: Vec<String> = codes::Entity::find()
                        .select_only()
                        .column(codes::Column::Token)
                        .into_tuple()
                        .all(&db_tx)
                        .await?;
                    let token = {
                        let mut rng = rand::rng();
                        generate_distinct_token(&existing, &mut rng)?
                    };

                    let code = Code {
                        id: 0,
                        token,
                        budget_ids: budget_ids.to_vec(),
                        ratios: ratios.to_vec(),
                        user_id,
                    };
                    let model = codes::ActiveModel::from(&code).insert(&db_tx).await?;
                    tracing::info!(
                        code_id = model.id,
                        token = %model.token,
                        budgets = %model.budget_ids,
                        ratios = %model.ratios,
                        "payment code created"
                    );
                    Code::try_from(model)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use migration::MigratorTrait;
    use sea_orm::{Database, PaginatorTrait};

    use super::*;
    use crate::NewBudgetCmd;

    async fn engine() -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    async fn count_codes(engine: &Engine) -> u64 {
        codes::Entity::find().count(&engine.database).await.unwrap()
    }

    #[tokio::test]
    async fn collided_insert_returns_the_winning_row() {
        let engine = engine().await;
        let budget = engine
            .new_budget(NewBudgetCmd::new("Servers"))
            .await
            .unwrap();
        let ids = [budget.id];
        let ratios = [MAX_PERCENT];

        let attempts = AtomicUsize::new(0);
        let (engine_ref, attempts_ref) = (&engine, &attempts);
        let code = retry_on_unique_violation(move |attempt| {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    // a concurrent caller commits the same split first, then
                    // this caller's insert lands on the unique index
                    let winner = engine_ref.find_or_insert_code(&ids, &ratios, None).await?;
                    let late = Code {
                        id: 0,
                        token: "KM3SAT9W".to_string(),
                        ..winner
                    };
                    codes::ActiveModel::from(&late)
                        .insert(&engine_ref.database)
                        .await?;
                }
                engine_ref.find_or_insert_code(&ids, &ratios, None).await
            }
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(code.budget_ids, vec![budget.id]);
        assert_eq!(count_codes(&engine).await, 1);
        assert_eq!(engine.code_for_budget(budget.id, None).await.unwrap(), code);
    }

    #[tokio::test]
    async fn collisions_stop_after_the_last_attempt() {
        let engine = engine().await;
        let budget = engine
            .new_budget(NewBudgetCmd::new("Servers"))
            .await
            .unwrap();
        let existing = engine.code_for_budget(budget.id, None).await.unwrap();

        let attempts = AtomicUsize::new(0);
        let (engine_ref, attempts_ref, existing_ref) = (&engine, &attempts, &existing);
        let result = retry_on_unique_violation(move |_| {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            async move {
                let clash = Code {
                    id: 0,
                    ..existing_ref.clone()
                };
                let model = codes::ActiveModel::from(&clash)
                    .insert(&engine_ref.database)
                    .await?;
                Code::try_from(model)
            }
        })
        .await;

        match result {
            Err(EngineError::Database(err)) => assert!(is_unique_violation(&err)),
            other => panic!("expected a unique violation, got {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_INSERT_ATTEMPTS);
        assert_eq!(count_codes(&engine).await, 1);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let attempts_ref = &attempts;
        let result: ResultEngine<Code> = retry_on_unique_violation(move |_| {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::UnknownBudget("budget 7 not exists".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(EngineError::UnknownBudget(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
